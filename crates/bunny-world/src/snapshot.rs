//! Flat save and restore of a world.

use crate::agent::Agent;
use crate::apex::ApexTrack;
use bunny_core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Current snapshot layout
pub const SNAPSHOT_VERSION: u32 = 1;

/// Image of a world between turns. Each agent carries the cell it occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub turn: u64,
    pub agents: Vec<Agent>,
    pub apex: Option<ApexTrack>,
}

impl Snapshot {
    pub fn new(turn: u64, agents: Vec<Agent>, apex: Option<ApexTrack>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            turn,
            agents,
            apex,
        }
    }

    pub fn check_version(&self) -> Result<()> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(Error::InvalidSnapshot(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )))
        }
    }

    /// Serialize the snapshot to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a snapshot from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write to `path`; a `.json` extension selects JSON, anything else bincode
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = if is_json(path) {
            self.to_json()?.into_bytes()
        } else {
            self.to_bytes()?
        };
        fs::write(path, &bytes)?;

        info!(
            event = "snapshot_saved",
            path = %path.display(),
            turn = self.turn,
            agents = self.agents.len(),
            bytes = bytes.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Read a snapshot written by [`Snapshot::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        let snapshot = if is_json(path) {
            let json = String::from_utf8(bytes)
                .map_err(|e| Error::Serialization(format!("snapshot is not UTF-8: {e}")))?;
            Self::from_json(&json)?
        } else {
            Self::from_bytes(&bytes)?
        };
        snapshot.check_version()?;

        info!(
            event = "snapshot_loaded",
            path = %path.display(),
            turn = snapshot.turn,
            agents = snapshot.agents.len(),
            saved_at = %snapshot.saved_at,
            "Snapshot loaded"
        );
        Ok(snapshot)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bunny_core::{AgentId, Color, Kind, Sex};

    fn sample() -> Snapshot {
        let agent = Agent::new(
            AgentId::new(),
            "ABCDEFGHIJ".to_string(),
            Sex::Female,
            Color::Silver,
            Kind::Lannister,
        );
        Snapshot::new(12, vec![agent], None)
    }

    #[test]
    fn test_bytes_and_json_agree() {
        let snapshot = sample();
        let from_bytes = Snapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
        let from_json = Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(from_bytes, snapshot);
        assert_eq!(from_json, snapshot);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut snapshot = sample();
        snapshot.version = 99;
        assert!(matches!(
            snapshot.check_version(),
            Err(Error::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_garbage_bytes_are_a_serialization_error() {
        assert!(matches!(
            Snapshot::from_bytes(&[0xff, 0x01]),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_save_and_load_files() {
        let dir = std::env::temp_dir().join(format!("bunny-snapshot-{}", AgentId::new()));
        fs::create_dir_all(&dir).unwrap();
        let snapshot = sample();

        for name in ["world.json", "world.bin"] {
            let path = dir.join(name);
            snapshot.save(&path).unwrap();
            assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
        }

        fs::remove_dir_all(&dir).unwrap();
    }
}
