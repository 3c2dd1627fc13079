//! Simulation settings from presets and TOML files.

use anyhow::{Context, Result};
use bunny_core::SimulationConfig;
use std::fs;
use std::path::Path;
use toml::Value;

/// Starting point for the configuration
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Preset {
    /// Open breeding, infection spreads ring by ring
    Infection,
    /// House-bound breeding, combat and a dragon on patrol
    Combat,
}

impl Preset {
    pub fn config(self) -> SimulationConfig {
        match self {
            Preset::Infection => SimulationConfig::infection(),
            Preset::Combat => SimulationConfig::combat(),
        }
    }
}

/// Layer the TOML in `overrides` over the preset.
///
/// Sections such as `[world]` or `[pressure]` are merged key by key; any
/// other value, including enum-valued keys like `trigger` or `seed_plan`, is
/// replaced as a whole.
pub fn layer(preset: Preset, overrides: &str) -> Result<SimulationConfig> {
    let overrides: toml::Table = toml::from_str(overrides).context("Failed to parse settings")?;
    let mut merged = Value::try_from(preset.config()).context("Failed to encode preset")?;
    merge(&mut merged, Value::Table(overrides), 2);
    merged
        .try_into()
        .context("Settings do not describe a valid simulation")
}

pub fn load(path: Option<&Path>, preset: Preset) -> Result<SimulationConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            layer(preset, &text)
        }
        None => Ok(preset.config()),
    }
}

fn merge(base: &mut Value, overlay: Value, depth: usize) {
    match (base, overlay) {
        (Value::Table(base), Value::Table(overlay)) if depth > 0 => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value, depth - 1),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bunny_core::{ConflictModel, PressureTrigger, SeedPlan};

    #[test]
    fn test_empty_settings_keep_preset() {
        assert_eq!(layer(Preset::Combat, "").unwrap(), SimulationConfig::combat());
        assert_eq!(load(None, Preset::Infection).unwrap(), SimulationConfig::infection());
    }

    #[test]
    fn test_sections_merge_key_by_key() {
        let config = layer(
            Preset::Combat,
            r#"
            num_turns = 200

            [world]
            width = 40
            height = 40

            [lifecycle]
            death_age = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.num_turns, 200);
        assert_eq!(config.world.width, 40);
        assert_eq!(config.lifecycle.death_age, 12);
        // untouched keys come from the preset
        assert!(config.lifecycle.require_same_kind);
        assert_eq!(config.conflict, ConflictModel::Combat);
        assert!(config.apex.enabled);
    }

    #[test]
    fn test_enum_values_are_replaced() {
        let config = layer(
            Preset::Combat,
            r#"
            seed_plan = { random = { count = 12 } }

            [pressure]
            trigger = { absolute = 300 }
            "#,
        )
        .unwrap();

        assert_eq!(config.seed_plan, SeedPlan::Random { count: 12 });
        assert_eq!(config.pressure.trigger, PressureTrigger::Absolute(300));
        assert_eq!(config.pressure.target_fraction, 0.5);
    }

    #[test]
    fn test_malformed_settings_are_rejected() {
        assert!(layer(Preset::Infection, "world = 3").is_err());
        assert!(layer(Preset::Infection, "[world").is_err());
    }
}
