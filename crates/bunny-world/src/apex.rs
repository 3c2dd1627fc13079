//! The apex predator's patrol route.
//!
//! The apex walks a figure-eight inside a square box inset by `margin` cells:
//! down the main diagonal, back along the bottom edge, up the anti-diagonal,
//! back along the top edge. It turns only at the four corners of the box.

use crate::rng::RandomSource;
use bunny_core::{AgentId, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heading {
    /// `(+1, +1)` from the top-left corner
    Descending,
    /// `(-1, 0)` from the bottom-right corner
    ReturnAlongBottom,
    /// `(+1, -1)` from the bottom-left corner
    Ascending,
    /// `(-1, 0)` from the top-right corner
    ReturnAlongTop,
}

impl Heading {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Descending => (1, 1),
            Heading::ReturnAlongBottom => (-1, 0),
            Heading::Ascending => (1, -1),
            Heading::ReturnAlongTop => (-1, 0),
        }
    }
}

/// Position and heading of the apex, owned by the turn engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApexTrack {
    pub agent_id: AgentId,
    pub position: Position,
    pub heading: Heading,
}

impl ApexTrack {
    /// Start somewhere on the main diagonal of the box, heading down it
    pub fn start<R: RandomSource + ?Sized>(
        agent_id: AgentId,
        size: i32,
        margin: i32,
        rng: &mut R,
    ) -> Self {
        let span = (size - 2 * margin).max(1) as usize;
        let k = margin + rng.uniform_int(span) as i32;
        Self {
            agent_id,
            position: Position::new(k, k),
            heading: Heading::Descending,
        }
    }

    /// Turn if standing on a corner, then take one step
    pub fn advance(&mut self, size: i32, margin: i32) {
        let (lo, hi) = bounds(size, margin);
        let Position { x, y } = self.position;

        if x == lo && y == lo {
            self.heading = Heading::Descending;
        } else if x == hi && y == hi {
            self.heading = Heading::ReturnAlongBottom;
        } else if x == lo && y == hi {
            self.heading = Heading::Ascending;
        } else if x == hi && y == lo {
            self.heading = Heading::ReturnAlongTop;
        }

        let (dx, dy) = self.heading.delta();
        self.position = self.position.add(dx, dy);
    }

    /// Whether `advance` keeps this state on the route forever
    pub fn is_on_track(&self, size: i32, margin: i32) -> bool {
        let (lo, hi) = bounds(size, margin);
        let Position { x, y } = self.position;

        let in_box = (lo..=hi).contains(&x) && (lo..=hi).contains(&y);
        if !in_box || lo >= hi {
            return false;
        }
        let at_corner = (x == lo || x == hi) && (y == lo || y == hi);
        at_corner
            || match self.heading {
                Heading::Descending => x == y,
                Heading::ReturnAlongBottom => y == hi,
                Heading::Ascending => x + y == lo + hi,
                Heading::ReturnAlongTop => y == lo,
            }
    }
}

fn bounds(size: i32, margin: i32) -> (i32, i32) {
    (margin, size - 1 - margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn track(x: i32, y: i32, heading: Heading) -> ApexTrack {
        ApexTrack {
            agent_id: AgentId::new(),
            position: Position::new(x, y),
            heading,
        }
    }

    #[test]
    fn test_start_is_on_diagonal() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..50 {
            let t = ApexTrack::start(AgentId::new(), 20, 2, &mut rng);
            assert_eq!(t.position.x, t.position.y);
            assert!((2..=17).contains(&t.position.x));
            assert!(t.is_on_track(20, 2));
        }
    }

    #[test]
    fn test_figure_eight_cycle() {
        let (size, margin) = (10, 2);
        // lo = 2, hi = 7; one lap is 4 * (hi - lo) steps
        let mut t = track(2, 2, Heading::Descending);
        let start = t;
        let mut visited = Vec::new();
        for _ in 0..20 {
            t.advance(size, margin);
            visited.push(t.position);
            assert!(t.is_on_track(size, margin), "left the route at {:?}", t);
        }
        assert_eq!(t.position, start.position);
        assert_eq!(visited[4], Position::new(7, 7));
        assert_eq!(visited[9], Position::new(2, 7));
        assert_eq!(visited[14], Position::new(7, 2));
        assert_eq!(visited[19], Position::new(2, 2));
    }

    #[test]
    fn test_corner_turns() {
        let mut t = track(7, 7, Heading::Descending);
        t.advance(10, 2);
        assert_eq!(t.heading, Heading::ReturnAlongBottom);
        assert_eq!(t.position, Position::new(6, 7));

        let mut t = track(2, 7, Heading::ReturnAlongBottom);
        t.advance(10, 2);
        assert_eq!(t.heading, Heading::Ascending);
        assert_eq!(t.position, Position::new(3, 6));
    }

    #[test]
    fn test_off_track_states_rejected() {
        assert!(!track(3, 5, Heading::Descending).is_on_track(10, 2));
        assert!(!track(0, 0, Heading::Descending).is_on_track(10, 2));
        assert!(track(4, 7, Heading::ReturnAlongBottom).is_on_track(10, 2));
        assert!(track(4, 5, Heading::Ascending).is_on_track(10, 2));
        assert!(track(7, 2, Heading::Descending).is_on_track(10, 2));
    }
}
