//! Clamped square windows around a grid cell.

use bunny_core::Position;

/// Half-open rectangle `[x0, x1) × [y0, y1)` around a center cell, clipped to the grid.
///
/// Edge cells get the edge-adjusted window rather than a truncated one: with
/// radius 1 the window for `x = 0` spans columns `[0, 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub center: Position,
    pub x0: i32,
    pub x1: i32,
    pub y0: i32,
    pub y1: i32,
}

impl Window {
    pub fn around(center: Position, radius: i32, width: i32, height: i32) -> Self {
        Self {
            center,
            x0: center.x.saturating_sub(radius).max(0),
            x1: center.x.saturating_add(radius).saturating_add(1).min(width),
            y0: center.y.saturating_sub(radius).max(0),
            y1: center.y.saturating_add(radius).saturating_add(1).min(height),
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        (self.x0..self.x1).contains(&pos.x) && (self.y0..self.y1).contains(&pos.y)
    }

    /// Cells of the window in row-major order, center excluded
    pub fn cells(&self) -> impl Iterator<Item = Position> {
        let Window {
            center,
            x0,
            x1,
            y0,
            y1,
        } = *self;
        (y0..y1)
            .flat_map(move |y| (x0..x1).map(move |x| Position::new(x, y)))
            .filter(move |pos| *pos != center)
    }
}
