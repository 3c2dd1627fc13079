//! 2D occupancy grid for the world.

use crate::neighborhood::Window;
use crate::rng::RandomSource;
use bunny_core::{AgentId, Error, Position, Result, WorldConfig};

/// A bounded grid where each cell holds at most one agent id.
///
/// The grid never owns agents; the population registry does.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    cells: Vec<Option<AgentId>>,
    occupied: usize,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width.max(0) as usize).saturating_mul(height.max(0) as usize);
        Self {
            width,
            height,
            cells: vec![None; size],
            occupied: 0,
        }
    }

    /// Create an empty grid from world configuration
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.width, config.height)
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Occupant of a cell; `None` for empty or out-of-bounds cells
    pub fn at(&self, pos: Position) -> Option<AgentId> {
        if self.contains(pos) {
            self.cells[self.pos_to_index(pos)]
        } else {
            None
        }
    }

    pub fn is_empty_cell(&self, pos: Position) -> bool {
        self.contains(pos) && self.cells[self.pos_to_index(pos)].is_none()
    }

    /// Put an agent on an empty cell
    pub fn place(&mut self, id: AgentId, pos: Position) -> Result<()> {
        if !self.contains(pos) {
            return Err(Error::OutOfBounds(pos));
        }
        let index = self.pos_to_index(pos);
        if self.cells[index].is_some() {
            return Err(Error::OccupiedCell(pos));
        }
        self.cells[index] = Some(id);
        self.occupied += 1;
        Ok(())
    }

    /// Put an agent on a uniformly random empty cell by rejection sampling.
    ///
    /// Fails with `GridFull` up front rather than sampling forever.
    pub fn place_random_empty<R: RandomSource + ?Sized>(
        &mut self,
        id: AgentId,
        rng: &mut R,
    ) -> Result<Position> {
        if self.occupied >= self.capacity() {
            return Err(Error::GridFull {
                population: self.occupied + 1,
                capacity: self.capacity(),
            });
        }

        loop {
            let x = rng.uniform_int(self.width as usize) as i32;
            let y = rng.uniform_int(self.height as usize) as i32;
            let pos = Position::new(x, y);
            if self.is_empty_cell(pos) {
                self.place(id, pos)?;
                return Ok(pos);
            }
        }
    }

    /// Empty a cell, returning its former occupant
    pub fn remove(&mut self, pos: Position) -> Option<AgentId> {
        if !self.contains(pos) {
            return None;
        }
        let index = self.pos_to_index(pos);
        let previous = self.cells[index].take();
        if previous.is_some() {
            self.occupied -= 1;
        }
        previous
    }

    /// Empty every cell
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = None);
        self.occupied = 0;
    }

    pub fn window(&self, center: Position, radius: i32) -> Window {
        Window::around(center, radius, self.width, self.height)
    }

    /// Occupied (or, with `include_empty`, unoccupied) cells around `center`,
    /// center excluded, row-major. Callers pick among them uniformly.
    pub fn neighborhood(
        &self,
        center: Position,
        radius: i32,
        include_empty: bool,
    ) -> impl Iterator<Item = Position> + '_ {
        self.window(center, radius)
            .cells()
            .filter(move |pos| self.at(*pos).is_none() == include_empty)
    }

    /// Occupied cells with their occupants, row-major
    pub fn occupied(&self) -> impl Iterator<Item = (Position, AgentId)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, cell)| cell.map(|id| (self.index_to_pos(i), id)))
    }

    fn pos_to_index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    fn index_to_pos(&self, index: usize) -> Position {
        let x = (index as i32) % self.width;
        let y = (index as i32) / self.width;
        Position::new(x, y)
    }
}
