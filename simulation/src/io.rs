//! Grid load/save collaborators
//!
//! The engine only talks to storage through [`GridIo`]. Two implementations
//! ship with the crate: PGM image files written by a background thread, and
//! an in-memory store for tests and embedding.

pub mod memory;
pub mod pgm;

pub use memory::MemoryIo;
pub use pgm::PgmIo;

use crate::error::GridIoError;
use crate::grid::Grid;

/// A copy of the grid tagged with the number of completed turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    pub turns: u64,
    pub cells: Vec<u8>,
}

impl Snapshot {
    pub fn of(grid: &Grid, turns: u64) -> Self {
        Self {
            width: grid.width(),
            height: grid.height(),
            turns,
            cells: grid.as_bytes().to_vec(),
        }
    }

    /// Rebuild the grid this snapshot was taken from
    pub fn to_grid(&self) -> Option<Grid> {
        Grid::from_bytes(self.width, self.height, &self.cells)
    }
}

/// Storage seam used by the engine's lifecycle.
pub trait GridIo: Send {
    /// Fetch `width * height` cell bytes in row-major order. Blocks until the
    /// whole grid is available.
    fn load_grid(&mut self, width: usize, height: usize) -> Result<Vec<u8>, GridIoError>;

    /// Hand a snapshot over for saving. May return before it is written.
    fn save_grid(&mut self, snapshot: Snapshot) -> Result<(), GridIoError>;

    /// Block until every earlier save has finished. Reports the first save
    /// failure seen since the previous call.
    fn wait_idle(&mut self) -> Result<(), GridIoError>;
}
