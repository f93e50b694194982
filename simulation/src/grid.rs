//! Toroidal cell grid
//!
//! Row-major byte buffer where any non-zero byte is a live cell.

use serde::{Deserialize, Serialize};

/// Canonical byte for a live cell
pub const ALIVE: u8 = 0xFF;
/// Canonical byte for a dead cell
pub const DEAD: u8 = 0x00;

// ============================================================================
// Cell
// ============================================================================

/// Grid coordinate, `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

// ============================================================================
// Grid
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// Create an all-dead grid
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![DEAD; width * height],
        }
    }

    /// Build a grid from a row-major byte stream.
    ///
    /// Zero bytes stay dead, non-zero bytes are stored as given. Returns
    /// `None` when the stream length doesn't match the dimensions.
    pub fn from_bytes(width: usize, height: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width * height {
            return None;
        }
        let mut grid = Self::new(width, height);
        for (i, &value) in bytes.iter().enumerate() {
            if value != DEAD {
                grid.cells[i] = value;
            }
        }
        Some(grid)
    }

    /// Build a grid with the given cells alive
    pub fn with_alive(width: usize, height: usize, alive: &[Cell]) -> Self {
        let mut grid = Self::new(width, height);
        for cell in alive {
            grid.set(cell.x, cell.y, ALIVE);
        }
        grid
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    /// Raw row-major bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.cells[y * self.width + x] = value;
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.get(x, y) != DEAD
    }

    /// Invert a cell's state, writing the canonical byte for the new state.
    pub fn toggle(&mut self, cell: Cell) {
        let next = if self.is_alive(cell.x, cell.y) { DEAD } else { ALIVE };
        self.set(cell.x, cell.y, next);
    }

    /// Count live cells among the 8 wrapped neighbours of `(x, y)`.
    ///
    /// The centre offset is skipped explicitly: on grids narrower than three
    /// cells the wrapped arithmetic can land back on the centre itself.
    pub fn neighbor_count(&self, x: usize, y: usize) -> u8 {
        let mut count = 0;
        for dy in 0..3 {
            for dx in 0..3 {
                if dx == 1 && dy == 1 {
                    continue;
                }
                // Offsets are shifted by +1 so the arithmetic stays unsigned
                let nx = (x + self.width + dx - 1) % self.width;
                let ny = (y + self.height + dy - 1) % self.height;
                if self.is_alive(nx, ny) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Live cells in row-major order
    pub fn alive_cells(&self) -> Vec<Cell> {
        let mut alive = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.is_alive(x, y) {
                    alive.push(Cell::new(x, y));
                }
            }
        }
        alive
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&value| value != DEAD).count()
    }
}
