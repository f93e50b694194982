//! Generation coordinator
//!
//! Fans one generation out over a fixed worker pool, one task per row band,
//! then applies the merged flips once every worker has returned.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::SimulationError;
use crate::grid::Grid;
use crate::partition::RowPartition;
use crate::worker;

pub struct GenerationCoordinator {
    pool: ThreadPool,
    partition: RowPartition,
}

impl GenerationCoordinator {
    /// Build a pool of exactly `workers` threads for a grid of `height` rows.
    pub fn new(height: usize, workers: usize) -> Result<Self, SimulationError> {
        let partition = RowPartition::new(height, workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("life-worker-{i}"))
            .build()?;

        Ok(Self { pool, partition })
    }

    pub fn partition(&self) -> &RowPartition {
        &self.partition
    }

    /// Advance the grid by one generation in place.
    ///
    /// Every worker reads the same pre-generation grid; nothing is written
    /// until all of them have finished. Returns the number of cells flipped.
    pub fn advance_one_generation(&self, grid: &mut Grid) -> usize {
        let ranges = self.partition.ranges();

        let flip_sets: Vec<_> = {
            let snapshot: &Grid = grid;
            self.pool.install(|| {
                ranges
                    .into_par_iter()
                    .map(|rows| worker::compute_flips(snapshot, rows))
                    .collect()
            })
        };

        let mut flipped = 0;
        for flips in flip_sets {
            flipped += flips.len();
            for cell in flips {
                grid.toggle(cell);
            }
        }
        flipped
    }

    /// Advance `generations` times back to back, with no signal handling.
    pub fn advance(&self, grid: &mut Grid, generations: u64) {
        for _ in 0..generations {
            self.advance_one_generation(grid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Cell, ALIVE};

    fn block() -> Vec<Cell> {
        vec![Cell::new(1, 1), Cell::new(2, 1), Cell::new(1, 2), Cell::new(2, 2)]
    }

    #[test]
    fn test_lone_cell_dies() {
        let coordinator = GenerationCoordinator::new(6, 3).unwrap();
        assert_eq!(coordinator.partition().bounds(), &[0, 2, 4, 6]);
        let mut grid = Grid::with_alive(6, 6, &[Cell::new(3, 3)]);
        let flipped = coordinator.advance_one_generation(&mut grid);
        assert_eq!(flipped, 1);
        assert_eq!(grid.alive_count(), 0);
    }

    #[test]
    fn test_block_is_still_life() {
        let coordinator = GenerationCoordinator::new(4, 2).unwrap();
        let start = Grid::with_alive(4, 4, &block());
        let mut grid = start.clone();
        for _ in 0..5 {
            assert_eq!(coordinator.advance_one_generation(&mut grid), 0);
            assert_eq!(grid, start);
        }
    }

    #[test]
    fn test_blinker_period_two() {
        let coordinator = GenerationCoordinator::new(5, 4).unwrap();
        let horizontal = Grid::with_alive(5, 5, &[Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)]);
        let vertical = Grid::with_alive(5, 5, &[Cell::new(2, 1), Cell::new(2, 2), Cell::new(2, 3)]);

        let mut grid = horizontal.clone();
        coordinator.advance_one_generation(&mut grid);
        assert_eq!(grid, vertical);
        coordinator.advance_one_generation(&mut grid);
        assert_eq!(grid, horizontal);
    }

    #[test]
    fn test_flipped_cells_are_canonical() {
        let coordinator = GenerationCoordinator::new(5, 1).unwrap();
        let mut grid = Grid::with_alive(5, 5, &[Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)]);
        coordinator.advance_one_generation(&mut grid);
        for cell in grid.alive_cells() {
            assert_eq!(grid.get(cell.x, cell.y), ALIVE);
        }
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let glider = [Cell::new(1, 0), Cell::new(2, 1), Cell::new(0, 2), Cell::new(1, 2), Cell::new(2, 2)];
        let mut reference = Grid::with_alive(7, 9, &glider);
        GenerationCoordinator::new(9, 1).unwrap().advance(&mut reference, 12);

        for workers in [2, 3, 4, 9, 16] {
            let mut grid = Grid::with_alive(7, 9, &glider);
            GenerationCoordinator::new(9, workers).unwrap().advance(&mut grid, 12);
            assert_eq!(grid, reference, "workers={workers}");
        }
    }
}
