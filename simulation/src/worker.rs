//! Worker task
//!
//! Decides which cells in a row band change state this generation. Workers
//! only read the grid; the coordinator applies the result.

use std::ops::Range;

use crate::grid::{Cell, Grid};

/// Standard B3/S23 rule expressed as "does this cell flip".
///
/// Live cells with fewer than two or more than three neighbours die, dead
/// cells with exactly three are born.
pub fn should_flip(alive: bool, neighbors: u8) -> bool {
    if alive {
        !(2..=3).contains(&neighbors)
    } else {
        neighbors == 3
    }
}

/// Collect the cells in `rows` (all columns) whose state inverts next
/// generation, in row-major order.
pub fn compute_flips(grid: &Grid, rows: Range<usize>) -> Vec<Cell> {
    let mut flips = Vec::new();

    for y in rows {
        for x in 0..grid.width() {
            let neighbors = grid.neighbor_count(x, y);
            if should_flip(grid.is_alive(x, y), neighbors) {
                flips.push(Cell::new(x, y));
            }
        }
    }

    flips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_table() {
        for n in 0..=8 {
            assert_eq!(should_flip(true, n), n < 2 || n > 3, "alive with {n}");
            assert_eq!(should_flip(false, n), n == 3, "dead with {n}");
        }
    }

    #[test]
    fn test_lone_cell_marked_for_death() {
        let grid = Grid::with_alive(5, 5, &[Cell::new(2, 2)]);
        assert_eq!(compute_flips(&grid, 0..5), vec![Cell::new(2, 2)]);
    }

    #[test]
    fn test_only_assigned_rows_reported() {
        // Vertical blinker: births at (1,2) and (3,2), deaths at (2,1) and (2,3)
        let grid = Grid::with_alive(5, 5, &[Cell::new(2, 1), Cell::new(2, 2), Cell::new(2, 3)]);
        assert_eq!(compute_flips(&grid, 0..2), vec![Cell::new(2, 1)]);
        assert_eq!(compute_flips(&grid, 2..3), vec![Cell::new(1, 2), Cell::new(3, 2)]);
        assert_eq!(compute_flips(&grid, 3..5), vec![Cell::new(2, 3)]);
    }

    #[test]
    fn test_empty_range() {
        let grid = Grid::with_alive(4, 4, &[Cell::new(0, 0)]);
        assert!(compute_flips(&grid, 2..2).is_empty());
    }
}
