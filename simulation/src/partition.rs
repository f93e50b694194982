//! Row partitioning across workers

use std::ops::Range;

/// Split of `[0, height)` into one contiguous row band per worker.
///
/// Band sizes differ by at most one row; the first `height % workers` bands
/// take the extra rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPartition {
    /// `workers + 1` ascending boundaries, first is 0 and last is `height`
    bounds: Vec<usize>,
}

impl RowPartition {
    /// Panics if `workers` is zero; callers validate run parameters first.
    pub fn new(height: usize, workers: usize) -> Self {
        assert!(workers > 0, "row partition needs at least one worker");

        let base = height / workers;
        let remainder = height % workers;

        let mut bounds = Vec::with_capacity(workers + 1);
        bounds.push(0);
        for i in 0..workers {
            let size = if i < remainder { base + 1 } else { base };
            bounds.push(bounds[i] + size);
        }

        let partition = Self { bounds };
        partition.assert_covers(height);
        partition
    }

    fn assert_covers(&self, height: usize) {
        assert_eq!(self.bounds.first(), Some(&0), "partition must start at row 0");
        assert_eq!(self.bounds.last(), Some(&height), "partition must end at the last row");
        assert!(
            self.bounds.windows(2).all(|w| w[0] <= w[1]),
            "partition bounds must not overlap"
        );
        let sizes = self.bounds.windows(2).map(|w| w[1] - w[0]);
        let (min, max) = sizes.fold((usize::MAX, 0), |(lo, hi), n| (lo.min(n), hi.max(n)));
        assert!(max - min <= 1, "partition bands must differ by at most one row");
    }

    pub fn workers(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Raw boundaries, length `workers + 1`
    pub fn bounds(&self) -> &[usize] {
        &self.bounds
    }

    /// Half-open row range for each worker, in order
    pub fn ranges(&self) -> Vec<Range<usize>> {
        self.bounds.windows(2).map(|w| w[0]..w[1]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let partition = RowPartition::new(16, 4);
        assert_eq!(partition.bounds(), &[0, 4, 8, 12, 16]);
    }

    #[test]
    fn test_remainder_goes_to_first_workers() {
        let partition = RowPartition::new(10, 4);
        assert_eq!(partition.bounds(), &[0, 3, 6, 8, 10]);
    }

    #[test]
    fn test_more_workers_than_rows() {
        let partition = RowPartition::new(2, 5);
        assert_eq!(partition.workers(), 5);
        assert_eq!(partition.ranges(), vec![0..1, 1..2, 2..2, 2..2, 2..2]);
    }

    #[test]
    fn test_covers_every_row_once_and_balanced() {
        for height in 1..=64 {
            for workers in 1..=16 {
                let partition = RowPartition::new(height, workers);
                let ranges = partition.ranges();
                assert_eq!(ranges.len(), workers);

                let mut seen = vec![0u32; height];
                for range in &ranges {
                    for y in range.clone() {
                        seen[y] += 1;
                    }
                }
                assert!(seen.iter().all(|&n| n == 1), "h={height} w={workers}");

                let sizes: Vec<usize> = ranges.iter().map(|r| r.len()).collect();
                let max = *sizes.iter().max().unwrap();
                let min = *sizes.iter().min().unwrap();
                assert!(max - min <= 1, "h={height} w={workers} sizes={sizes:?}");
            }
        }
    }

    #[test]
    #[should_panic(expected = "at most one row")]
    fn test_unbalanced_bounds_rejected() {
        let partition = RowPartition { bounds: vec![0, 1, 4] };
        partition.assert_covers(4);
    }

    #[test]
    #[should_panic(expected = "at least one worker")]
    fn test_zero_workers_panics() {
        RowPartition::new(8, 0);
    }
}
