//! In-memory collaborator
//!
//! Serves a fixed initial grid and records every save. Clones share the same
//! record, so a caller can keep one handle and give another to the engine.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{GridIo, Snapshot};
use crate::error::GridIoError;
use crate::grid::Grid;

#[derive(Debug, Default)]
struct Record {
    saves: Vec<Snapshot>,
    idle_checks: usize,
    pending_failure: bool,
}

#[derive(Debug, Clone)]
pub struct MemoryIo {
    initial: Vec<u8>,
    fail_saves: bool,
    record: Arc<Mutex<Record>>,
}

impl MemoryIo {
    /// Serve `grid` to the loader.
    pub fn new(grid: &Grid) -> Self {
        Self::from_bytes(grid.as_bytes().to_vec())
    }

    /// Serve raw bytes to the loader, whatever their length.
    pub fn from_bytes(initial: Vec<u8>) -> Self {
        Self {
            initial,
            fail_saves: false,
            record: Arc::default(),
        }
    }

    /// Accept saves but report a failure at the next idle check.
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Every snapshot handed over so far, oldest first
    pub fn saves(&self) -> Vec<Snapshot> {
        self.lock().saves.clone()
    }

    pub fn idle_checks(&self) -> usize {
        self.lock().idle_checks
    }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GridIo for MemoryIo {
    fn load_grid(&mut self, width: usize, height: usize) -> Result<Vec<u8>, GridIoError> {
        let expected = width * height;
        if self.initial.len() != expected {
            return Err(GridIoError::WrongSize {
                expected,
                actual: self.initial.len(),
            });
        }
        Ok(self.initial.clone())
    }

    fn save_grid(&mut self, snapshot: Snapshot) -> Result<(), GridIoError> {
        let mut record = self.lock();
        if self.fail_saves {
            record.pending_failure = true;
        }
        record.saves.push(snapshot);
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<(), GridIoError> {
        let mut record = self.lock();
        record.idle_checks += 1;
        if std::mem::take(&mut record.pending_failure) {
            return Err(GridIoError::Io {
                path: PathBuf::from("memory"),
                source: ErrorKind::Other.into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;

    #[test]
    fn test_clones_share_saves() {
        let grid = Grid::with_alive(2, 2, &[Cell::new(1, 1)]);
        let observer = MemoryIo::new(&grid);
        let mut io = observer.clone();

        assert_eq!(io.load_grid(2, 2).unwrap(), grid.as_bytes());
        io.save_grid(Snapshot::of(&grid, 3)).unwrap();
        io.wait_idle().unwrap();

        let saves = observer.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].turns, 3);
        assert_eq!(saves[0].to_grid().unwrap(), grid);
        assert_eq!(observer.idle_checks(), 1);
    }

    #[test]
    fn test_wrong_dimensions() {
        let mut io = MemoryIo::from_bytes(vec![0; 6]);
        assert!(matches!(
            io.load_grid(4, 4),
            Err(GridIoError::WrongSize { expected: 16, actual: 6 })
        ));
    }

    #[test]
    fn test_failure_reported_once_at_idle_check() {
        let mut io = MemoryIo::new(&Grid::new(1, 1)).failing_saves();
        io.save_grid(Snapshot::of(&Grid::new(1, 1), 0)).unwrap();
        assert!(io.wait_idle().is_err());
        assert!(io.wait_idle().is_ok());
    }
}
