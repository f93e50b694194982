//! Error types
//!
//! [`SimulationError`] is what the engine and runner return; the other enums
//! cover configuration and the grid I/O collaborator.

use std::path::PathBuf;

/// Invalid or unparsable run parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("grid {width}x{height} has more cells than fit in memory")]
    GridTooLarge { width: usize, height: usize },

    #[error("invalid {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Failures of the load/save collaborator. All of them end the run.
#[derive(Debug, thiserror::Error)]
pub enum GridIoError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed image {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("expected {expected} cells from loader, got {actual}")]
    WrongSize { expected: usize, actual: usize },

    #[error("image writer is no longer running")]
    Disconnected,
}

/// Top-level error for a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("config error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("grid I/O error: {source}")]
    GridIo {
        #[from]
        source: GridIoError,
    },

    #[error("failed to build worker pool: {source}")]
    WorkerPool {
        #[from]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("grid is {width}x{height}, run expects {expected_width}x{expected_height}")]
    GridMismatch {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("failed to spawn run thread: {source}")]
    Spawn { source: std::io::Error },

    #[error("simulation thread panicked")]
    Panicked,
}
