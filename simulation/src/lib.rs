//! Life Simulation Engine
//!
//! Conway's Game of Life on a fixed-size toroidal grid. Each generation is
//! split into row bands computed in parallel; between generations the control
//! loop services snapshot, pause and quit signals and a periodic alive-cell
//! report.

pub mod control;
pub mod coordinator;
pub mod error;
pub mod grid;
pub mod io;
pub mod observer;
pub mod params;
pub mod partition;
pub mod runner;
pub mod worker;
pub mod world;

pub use control::{Controller, EndReason, RunState};
pub use error::{ConfigError, GridIoError, SimulationError};
pub use grid::{Cell, Grid};
pub use io::{GridIo, MemoryIo, PgmIo, Snapshot};
pub use observer::{LogObserver, NoOpObserver, RunEvent, RunObserver};
pub use params::{ReportPolicy, RunParams};
pub use runner::SimulationRunner;
pub use world::{run, RunOutcome, SimulationWorld};
