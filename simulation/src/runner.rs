//! Simulation Runner - background thread that drives a whole run
//!
//! The caller keeps a [`Controller`] to steer the run while it is in
//! progress, then joins for the [`RunOutcome`].

use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::control::{self, Controller};
use crate::error::SimulationError;
use crate::io::GridIo;
use crate::observer::RunObserver;
use crate::params::RunParams;
use crate::world::{self, RunOutcome};

type RunHandle = JoinHandle<Result<RunOutcome, SimulationError>>;

/// Runner that owns the thread executing one simulation run
pub struct SimulationRunner {
    controller: Controller,
    thread_handle: Option<RunHandle>,
}

impl SimulationRunner {
    /// Start a run in the background
    ///
    /// # Arguments
    /// * `params` - Grid size, worker count, target turns and report policy
    /// * `io` - Collaborator that loads the initial grid and stores snapshots
    /// * `observer` - Receives alive counts, state changes and turn events
    pub fn start<I, O>(params: RunParams, mut io: I, mut observer: O) -> Result<Self, SimulationError>
    where
        I: GridIo + 'static,
        O: RunObserver + Send + 'static,
    {
        params.validate()?;

        let (controller, signals) = control::channel();
        info!(
            width = params.width,
            height = params.height,
            workers = params.workers,
            turns = params.turns,
            "Starting simulation runner"
        );

        let handle = thread::Builder::new()
            .name("life-control".to_string())
            .spawn(move || world::run(&params, &mut io, &signals, &mut observer))
            .map_err(|source| SimulationError::Spawn { source })?;

        Ok(Self {
            controller,
            thread_handle: Some(handle),
        })
    }

    /// Handle for sending report / pause / resume / quit signals
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Check if the run thread is still going
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the run to end on its own
    pub fn join(mut self) -> Result<RunOutcome, SimulationError> {
        let handle = self.thread_handle.take().ok_or(SimulationError::Panicked)?;
        handle.join().map_err(|_| SimulationError::Panicked)?
    }

    /// Ask the run to quit at its next iteration and wait for it
    pub fn stop(self) -> Result<RunOutcome, SimulationError> {
        info!("Stopping simulation runner...");
        self.controller.quit();
        self.join()
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            self.controller.quit();
            if handle.join().is_err() {
                warn!("Simulation thread panicked during shutdown");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{EndReason, RunState};
    use crate::grid::{Cell, Grid};
    use crate::io::MemoryIo;
    use crate::observer::{NoOpObserver, RunEvent};
    use crate::params::ReportPolicy;
    use std::time::Duration;

    fn blinker_io() -> MemoryIo {
        MemoryIo::new(&Grid::with_alive(6, 6, &[Cell::new(1, 2), Cell::new(2, 2), Cell::new(3, 2)]))
    }

    #[test]
    fn test_runs_to_completion() {
        let mut io = blinker_io();
        let params = RunParams::new(6, 6, 3, 10).with_report(ReportPolicy::Never);

        let runner = SimulationRunner::start(params, io.clone(), NoOpObserver).unwrap();
        let outcome = runner.join().unwrap();

        assert_eq!(outcome.turns_completed, 10);
        assert_eq!(outcome.end_reason, EndReason::Completed);
        assert_eq!(outcome.final_grid.as_bytes(), io.load_grid(6, 6).unwrap().as_slice());
        assert_eq!(io.idle_checks(), 1);
    }

    #[test]
    fn test_stop_while_paused() {
        let io = blinker_io();
        let params = RunParams::new(6, 6, 2, u64::MAX).with_report(ReportPolicy::Never);
        let (events, rx) = crossbeam_channel::unbounded::<RunEvent>();

        let runner = SimulationRunner::start(params, io.clone(), events).unwrap();
        runner.controller().pause();

        // Wait until the loop has actually paused
        let paused = rx
            .iter()
            .find(|event| matches!(event, RunEvent::StateChange { state: RunState::Paused, .. }));
        assert!(paused.is_some());
        assert!(runner.is_running());

        let outcome = runner.stop().unwrap();
        assert_eq!(outcome.end_reason, EndReason::Quit);

        // One snapshot for the pause, one for the final save, same turn
        let saves = io.saves();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].turns, outcome.turns_completed);
        assert_eq!(saves[1].turns, outcome.turns_completed);
    }

    #[test]
    fn test_drop_stops_run() {
        let io = blinker_io();
        let params = RunParams::new(6, 6, 2, u64::MAX).with_report(ReportPolicy::Never);

        let runner = SimulationRunner::start(params, io.clone(), NoOpObserver).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        drop(runner);

        assert_eq!(io.saves().len(), 1);
        assert_eq!(io.idle_checks(), 1);
    }

    #[test]
    fn test_start_rejects_bad_params() {
        let result = SimulationRunner::start(RunParams::new(6, 6, 0, 1), blinker_io(), NoOpObserver);
        assert!(matches!(result, Err(SimulationError::Config { .. })));
    }
}
