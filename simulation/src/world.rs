//! Simulation World - main orchestrator
//!
//! Owns the grid for the length of a run: loads it, drives the control loop
//! that interleaves signals with generations, then saves and reports the
//! final state.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::control::{ControlSignals, EndReason, ReportTimer, RunState, Signal, Wake};
use crate::coordinator::GenerationCoordinator;
use crate::error::{GridIoError, SimulationError};
use crate::grid::{Cell, Grid};
use crate::io::{GridIo, Snapshot};
use crate::observer::RunObserver;
use crate::params::{ReportPolicy, RunParams};

/// What a finished run hands back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub turns_completed: u64,
    pub end_reason: EndReason,
    /// Live cells in row-major order
    pub alive_cells: Vec<Cell>,
    #[serde(skip)]
    pub final_grid: Grid,
}

pub struct SimulationWorld {
    grid: Grid,
    coordinator: GenerationCoordinator,
    report: ReportPolicy,
    target_turns: u64,
    turn: u64,
    state: RunState,
}

impl SimulationWorld {
    /// Wrap an already populated grid. Parameters are validated before any
    /// worker thread is created, and the grid must have their dimensions.
    pub fn new(params: &RunParams, grid: Grid) -> Result<Self, SimulationError> {
        params.validate()?;
        if (grid.width(), grid.height()) != (params.width, params.height) {
            return Err(SimulationError::GridMismatch {
                expected_width: params.width,
                expected_height: params.height,
                width: grid.width(),
                height: grid.height(),
            });
        }
        let coordinator = GenerationCoordinator::new(grid.height(), params.workers)?;

        Ok(Self {
            grid,
            coordinator,
            report: params.report,
            target_turns: params.turns,
            turn: 0,
            state: RunState::Running,
        })
    }

    /// Validate `params`, then fetch the initial grid from the collaborator.
    pub fn load(params: &RunParams, io: &mut dyn GridIo) -> Result<Self, SimulationError> {
        params.validate()?;

        let bytes = io.load_grid(params.width, params.height)?;
        let grid = Grid::from_bytes(params.width, params.height, &bytes).ok_or(
            GridIoError::WrongSize {
                expected: params.width * params.height,
                actual: bytes.len(),
            },
        )?;

        for cell in grid.alive_cells() {
            debug!(x = cell.x, y = cell.y, "Alive cell at start");
        }
        info!(
            width = params.width,
            height = params.height,
            workers = params.workers,
            alive = grid.alive_count(),
            "Initial grid loaded"
        );

        Self::new(params, grid)
    }

    /// Run one generation
    pub fn tick(&mut self) {
        self.coordinator.advance_one_generation(&mut self.grid);
        self.turn += 1;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Generations completed so far
    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn alive_count(&self) -> usize {
        self.grid.alive_count()
    }

    fn set_state(&mut self, state: RunState, observer: &mut dyn RunObserver) {
        self.state = state;
        observer.state_change(self.turn, state);
    }

    fn request_snapshot(
        &self,
        io: &mut dyn GridIo,
        observer: &mut dyn RunObserver,
    ) -> Result<(), SimulationError> {
        info!(turn = self.turn, "Snapshot requested");
        io.save_grid(Snapshot::of(&self.grid, self.turn))?;
        observer.snapshot_requested(self.turn);
        Ok(())
    }

    /// Control loop. Each iteration services exactly one of, in order: the
    /// periodic report, a report signal, a pause signal, a quit signal, or
    /// (with nothing pending) one generation.
    pub fn run(
        &mut self,
        io: &mut dyn GridIo,
        signals: &ControlSignals,
        observer: &mut dyn RunObserver,
    ) -> Result<EndReason, SimulationError> {
        let mut timer = ReportTimer::start(self.report, self.turn);
        self.set_state(RunState::Running, observer);

        let end_reason = loop {
            if self.turn >= self.target_turns {
                break EndReason::Completed;
            }

            if timer.is_due(self.turn) {
                observer.alive_count(self.turn, self.grid.alive_count());
                timer.rearm(self.turn);
                continue;
            }

            match signals.poll() {
                Some(Signal::Report) => self.request_snapshot(io, observer)?,
                Some(Signal::Pause) => {
                    self.request_snapshot(io, observer)?;
                    self.set_state(RunState::Paused, observer);
                    info!(turn = self.turn, "Paused");

                    if signals.wait_for_resume() == Wake::Quit {
                        info!(turn = self.turn, "Quit while paused");
                        break EndReason::Quit;
                    }
                    info!(turn = self.turn, "Continuing");
                    self.set_state(RunState::Running, observer);
                }
                Some(Signal::Quit) => {
                    info!(turn = self.turn, "Quit requested");
                    break EndReason::Quit;
                }
                None => {
                    self.tick();
                    observer.turn_complete(self.turn);
                }
            }
        };

        self.set_state(RunState::Terminated(end_reason), observer);
        Ok(end_reason)
    }

    /// Save the final grid tagged with the turns actually completed, wait for
    /// every outstanding save, and hand back the live cells.
    pub fn finish(self, io: &mut dyn GridIo, end_reason: EndReason) -> Result<RunOutcome, SimulationError> {
        let alive_cells = self.grid.alive_cells();

        io.save_grid(Snapshot::of(&self.grid, self.turn))?;
        io.wait_idle()?;

        info!(
            turns = self.turn,
            target = self.target_turns,
            alive = alive_cells.len(),
            reason = ?end_reason,
            "Simulation finished"
        );
        if end_reason == EndReason::Quit {
            warn!(remaining = self.target_turns - self.turn, "Stopped before target turn count");
        }

        Ok(RunOutcome {
            turns_completed: self.turn,
            end_reason,
            alive_cells,
            final_grid: self.grid,
        })
    }
}

/// Load, run and finish in one call.
pub fn run(
    params: &RunParams,
    io: &mut dyn GridIo,
    signals: &ControlSignals,
    observer: &mut dyn RunObserver,
) -> Result<RunOutcome, SimulationError> {
    let mut world = SimulationWorld::load(params, io)?;
    let end_reason = world.run(io, signals, observer)?;
    world.finish(io, end_reason)
}
