//! Run control
//!
//! A [`Controller`] is the sending half handed to whoever drives the run
//! (keyboard, UI, tests). The control loop owns the matching
//! [`ControlSignals`] and polls them between generations.
//!
//! Pause and resume travel on the same channel: the first signal pauses, the
//! next one resumes.

use std::time::Instant;

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::params::ReportPolicy;

// ============================================================================
// Run state
// ============================================================================

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The target turn count was reached.
    Completed,
    /// A quit signal arrived first.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    Paused,
    Terminated(EndReason),
}

// ============================================================================
// Signals
// ============================================================================

/// A signal picked up by one control-loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Save a snapshot and carry on.
    Report,
    /// Save a snapshot and wait for the next pause signal.
    Pause,
    Quit,
}

/// How a paused loop was woken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Resumed,
    Quit,
}

/// Cloneable sending half of the control channels.
///
/// Sends are dropped silently once the run has ended.
#[derive(Debug, Clone)]
pub struct Controller {
    report: Sender<()>,
    pause: Sender<()>,
    quit: Sender<()>,
}

impl Controller {
    /// Ask for a snapshot of the current grid.
    pub fn report(&self) {
        let _ = self.report.send(());
    }

    pub fn pause(&self) {
        let _ = self.pause.send(());
    }

    /// Same signal as [`pause`](Self::pause); named for readability at call
    /// sites that know the run is paused.
    pub fn resume(&self) {
        let _ = self.pause.send(());
    }

    pub fn quit(&self) {
        let _ = self.quit.send(());
    }
}

/// Receiving half, owned by the control loop.
#[derive(Debug)]
pub struct ControlSignals {
    report: Receiver<()>,
    pause: Receiver<()>,
    quit: Receiver<()>,
}

impl ControlSignals {
    /// Non-blocking check of every source, highest priority first. At most
    /// one signal is taken per call.
    pub fn poll(&self) -> Option<Signal> {
        let sources = [
            (&self.report, Signal::Report),
            (&self.pause, Signal::Pause),
            (&self.quit, Signal::Quit),
        ];
        // A disconnected source just never fires
        sources
            .into_iter()
            .find(|(rx, _)| rx.try_recv().is_ok())
            .map(|(_, signal)| signal)
    }

    /// Block until the pause channel fires again or a quit arrives.
    ///
    /// If every controller has been dropped nobody can resume the run, so it
    /// is treated as resumed.
    pub fn wait_for_resume(&self) -> Wake {
        select! {
            recv(self.pause) -> _ => Wake::Resumed,
            recv(self.quit) -> msg => match msg {
                Ok(()) => Wake::Quit,
                Err(_) => Wake::Resumed,
            },
        }
    }
}

/// Create a connected controller / signal pair.
pub fn channel() -> (Controller, ControlSignals) {
    let (report_tx, report_rx) = unbounded();
    let (pause_tx, pause_rx) = unbounded();
    let (quit_tx, quit_rx) = unbounded();

    (
        Controller {
            report: report_tx,
            pause: pause_tx,
            quit: quit_tx,
        },
        ControlSignals {
            report: report_rx,
            pause: pause_rx,
            quit: quit_rx,
        },
    )
}

// ============================================================================
// Report timer
// ============================================================================

/// Tracks when the next periodic alive-cell report is due.
#[derive(Debug, Clone)]
pub struct ReportTimer {
    policy: ReportPolicy,
    deadline: Instant,
    last_turn: u64,
}

impl ReportTimer {
    pub fn start(policy: ReportPolicy, turn: u64) -> Self {
        let now = Instant::now();
        Self {
            policy,
            deadline: Self::next_deadline(policy, now),
            last_turn: turn,
        }
    }

    fn next_deadline(policy: ReportPolicy, now: Instant) -> Instant {
        match policy {
            ReportPolicy::Interval(period) => now + period,
            ReportPolicy::EveryTurns(_) | ReportPolicy::Never => now,
        }
    }

    pub fn is_due(&self, turn: u64) -> bool {
        match self.policy {
            ReportPolicy::Interval(_) => Instant::now() >= self.deadline,
            ReportPolicy::EveryTurns(every) => turn.saturating_sub(self.last_turn) >= every,
            ReportPolicy::Never => false,
        }
    }

    /// Start the next period from now / from `turn`.
    pub fn rearm(&mut self, turn: u64) {
        self.deadline = Self::next_deadline(self.policy, Instant::now());
        self.last_turn = turn;
    }
}
