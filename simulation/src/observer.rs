//! Run observers
//!
//! Hooks the control loop calls as a run progresses. Every hook defaults to a
//! no-op so implementations only pick what they need.

use crossbeam_channel::Sender;
use serde::Serialize;
use tracing::info;

use crate::control::RunState;

/// Callback interface for run progress.
pub trait RunObserver {
    /// Periodic alive-cell count.
    fn alive_count(&mut self, _turn: u64, _count: usize) {}

    /// The run moved to a new state.
    fn state_change(&mut self, _turn: u64, _state: RunState) {}

    /// A generation finished; `turn` is the number completed so far.
    fn turn_complete(&mut self, _turn: u64) {}

    /// A mid-run snapshot was handed to the save collaborator.
    fn snapshot_requested(&mut self, _turn: u64) {}
}

/// Ignores everything.
pub struct NoOpObserver;

impl RunObserver for NoOpObserver {}

/// Logs periodic counts and state changes through `tracing`.
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn alive_count(&mut self, turn: u64, count: usize) {
        info!(turn, alive = count, "Alive cells");
    }

    fn state_change(&mut self, turn: u64, state: RunState) {
        info!(turn, ?state, "Run state changed");
    }
}

/// Owned form of each hook, for forwarding over a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunEvent {
    AliveCellsCount { turn: u64, count: usize },
    StateChange { turn: u64, state: RunState },
    TurnComplete { turn: u64 },
    SnapshotRequested { turn: u64 },
}

/// Forward every hook as a [`RunEvent`]. Events are dropped once the
/// receiver is gone.
impl RunObserver for Sender<RunEvent> {
    fn alive_count(&mut self, turn: u64, count: usize) {
        let _ = self.send(RunEvent::AliveCellsCount { turn, count });
    }

    fn state_change(&mut self, turn: u64, state: RunState) {
        let _ = self.send(RunEvent::StateChange { turn, state });
    }

    fn turn_complete(&mut self, turn: u64) {
        let _ = self.send(RunEvent::TurnComplete { turn });
    }

    fn snapshot_requested(&mut self, turn: u64) {
        let _ = self.send(RunEvent::SnapshotRequested { turn });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::EndReason;

    #[test]
    fn test_sender_forwards_events() {
        let (mut tx, rx) = crossbeam_channel::unbounded::<RunEvent>();
        tx.turn_complete(1);
        tx.alive_count(1, 5);
        tx.state_change(1, RunState::Terminated(EndReason::Quit));

        let events: Vec<RunEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                RunEvent::TurnComplete { turn: 1 },
                RunEvent::AliveCellsCount { turn: 1, count: 5 },
                RunEvent::StateChange {
                    turn: 1,
                    state: RunState::Terminated(EndReason::Quit)
                },
            ]
        );
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (mut tx, rx) = crossbeam_channel::unbounded::<RunEvent>();
        drop(rx);
        tx.snapshot_requested(0);
    }
}
