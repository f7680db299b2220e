// crates/rca-pipeline/src/state.rs
//
// Watcher lifecycle state machine.
//
// Valid transitions:
//   Idle -> Watching -> Processing -> Watching
//   Any non-terminal state -> Cancelled (terminal)

use std::fmt;

use serde::Serialize;

/// Lifecycle states of the incident watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WatcherState {
    /// Created, not yet subscribed.
    Idle,
    /// Subscribed and waiting for the next insert.
    Watching,
    /// Driving the gate for one incident.
    Processing,
    /// Stopped. Terminal.
    Cancelled,
}

impl fmt::Display for WatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatcherState::Idle => write!(f, "Idle"),
            WatcherState::Watching => write!(f, "Watching"),
            WatcherState::Processing => write!(f, "Processing"),
            WatcherState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// State machine for the watcher task.
#[derive(Debug)]
pub struct WatcherStateMachine {
    pub current: WatcherState,
}

impl WatcherStateMachine {
    pub fn new() -> Self {
        Self {
            current: WatcherState::Idle,
        }
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns an error if the transition is not valid.
    pub fn transition(&mut self, new_state: WatcherState) -> Result<(), String> {
        let valid = match (self.current, new_state) {
            (WatcherState::Cancelled, _) => false,
            (_, WatcherState::Cancelled) => true,
            (WatcherState::Idle, WatcherState::Watching) => true,
            (WatcherState::Watching, WatcherState::Processing) => true,
            (WatcherState::Processing, WatcherState::Watching) => true,
            _ => false,
        };

        if valid {
            tracing::debug!("Watcher state transition: {} -> {}", self.current, new_state);
            self.current = new_state;
            Ok(())
        } else {
            Err(format!(
                "Invalid watcher state transition: {} -> {}",
                self.current, new_state
            ))
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.current == WatcherState::Cancelled
    }
}

impl Default for WatcherStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
