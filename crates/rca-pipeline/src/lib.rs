// crates/rca-pipeline/src/lib.rs
//
// rca-pipeline: RCA generation pipeline.
//
// The gate decides whether an incident needs a report and is the only writer
// of reports. The watcher feeds it from the incident change feed; the
// on-demand path feeds it from API requests. Both share one gate and one
// provider.

pub mod gate;
pub mod ondemand;
pub mod state;
pub mod watcher;

// Re-export key types for ergonomic access from downstream crates.
pub use gate::{GateOutcome, RcaGate};
pub use ondemand::{client_message, generate_for_incident};
pub use state::{WatcherState, WatcherStateMachine};
pub use watcher::{InFlightPolicy, IncidentWatcher, WatcherConfig, WatcherHandle, WatcherStats};
