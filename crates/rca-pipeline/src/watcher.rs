// crates/rca-pipeline/src/watcher.rs
//
// Change-feed watcher: a long-running task that generates an RCA for every
// inserted incident.
//
// The task subscribes to insert events, hands each incident to the gate and
// logs the outcome. Per-event failures never end the loop. Shutdown goes
// through a `watch` channel; `WatcherHandle::shutdown` bounds how long the
// caller waits before the task is aborted.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, Span};

use rca_core::{ChangeEvent, ChangeFeed, ChangeFilter, ChangeStream, Incident, RcaError};

use crate::gate::{GateOutcome, RcaGate};
use crate::state::{WatcherState, WatcherStateMachine};

/// What happens to a generation that is running when shutdown is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InFlightPolicy {
    /// Let the current incident complete, then stop.
    #[default]
    Finish,
    /// Drop the current generation immediately. Nothing is written for it.
    Abandon,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WatcherConfig {
    pub in_flight: InFlightPolicy,
}

/// Counters returned by the watcher task when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatcherStats {
    pub events_seen: u64,
    pub generated: u64,
    pub skipped_existing: u64,
    pub failed: u64,
}

/// Consumer of incident insert events.
pub struct IncidentWatcher {
    feed: Arc<dyn ChangeFeed>,
    gate: RcaGate,
    config: WatcherConfig,
    span: Span,
}

impl IncidentWatcher {
    pub fn new(feed: Arc<dyn ChangeFeed>, gate: RcaGate, config: WatcherConfig, span: Span) -> Self {
        Self {
            feed,
            gate,
            config,
            span,
        }
    }

    /// Subscribe and start the watcher on its own task.
    ///
    /// The subscription is opened before this returns, so any incident
    /// inserted afterwards is seen.
    pub fn spawn(self) -> WatcherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(WatcherState::Idle);
        let state_tx = Arc::new(state_tx);
        let stream = self.feed.watch(ChangeFilter::Inserts);
        let span = self.span.clone();
        let join = tokio::spawn(self.run(stream, shutdown_rx, state_tx.clone()).instrument(span));
        WatcherHandle {
            shutdown_tx,
            state_tx,
            state_rx,
            join,
        }
    }

    async fn run(
        self,
        mut stream: ChangeStream,
        mut shutdown_rx: watch::Receiver<bool>,
        state_tx: Arc<watch::Sender<WatcherState>>,
    ) -> WatcherStats {
        let mut machine = WatcherStateMachine::new();
        let mut stats = WatcherStats::default();
        advance(&mut machine, &state_tx, WatcherState::Watching);
        tracing::info!(
            "Incident watcher started (provider {}, in-flight policy {:?})",
            self.gate.provider_name(),
            self.config.in_flight
        );

        loop {
            let event = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    tracing::info!("Incident watcher received shutdown signal");
                    break;
                }
                next = stream.next() => match next {
                    Some(event) => event,
                    None => {
                        tracing::warn!("Incident change feed closed; watcher stopping");
                        break;
                    }
                },
            };

            stats.events_seen += 1;
            advance(&mut machine, &state_tx, WatcherState::Processing);
            let key = event.document_key.clone();

            let outcome = match self.config.in_flight {
                InFlightPolicy::Finish => Some(self.process(event).await),
                InFlightPolicy::Abandon => tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => None,
                    result = self.process(event) => Some(result),
                },
            };

            match outcome {
                Some(Ok(GateOutcome::Generated(report))) => {
                    stats.generated += 1;
                    tracing::info!("Generated RCA {} for incident {}", report.id, key);
                }
                Some(Ok(GateOutcome::Existing(_))) => {
                    stats.skipped_existing += 1;
                    tracing::info!("RCA already exists for incident {}", key);
                }
                Some(Err(e)) => {
                    stats.failed += 1;
                    tracing::error!("Failed to process incident {}: {}", key, e);
                }
                None => {
                    tracing::warn!("Abandoned in-flight generation for incident {}", key);
                    break;
                }
            }
            advance(&mut machine, &state_tx, WatcherState::Watching);
        }

        drop(stream);
        advance(&mut machine, &state_tx, WatcherState::Cancelled);
        tracing::info!(
            "Incident watcher stopped: {} events, {} generated, {} skipped, {} failed",
            stats.events_seen,
            stats.generated,
            stats.skipped_existing,
            stats.failed
        );
        stats
    }

    async fn process(&self, event: ChangeEvent) -> Result<GateOutcome, RcaError> {
        let incident = incident_from_event(&event)?;
        let incident_id = incident.id.clone();
        self.gate
            .ensure_generated(&incident_id, move || async move { Ok(Some(incident)) })
            .await
    }
}

fn advance(
    machine: &mut WatcherStateMachine,
    state_tx: &watch::Sender<WatcherState>,
    next: WatcherState,
) {
    match machine.transition(next) {
        Ok(()) => {
            state_tx.send_replace(next);
        }
        Err(e) => tracing::error!("{}", e),
    }
}

/// Read the incident carried by an insert event.
///
/// Falls back to the event's document key when the document has no `_id`.
fn incident_from_event(event: &ChangeEvent) -> Result<Incident, RcaError> {
    let document = event.full_document.as_ref().ok_or_else(|| {
        RcaError::InvalidDocument(format!(
            "change event for {} carries no document",
            event.document_key
        ))
    })?;

    if document.get("_id").is_some() {
        return Incident::from_document(document);
    }

    let mut document = document.clone();
    if let Some(obj) = document.as_object_mut() {
        obj.insert("_id".to_string(), Value::String(event.document_key.clone()));
    }
    Incident::from_document(&document)
}

/// Owner handle for a running watcher.
///
/// Dropping the handle also stops the watcher.
#[derive(Debug)]
pub struct WatcherHandle {
    shutdown_tx: watch::Sender<bool>,
    /// Shared with the task so an aborted or panicked task still ends in
    /// `Cancelled`.
    state_tx: Arc<watch::Sender<WatcherState>>,
    state_rx: watch::Receiver<WatcherState>,
    join: JoinHandle<WatcherStats>,
}

impl WatcherHandle {
    pub fn state(&self) -> WatcherState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes every state change.
    pub fn subscribe_state(&self) -> watch::Receiver<WatcherState> {
        self.state_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signal shutdown and wait up to `timeout` for the task to stop.
    ///
    /// Returns the final stats, or `None` if the task had to be aborted or
    /// panicked. The published state is `Cancelled` either way.
    pub async fn shutdown(self, timeout: Duration) -> Option<WatcherStats> {
        let _ = self.shutdown_tx.send(true);
        let mut join = self.join;
        let stats = match tokio::time::timeout(timeout, &mut join).await {
            Ok(Ok(stats)) => Some(stats),
            Ok(Err(e)) => {
                tracing::error!("Incident watcher task failed: {}", e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "Incident watcher did not stop within {:?}; aborting",
                    timeout
                );
                join.abort();
                let _ = join.await;
                None
            }
        };
        if stats.is_none() {
            self.state_tx.send_replace(WatcherState::Cancelled);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_document_without_id_uses_document_key() {
        let event = ChangeEvent::insert("inc-5", json!({"description": "Queue backlog"}));
        let incident = incident_from_event(&event).unwrap();
        assert_eq!(incident.id, "inc-5");
        assert_eq!(incident.description, "Queue backlog");
        assert!(incident.tags.is_empty());
    }

    #[test]
    fn event_without_document_is_invalid() {
        let event = ChangeEvent::delete("inc-5");
        assert!(matches!(
            incident_from_event(&event),
            Err(RcaError::InvalidDocument(_))
        ));
    }

    #[test]
    fn in_flight_policy_parses_lowercase() {
        let policy: InFlightPolicy = serde_json::from_str("\"abandon\"").unwrap();
        assert_eq!(policy, InFlightPolicy::Abandon);
        assert_eq!(InFlightPolicy::default(), InFlightPolicy::Finish);
    }
}
