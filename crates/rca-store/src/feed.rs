// crates/rca-store/src/feed.rs
//
// In-process change feed owned by a store instance. Every incident write
// publishes one event; subscribers see only events published after they
// subscribed. Each subscriber has its own unbounded queue, so a slow consumer
// never loses events.

use std::sync::{Arc, Mutex, PoisonError};

use rca_core::{subscription, ChangeEvent, ChangeFilter, ChangeStream, Subscriber};

/// Default per-subscriber backlog above which a warning is logged.
pub const DEFAULT_FEED_CAPACITY: usize = 256;

/// Fan-out point for incident change events.
#[derive(Debug, Clone)]
pub struct ChangeFeedHub {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    backlog_warning: usize,
}

impl ChangeFeedHub {
    /// `backlog_warning` is the queue depth at which a subscriber is reported
    /// as falling behind. Nothing is dropped at that point.
    pub fn new(backlog_warning: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
            backlog_warning: backlog_warning.max(1),
        }
    }

    /// Publish an event. Returns the number of subscribers it was queued for.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut reached = 0;
        subscribers.retain(|subscriber| {
            if subscriber.is_closed() {
                return false;
            }
            if !subscriber.wants(&event) {
                return true;
            }
            if !subscriber.send(event.clone()) {
                return false;
            }
            reached += 1;
            if subscriber.backlog() == self.backlog_warning {
                tracing::warn!(
                    "Change feed subscriber has {} unread events; consumer is falling behind",
                    self.backlog_warning
                );
            }
            true
        });
        tracing::debug!(
            "Published {:?} for {} to {} subscribers",
            event.operation_type,
            event.document_key,
            reached
        );
        reached
    }

    /// Open a filtered subscription starting now.
    pub fn subscribe(&self, filter: ChangeFilter) -> ChangeStream {
        let (subscriber, stream) = subscription(filter);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscriber);
        stream
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }
}

impl Default for ChangeFeedHub {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
