// crates/rca-core/src/feed.rs
//
// Change-feed types: the events a document store publishes when incidents
// are written, and the filtered subscription handed to consumers.
//
// Streams start at "now": a subscriber only sees events published after it
// subscribed. Nothing is replayed across process restarts. While the process
// runs, every event that passes a subscriber's filter is queued for it; a slow
// consumer builds a backlog instead of losing events.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// The kind of write that produced a change event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Insert,
    Replace,
    Delete,
}

/// One change notification from the incident collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub operation_type: OperationType,
    /// Identifier of the affected document.
    pub document_key: String,
    /// Full document after the write; `None` for deletes.
    pub full_document: Option<Value>,
}

impl ChangeEvent {
    pub fn insert(document_key: impl Into<String>, document: Value) -> Self {
        Self {
            operation_type: OperationType::Insert,
            document_key: document_key.into(),
            full_document: Some(document),
        }
    }

    pub fn replace(document_key: impl Into<String>, document: Value) -> Self {
        Self {
            operation_type: OperationType::Replace,
            document_key: document_key.into(),
            full_document: Some(document),
        }
    }

    pub fn delete(document_key: impl Into<String>) -> Self {
        Self {
            operation_type: OperationType::Delete,
            document_key: document_key.into(),
            full_document: None,
        }
    }
}

/// Server-side filter applied to a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFilter {
    /// Every operation.
    All,
    /// Insert operations only.
    Inserts,
}

impl ChangeFilter {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        match self {
            ChangeFilter::All => true,
            ChangeFilter::Inserts => event.operation_type == OperationType::Insert,
        }
    }
}

/// Open a subscription: the publisher keeps the [`Subscriber`], the consumer
/// reads from the [`ChangeStream`].
pub fn subscription(filter: ChangeFilter) -> (Subscriber, ChangeStream) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let backlog = Arc::new(AtomicUsize::new(0));
    let subscriber = Subscriber {
        sender,
        filter,
        backlog: backlog.clone(),
    };
    let stream = ChangeStream {
        receiver,
        filter,
        backlog,
    };
    (subscriber, stream)
}

/// Publisher side of one subscription.
#[derive(Debug)]
pub struct Subscriber {
    sender: mpsc::UnboundedSender<ChangeEvent>,
    filter: ChangeFilter,
    backlog: Arc<AtomicUsize>,
}

impl Subscriber {
    pub fn wants(&self, event: &ChangeEvent) -> bool {
        self.filter.matches(event)
    }

    /// Queue an event for the consumer. Returns `false` once the stream has
    /// been dropped.
    pub fn send(&self, event: ChangeEvent) -> bool {
        self.backlog.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(event).is_err() {
            self.backlog.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Events queued but not yet read by the consumer.
    pub fn backlog(&self) -> usize {
        self.backlog.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A live, filtered subscription to a change feed.
///
/// Dropping the stream closes the subscription.
#[derive(Debug)]
pub struct ChangeStream {
    receiver: mpsc::UnboundedReceiver<ChangeEvent>,
    filter: ChangeFilter,
    backlog: Arc<AtomicUsize>,
}

impl ChangeStream {
    /// Wait for the next event.
    ///
    /// Returns `None` once every publisher handle has been dropped and the
    /// queue is drained.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        let event = self.receiver.recv().await?;
        self.backlog.fetch_sub(1, Ordering::SeqCst);
        Some(event)
    }

    pub fn filter(&self) -> ChangeFilter {
        self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn publish(subscriber: &Subscriber, event: ChangeEvent) {
        if subscriber.wants(&event) {
            assert!(subscriber.send(event));
        }
    }

    #[tokio::test]
    async fn insert_filter_skips_other_operations() {
        let (subscriber, mut stream) = subscription(ChangeFilter::Inserts);

        publish(&subscriber, ChangeEvent::replace("a", json!({"_id": "a"})));
        publish(&subscriber, ChangeEvent::delete("a"));
        publish(&subscriber, ChangeEvent::insert("b", json!({"_id": "b"})));

        let event = stream.next().await.unwrap();
        assert_eq!(event.operation_type, OperationType::Insert);
        assert_eq!(event.document_key, "b");
        assert_eq!(subscriber.backlog(), 0);
    }

    #[tokio::test]
    async fn stream_ends_when_publisher_drops() {
        let (subscriber, mut stream) = subscription(ChangeFilter::All);
        publish(&subscriber, ChangeEvent::delete("x"));
        drop(subscriber);

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn slow_consumer_receives_every_event_in_order() {
        let (subscriber, mut stream) = subscription(ChangeFilter::Inserts);
        for i in 0..300 {
            let key = format!("inc-{}", i);
            publish(&subscriber, ChangeEvent::insert(key.clone(), json!({"_id": key})));
        }
        assert_eq!(subscriber.backlog(), 300);
        drop(subscriber);

        let mut delivered = 0;
        while let Some(event) = stream.next().await {
            assert_eq!(event.document_key, format!("inc-{}", delivered));
            delivered += 1;
        }
        assert_eq!(delivered, 300);
    }

    #[test]
    fn send_fails_after_stream_is_dropped() {
        let (subscriber, stream) = subscription(ChangeFilter::All);
        drop(stream);
        assert!(subscriber.is_closed());
        assert!(!subscriber.send(ChangeEvent::delete("gone")));
        assert_eq!(subscriber.backlog(), 0);
    }

    #[test]
    fn event_serializes_like_a_change_document() {
        let event = ChangeEvent::insert("inc-1", json!({"_id": "inc-1"}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["operationType"], "insert");
        assert_eq!(json["documentKey"], "inc-1");
        assert_eq!(json["fullDocument"]["_id"], "inc-1");
    }
}
