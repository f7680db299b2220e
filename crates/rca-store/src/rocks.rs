// crates/rca-store/src/rocks.rs
//
// RocksDB-backed persistent storage for incidents and RCA reports.
//
// Key format:
//   - Incidents: `incident:{id}`          -> incident document JSON
//   - Reports:   `rca:{incident_id}`      -> JSON-serialized RcaReport
//
// Reports are keyed by their natural key, so an upsert is a single put and
// at most one report exists per incident.

use std::sync::Mutex;

use async_trait::async_trait;
use rocksdb::{DBWithThreadMode, MultiThreaded, Options};
use serde_json::Value;

use rca_core::{
    ChangeEvent, ChangeFeed, ChangeFilter, ChangeStream, Incident, IncidentStore, RcaError,
    RcaReport, ReportStore,
};

use crate::document::{incident_key, prepare_incident, report_key};
use crate::feed::ChangeFeedHub;

/// RocksDB wrapper implementing the incident, report and change-feed traits.
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
    feed: ChangeFeedHub,
    /// Serializes incident writes and their feed events.
    incident_writes: Mutex<()>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.db.path())
            .finish()
    }
}

impl RocksStore {
    /// Open a RocksDB database at the given filesystem path.
    ///
    /// Creates the database directory if it does not exist. `feed_capacity`
    /// is the per-subscriber backlog at which the change feed logs a warning.
    pub fn open(path: &str, feed_capacity: usize) -> Result<Self, RcaError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path)
            .map_err(|e| RcaError::Storage(format!("Failed to open RocksDB at {}: {}", path, e)))?;

        tracing::info!("Opened RocksDB store at {}", path);

        Ok(Self {
            db,
            feed: ChangeFeedHub::new(feed_capacity),
            incident_writes: Mutex::new(()),
        })
    }

    fn put_raw(&self, key: &[u8], value: &[u8]) -> Result<(), RcaError> {
        self.db
            .put(key, value)
            .map_err(|e| RcaError::Storage(format!("RocksDB put failed: {}", e)))
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RcaError> {
        self.db
            .get(key)
            .map_err(|e| RcaError::Storage(format!("RocksDB get failed: {}", e)))
    }

    fn delete_raw(&self, key: &[u8]) -> Result<(), RcaError> {
        self.db
            .delete(key)
            .map_err(|e| RcaError::Storage(format!("RocksDB delete failed: {}", e)))
    }

    /// Raw incident document as stored.
    pub fn get_incident_document(&self, id: &str) -> Result<Option<Value>, RcaError> {
        match self.get_raw(&incident_key(id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Overwrite an existing incident document and publish a replace event.
    pub fn replace_incident(&self, document: Value) -> Result<String, RcaError> {
        let (id, document) = prepare_incident(document)?;
        let _guard = self.lock_incident_writes()?;
        if self.get_raw(&incident_key(&id))?.is_none() {
            return Err(RcaError::NotFound(format!("Incident not found: {}", id)));
        }
        self.put_raw(&incident_key(&id), &serde_json::to_vec(&document)?)?;
        self.feed.publish(ChangeEvent::replace(id.clone(), document));
        Ok(id)
    }

    /// Remove an incident document. Returns whether it existed.
    pub fn delete_incident(&self, id: &str) -> Result<bool, RcaError> {
        let _guard = self.lock_incident_writes()?;
        let existed = self.get_raw(&incident_key(id))?.is_some();
        if existed {
            self.delete_raw(&incident_key(id))?;
            self.feed.publish(ChangeEvent::delete(id));
        }
        Ok(existed)
    }

    /// Number of stored reports (prefix scan over `rca:`).
    pub fn report_count(&self) -> Result<usize, RcaError> {
        let prefix = b"rca:";
        let mut count = 0;
        for item in self.db.prefix_iterator(prefix) {
            let (key, _value) = item
                .map_err(|e| RcaError::Storage(format!("RocksDB iteration error: {}", e)))?;
            if !key.starts_with(prefix) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    pub fn feed(&self) -> &ChangeFeedHub {
        &self.feed
    }

    fn lock_incident_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>, RcaError> {
        self.incident_writes
            .lock()
            .map_err(|_| RcaError::Storage("incident write lock poisoned".to_string()))
    }
}

#[async_trait]
impl IncidentStore for RocksStore {
    async fn insert_incident(&self, document: Value) -> Result<String, RcaError> {
        let (id, document) = prepare_incident(document)?;
        // Publish under the write lock so feed order matches write order.
        let _guard = self.lock_incident_writes()?;
        if self.get_raw(&incident_key(&id))?.is_some() {
            return Err(RcaError::InvalidState(format!(
                "Incident already exists: {}",
                id
            )));
        }
        self.put_raw(&incident_key(&id), &serde_json::to_vec(&document)?)?;
        self.feed.publish(ChangeEvent::insert(id.clone(), document));
        Ok(id)
    }

    async fn get_incident(&self, id: &str) -> Result<Option<Incident>, RcaError> {
        self.get_incident_document(id)?
            .as_ref()
            .map(Incident::from_document)
            .transpose()
    }
}

#[async_trait]
impl ReportStore for RocksStore {
    async fn find_report(&self, incident_id: &str) -> Result<Option<RcaReport>, RcaError> {
        match self.get_raw(&report_key(incident_id))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn upsert_report(&self, report: &RcaReport) -> Result<(), RcaError> {
        let json = serde_json::to_vec(report)?;
        self.put_raw(&report_key(&report.incident_id), &json)
    }
}

impl ChangeFeed for RocksStore {
    fn watch(&self, filter: ChangeFilter) -> ChangeStream {
        self.feed.subscribe(filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rca_core::{OperationType, RcaFields, ReportStatus};
    use std::sync::Arc;
    use serde_json::json;
    use uuid::Uuid;

    fn temp_store() -> (RocksStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("rca-store-test-{}", Uuid::now_v7()));
        let store = RocksStore::open(dir.to_str().unwrap(), 16).unwrap();
        (store, dir)
    }

    fn fields() -> RcaFields {
        RcaFields {
            rca_description: "disk filled up".to_string(),
            probable_causes: "- log rotation disabled".to_string(),
            impacts: "- service downtime".to_string(),
            recommended_actions: "- enable rotation".to_string(),
        }
    }

    #[tokio::test]
    async fn incident_round_trip_with_missing_fields() {
        let (store, dir) = temp_store();
        let id = store.insert_incident(json!({"_id": 1042})).await.unwrap();
        assert_eq!(id, "1042");

        let incident = store.get_incident("1042").await.unwrap().unwrap();
        assert_eq!(incident.description, "");
        assert!(incident.tags.is_empty());

        drop(store);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn reports_survive_reopen() {
        let (store, dir) = temp_store();
        let incident = Incident::from_document(&json!({"_id": "inc-7", "tags": ["prod"]})).unwrap();
        let report = RcaReport::open(&incident, fields(), "titan");
        store.upsert_report(&report).await.unwrap();
        drop(store);

        let reopened = RocksStore::open(dir.to_str().unwrap(), 16).unwrap();
        let stored = reopened.find_report("inc-7").await.unwrap().unwrap();
        assert_eq!(stored, report);
        assert_eq!(stored.status, ReportStatus::Open);

        drop(reopened);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn upsert_replaces_and_count_scans_prefix() {
        let (store, dir) = temp_store();
        store.insert_incident(json!({"_id": "a"})).await.unwrap();
        for id in ["a", "b"] {
            let incident = Incident::from_document(&json!({"_id": id})).unwrap();
            store
                .upsert_report(&RcaReport::open(&incident, fields(), "gpt3"))
                .await
                .unwrap();
        }
        let incident = Incident::from_document(&json!({"_id": "a"})).unwrap();
        let mut replacement = RcaReport::open(&incident, fields(), "gpt3");
        replacement.close("retention misconfigured");
        store.upsert_report(&replacement).await.unwrap();

        // The incident key shares no prefix with reports.
        assert_eq!(store.report_count().unwrap(), 2);
        let stored = store.find_report("a").await.unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Closed);
        assert_eq!(stored.root_cause.as_deref(), Some("retention misconfigured"));

        drop(store);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn insert_feeds_watchers_and_rejects_duplicates() {
        let (store, dir) = temp_store();
        let mut stream = store.watch(ChangeFilter::Inserts);

        store
            .insert_incident(json!({"_id": {"$oid": "65f1"}, "description": "API 500s"}))
            .await
            .unwrap();
        let event = stream.next().await.unwrap();
        assert_eq!(event.document_key, "65f1");

        let err = store.insert_incident(json!({"_id": "65f1"})).await.unwrap_err();
        assert!(matches!(err, RcaError::InvalidState(_)));

        assert!(store.delete_incident("65f1").unwrap());
        assert!(store.get_incident("65f1").await.unwrap().is_none());

        drop(store);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn feed_order_matches_write_order_under_contention() {
        let (store, dir) = temp_store();
        let store = Arc::new(store);
        let mut stream = store.watch(ChangeFilter::All);

        let mut tasks = Vec::new();
        for _ in 0..4 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..50 {
                    let _ = store.insert_incident(json!({"_id": "contended"})).await;
                    let _ = store.delete_incident("contended");
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        let exists_at_end = store.get_incident("contended").await.unwrap().is_some();

        // An insert only succeeds on a missing id and a delete only on a
        // present one, so the published sequence must alternate.
        let mut expect_insert = true;
        let mut events = 0;
        while let Ok(Some(event)) =
            tokio::time::timeout(std::time::Duration::from_millis(50), stream.next()).await
        {
            let expected = if expect_insert {
                OperationType::Insert
            } else {
                OperationType::Delete
            };
            assert_eq!(event.operation_type, expected, "event {} out of order", events);
            expect_insert = !expect_insert;
            events += 1;
        }
        assert!(events > 0);
        assert_eq!(exists_at_end, !expect_insert);

        drop(stream);
        drop(store);
        let _ = std::fs::remove_dir_all(dir);
    }
}
