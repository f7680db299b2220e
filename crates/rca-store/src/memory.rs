// crates/rca-store/src/memory.rs
//
// In-memory store for tests and ephemeral runs. Same semantics as
// `RocksStore`, nothing persisted.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use rca_core::{
    ChangeEvent, ChangeFeed, ChangeFilter, ChangeStream, Incident, IncidentStore, RcaError,
    RcaReport, ReportStore,
};

use crate::document::prepare_incident;
use crate::feed::ChangeFeedHub;

#[derive(Debug, Default)]
pub struct InMemoryStore {
    incidents: RwLock<HashMap<String, Value>>,
    reports: RwLock<HashMap<String, RcaReport>>,
    feed: ChangeFeedHub,
}

fn poisoned<E>(_: E) -> RcaError {
    RcaError::Storage("in-memory store lock poisoned".to_string())
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed_capacity(capacity: usize) -> Self {
        Self {
            feed: ChangeFeedHub::new(capacity),
            ..Self::default()
        }
    }

    /// Overwrite an existing incident document and publish a replace event.
    pub fn replace_incident(&self, document: Value) -> Result<String, RcaError> {
        let (id, document) = prepare_incident(document)?;
        let mut incidents = self.incidents.write().map_err(poisoned)?;
        if !incidents.contains_key(&id) {
            return Err(RcaError::NotFound(format!("Incident not found: {}", id)));
        }
        incidents.insert(id.clone(), document.clone());
        self.feed.publish(ChangeEvent::replace(id.clone(), document));
        Ok(id)
    }

    /// Remove an incident document. Returns whether it existed.
    pub fn delete_incident(&self, id: &str) -> Result<bool, RcaError> {
        let mut incidents = self.incidents.write().map_err(poisoned)?;
        let removed = incidents.remove(id).is_some();
        if removed {
            self.feed.publish(ChangeEvent::delete(id));
        }
        Ok(removed)
    }

    pub fn report_count(&self) -> Result<usize, RcaError> {
        Ok(self.reports.read().map_err(poisoned)?.len())
    }

    pub fn feed(&self) -> &ChangeFeedHub {
        &self.feed
    }
}

#[async_trait]
impl IncidentStore for InMemoryStore {
    async fn insert_incident(&self, document: Value) -> Result<String, RcaError> {
        let (id, document) = prepare_incident(document)?;
        let mut incidents = self.incidents.write().map_err(poisoned)?;
        if incidents.contains_key(&id) {
            return Err(RcaError::InvalidState(format!(
                "Incident already exists: {}",
                id
            )));
        }
        incidents.insert(id.clone(), document.clone());
        self.feed.publish(ChangeEvent::insert(id.clone(), document));
        Ok(id)
    }

    async fn get_incident(&self, id: &str) -> Result<Option<Incident>, RcaError> {
        let incidents = self.incidents.read().map_err(poisoned)?;
        incidents.get(id).map(Incident::from_document).transpose()
    }
}

#[async_trait]
impl ReportStore for InMemoryStore {
    async fn find_report(&self, incident_id: &str) -> Result<Option<RcaReport>, RcaError> {
        Ok(self.reports.read().map_err(poisoned)?.get(incident_id).cloned())
    }

    async fn upsert_report(&self, report: &RcaReport) -> Result<(), RcaError> {
        self.reports
            .write()
            .map_err(poisoned)?
            .insert(report.incident_id.clone(), report.clone());
        Ok(())
    }
}

impl ChangeFeed for InMemoryStore {
    fn watch(&self, filter: ChangeFilter) -> ChangeStream {
        self.feed.subscribe(filter)
    }
}
