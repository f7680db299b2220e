// crates/rca-core/src/traits.rs

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ProviderError, RcaError};
use crate::feed::{ChangeFilter, ChangeStream};
use crate::incident::Incident;
use crate::normalize;
use crate::provider::{ProviderRequest, RawModelOutput};
use crate::report::{RcaFields, RcaReport};

/// Trait for the incident collection.
///
/// Implemented by rca-store (RocksDB and in-memory backends).
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Insert a new incident document and publish an insert event.
    /// Returns the document's `_id` as a plain string (generated if absent).
    async fn insert_incident(&self, document: Value) -> Result<String, RcaError>;

    /// Retrieve an incident by its identifier.
    async fn get_incident(&self, id: &str) -> Result<Option<Incident>, RcaError>;
}

/// Trait for the RCA report collection, keyed by `incident_id`.
///
/// Implemented by rca-store (RocksDB and in-memory backends).
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Point lookup by natural key.
    async fn find_report(&self, incident_id: &str) -> Result<Option<RcaReport>, RcaError>;

    /// Insert, or replace the report already stored for the same incident.
    async fn upsert_report(&self, report: &RcaReport) -> Result<(), RcaError>;

    /// Whether a report exists for the incident.
    async fn report_exists(&self, incident_id: &str) -> Result<bool, RcaError> {
        Ok(self.find_report(incident_id).await?.is_some())
    }
}

/// Trait for subscribing to incident change notifications.
pub trait ChangeFeed: Send + Sync {
    /// Open a subscription starting at the current position of the feed.
    fn watch(&self, filter: ChangeFilter) -> ChangeStream;
}

/// Trait for LLM backends that draft RCA text.
///
/// Implemented by rca-provider (Titan on Bedrock, GPT-3.5 chat completions).
#[async_trait]
pub trait RcaProvider: Send + Sync {
    /// Stable short name recorded on generated reports.
    fn name(&self) -> &str;

    /// Send one prompt built from `request` and return the raw model text.
    async fn invoke(&self, request: &ProviderRequest) -> Result<RawModelOutput, ProviderError>;

    /// Generate structured RCA fields for an incident.
    ///
    /// Blank model output is reported as `EmptyResponse`; anything else is
    /// normalized, with sentinels for sections the model left out.
    async fn generate(&self, description: &str, tags: &[String]) -> Result<RcaFields, ProviderError> {
        let request = ProviderRequest::new(description, tags);
        let raw = self.invoke(&request).await?;
        if raw.is_blank() {
            return Err(ProviderError::EmptyResponse);
        }
        tracing::debug!(provider = self.name(), "Raw model output: {}", raw.text);
        Ok(normalize::normalize(&raw.text))
    }
}
