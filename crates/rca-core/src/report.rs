// crates/rca-core/src/report.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::incident::Incident;
use crate::normalize;

/// Lifecycle of an RCA report.
///
///   Open --> InProgress --> Closed
///     \___________________/^
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportStatus {
    /// Generated and awaiting review.
    Open,
    /// Under investigation by a responder.
    InProgress,
    /// Root cause confirmed; report closed.
    Closed,
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Open => write!(f, "Open"),
            ReportStatus::InProgress => write!(f, "InProgress"),
            ReportStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// The structured sections produced from one model response.
///
/// A section the model did not produce carries its sentinel text
/// (e.g. "Impacts section not found.") rather than being absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcaFields {
    pub rca_description: String,
    pub probable_causes: String,
    pub impacts: String,
    pub recommended_actions: String,
}

impl RcaFields {
    /// True when every section was found in the model output.
    pub fn is_complete(&self) -> bool {
        [
            &self.rca_description,
            &self.probable_causes,
            &self.impacts,
            &self.recommended_actions,
        ]
        .iter()
        .all(|text| !normalize::is_sentinel(text))
    }
}

/// A persisted Root Cause Analysis report.
///
/// `incident_id` is the natural key: the store holds at most one report per
/// incident and writes are upserts on that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcaReport {
    /// Generated identifier (UUID v7 string).
    pub id: String,
    /// The incident this report explains.
    pub incident_id: String,
    pub rca_description: String,
    pub probable_causes: String,
    pub impact_on_business: String,
    pub recommended_actions: String,
    /// Confirmed root cause, set when the report is closed.
    #[serde(default)]
    pub root_cause: Option<String>,
    pub status: ReportStatus,
    /// Tags copied from the incident at creation time.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Name of the provider that produced the text.
    #[serde(default)]
    pub provider: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RcaReport {
    /// Assemble a fresh Open report for an incident.
    pub fn open(incident: &Incident, fields: RcaFields, provider: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            incident_id: incident.id.clone(),
            rca_description: fields.rca_description,
            probable_causes: fields.probable_causes,
            impact_on_business: fields.impacts,
            recommended_actions: fields.recommended_actions,
            root_cause: None,
            status: ReportStatus::Open,
            tags: incident.tags.clone(),
            provider: Some(provider.to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    /// The generated sections in the shape returned to API callers.
    pub fn fields(&self) -> RcaFields {
        RcaFields {
            rca_description: self.rca_description.clone(),
            probable_causes: self.probable_causes.clone(),
            impacts: self.impact_on_business.clone(),
            recommended_actions: self.recommended_actions.clone(),
        }
    }

    /// Record the confirmed root cause and close the report.
    pub fn close(&mut self, root_cause: impl Into<String>) {
        self.root_cause = Some(root_cause.into());
        self.status = ReportStatus::Closed;
        self.updated_at = Utc::now();
    }
}
