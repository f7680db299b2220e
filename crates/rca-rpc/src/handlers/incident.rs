// crates/rca-rpc/src/handlers/incident.rs
//
// Incident handlers: Submit, Get.
// Submitting an incident inserts it into the incident collection, which fires
// the change feed and lets the watcher generate its RCA.

use serde::{Deserialize, Serialize};

use rca_core::{Incident, IncidentStore, RcaError};

// ---------------------------------------------------------------------------
// SubmitIncident
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitIncidentRequest {
    /// Raw incident document `{_id?, description?, tags?}`.
    pub document: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitIncidentResponse {
    pub incident_id: String,
}

pub async fn handle_submit_incident(
    incidents: &dyn IncidentStore,
    request: SubmitIncidentRequest,
) -> Result<SubmitIncidentResponse, String> {
    match incidents.insert_incident(request.document).await {
        Ok(incident_id) => {
            tracing::info!("Incident {} submitted", incident_id);
            Ok(SubmitIncidentResponse { incident_id })
        }
        Err(e @ (RcaError::InvalidDocument(_) | RcaError::InvalidState(_))) => Err(e.to_string()),
        Err(e) => {
            tracing::error!("incident/submit failed: {}", e);
            Err("Error storing incident".to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// GetIncident
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetIncidentRequest {
    pub incident_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetIncidentResponse {
    pub found: bool,
    pub incident: Option<Incident>,
}

pub async fn handle_get_incident(
    incidents: &dyn IncidentStore,
    request: GetIncidentRequest,
) -> Result<GetIncidentResponse, String> {
    let incident_id = super::incident_id(&request.incident_id)?;
    let incident = incidents
        .get_incident(incident_id)
        .await
        .map_err(|e| {
            tracing::error!("incident/get failed for {}: {}", incident_id, e);
            "Error reading incident".to_string()
        })?;
    Ok(GetIncidentResponse {
        found: incident.is_some(),
        incident,
    })
}
