// crates/rca-rpc/src/handlers/rca.rs
//
// RCA handlers: Generate, Get, Close.
// Generation goes through the shared gate; callers never see provider detail.

use serde::{Deserialize, Serialize};

use rca_core::{IncidentStore, RcaError, RcaFields, RcaReport};
use rca_pipeline::{client_message, generate_for_incident, RcaGate};

use super::incident_id as required_id;

// ---------------------------------------------------------------------------
// GenerateRca
// ---------------------------------------------------------------------------

/// Request to generate (or fetch) the RCA for an incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRcaRequest {
    pub incident_id: String,
    /// Replace an existing report with a fresh generation.
    #[serde(default)]
    pub regenerate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRcaResponse {
    pub incident_id: String,
    pub rca: RcaFields,
}

/// Handle a GenerateRca request.
///
/// Returns the stored report when one exists, otherwise generates, stores
/// and returns a new one. Errors are "Incident not found: {id}" or the
/// generic "Error generating RCA".
pub async fn handle_generate_rca(
    gate: &RcaGate,
    incidents: &dyn IncidentStore,
    request: GenerateRcaRequest,
) -> Result<GenerateRcaResponse, String> {
    let incident_id = required_id(&request.incident_id)?;

    match generate_for_incident(gate, incidents, incident_id, request.regenerate).await {
        Ok(report) => Ok(GenerateRcaResponse {
            incident_id: report.incident_id.clone(),
            rca: report.fields(),
        }),
        Err(e) => {
            tracing::error!("rca/generate failed for incident {}: {}", incident_id, e);
            Err(client_message(&e))
        }
    }
}

// ---------------------------------------------------------------------------
// GetRca
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRcaRequest {
    pub incident_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRcaResponse {
    pub found: bool,
    pub report: Option<RcaReport>,
}

/// Handle a GetRca request. Never generates.
pub async fn handle_get_rca(gate: &RcaGate, request: GetRcaRequest) -> Result<GetRcaResponse, String> {
    let incident_id = required_id(&request.incident_id)?;
    let report = gate.find(incident_id).await.map_err(|e| {
        tracing::error!("rca/get failed for incident {}: {}", incident_id, e);
        "Error reading RCA".to_string()
    })?;
    Ok(GetRcaResponse {
        found: report.is_some(),
        report,
    })
}

// ---------------------------------------------------------------------------
// CloseRca
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseRcaRequest {
    pub incident_id: String,
    /// Confirmed root cause recorded on the report.
    pub root_cause: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseRcaResponse {
    pub report: RcaReport,
}

/// Handle a CloseRca request.
pub async fn handle_close_rca(
    gate: &RcaGate,
    request: CloseRcaRequest,
) -> Result<CloseRcaResponse, String> {
    let incident_id = required_id(&request.incident_id)?;
    if request.root_cause.trim().is_empty() {
        return Err("root_cause must not be empty".to_string());
    }

    match gate.close(incident_id, request.root_cause.trim()).await {
        Ok(report) => Ok(CloseRcaResponse { report }),
        Err(RcaError::NotFound(msg)) => Err(msg),
        Err(e) => {
            tracing::error!("rca/close failed for incident {}: {}", incident_id, e);
            Err("Error closing RCA".to_string())
        }
    }
}
