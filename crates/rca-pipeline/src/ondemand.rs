// crates/rca-pipeline/src/ondemand.rs
//
// Synchronous per-request generation, used by the `rca/generate` API.

use rca_core::{IncidentStore, RcaError, RcaReport};

use crate::gate::RcaGate;

/// Message shown to API callers when generation fails for any reason other
/// than a missing incident. Provider detail stays in the logs.
pub const GENERIC_FAILURE: &str = "Error generating RCA";

/// Return the report for `incident_id`, generating it if needed.
///
/// With `regenerate` set, a fresh report replaces the stored one.
pub async fn generate_for_incident(
    gate: &RcaGate,
    incidents: &dyn IncidentStore,
    incident_id: &str,
    regenerate: bool,
) -> Result<RcaReport, RcaError> {
    let loader = || incidents.get_incident(incident_id);
    if regenerate {
        gate.regenerate(incident_id, loader).await
    } else {
        Ok(gate.ensure_generated(incident_id, loader).await?.into_report())
    }
}

/// The error text an API caller is allowed to see.
pub fn client_message(err: &RcaError) -> String {
    match err {
        RcaError::NotFound(msg) => msg.clone(),
        _ => GENERIC_FAILURE.to_string(),
    }
}
