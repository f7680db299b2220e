// crates/rca-rpc/src/handlers/mod.rs
//
// Handler modules for all RPC endpoints.
// Each module defines request/response types and handler functions
// for a specific API group.

pub mod incident;
pub mod node;
pub mod rca;

/// Trimmed `incident_id` from a request; empty ids are rejected.
pub(crate) fn incident_id(raw: &str) -> Result<&str, String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err("incident_id must not be empty".to_string());
    }
    Ok(id)
}
