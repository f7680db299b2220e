// crates/rca-rpc/src/handlers/node.rs
//
// Node health handler.

use serde::{Deserialize, Serialize};

use rca_pipeline::WatcherState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHealthResponse {
    /// "healthy", or "degraded" when the watcher has stopped.
    pub status: String,
    pub version: String,
    /// Name of the configured provider.
    pub provider: String,
    pub uptime_secs: u64,
    /// Watcher state, absent when the watcher is disabled.
    pub watcher: Option<String>,
}

pub async fn handle_get_health(
    _request: GetHealthRequest,
    provider: &str,
    uptime_secs: u64,
    watcher: Option<WatcherState>,
) -> Result<GetHealthResponse, String> {
    let status = match watcher {
        Some(WatcherState::Cancelled) => "degraded",
        _ => "healthy",
    };

    Ok(GetHealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: provider.to_string(),
        uptime_secs,
        watcher: watcher.map(|s| s.to_string()),
    })
}
