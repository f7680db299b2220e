// crates/rca-cli/src/commands/status.rs
//
// `rca status` — daemon health, provider and watcher state.

use rca_rpc::handlers::node::{GetHealthRequest, GetHealthResponse};

use super::Context;
use crate::output::{self, FieldRow};
use crate::rpc_client;

pub async fn run(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let params = serde_json::to_value(GetHealthRequest {})?;
    let health: GetHealthResponse = rpc_client::call(&ctx.rpc, "node/health", params).await?;

    output::print(ctx.format, &health, |h| {
        vec![
            FieldRow::new("RPC endpoint", ctx.rpc.as_str()),
            FieldRow::new("Status", h.status.as_str()),
            FieldRow::new("Version", h.version.as_str()),
            FieldRow::new("Provider", h.provider.as_str()),
            FieldRow::new("Uptime", format!("{}s", h.uptime_secs)),
            FieldRow::new(
                "Watcher",
                h.watcher.clone().unwrap_or_else(|| "disabled".to_string()),
            ),
        ]
    });
    Ok(())
}
