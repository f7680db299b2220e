// crates/rca-cli/src/commands/generate.rs
//
// `rca generate` — generate (or fetch the existing) RCA for an incident.

use clap::Args;
use rca_rpc::handlers::rca::{GenerateRcaRequest, GenerateRcaResponse};

use super::Context;
use crate::output;
use crate::rpc_client;

#[derive(Debug, Args)]
pub struct GenerateCmd {
    /// Identifier of the incident to analyse.
    #[arg(long)]
    pub incident_id: String,

    /// Replace an existing report with a freshly generated one.
    #[arg(long)]
    pub regenerate: bool,
}

pub async fn run(ctx: &Context, cmd: &GenerateCmd) -> Result<(), Box<dyn std::error::Error>> {
    let params = serde_json::to_value(GenerateRcaRequest {
        incident_id: cmd.incident_id.clone(),
        regenerate: cmd.regenerate,
    })?;
    let response: GenerateRcaResponse = rpc_client::call(&ctx.rpc, "rca/generate", params).await?;

    output::print(ctx.format, &response, |r| output::fields_rows(&r.rca));
    Ok(())
}
