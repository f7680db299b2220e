// crates/rca-cli/src/commands/report.rs
//
// `rca report {get, close}` — stored report commands.

use clap::Subcommand;
use rca_rpc::handlers::rca::{CloseRcaRequest, CloseRcaResponse, GetRcaRequest, GetRcaResponse};

use super::Context;
use crate::output;
use crate::rpc_client;

#[derive(Debug, Subcommand)]
pub enum ReportCmd {
    /// Show the stored report for an incident.
    Get {
        #[arg(long)]
        incident_id: String,
    },
    /// Record the confirmed root cause and close the report.
    Close {
        #[arg(long)]
        incident_id: String,
        #[arg(long)]
        root_cause: String,
    },
}

pub async fn run(ctx: &Context, cmd: &ReportCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ReportCmd::Get { incident_id } => {
            let params = serde_json::to_value(GetRcaRequest {
                incident_id: incident_id.clone(),
            })?;
            let response: GetRcaResponse = rpc_client::call(&ctx.rpc, "rca/get", params).await?;
            match (&response.report, ctx.format) {
                (None, output::OutputFormat::Table) => {
                    println!("No RCA found for incident {}", incident_id);
                }
                _ => output::print(ctx.format, &response, |r| {
                    r.report.as_ref().map(output::report_rows).unwrap_or_default()
                }),
            }
        }
        ReportCmd::Close {
            incident_id,
            root_cause,
        } => {
            let params = serde_json::to_value(CloseRcaRequest {
                incident_id: incident_id.clone(),
                root_cause: root_cause.clone(),
            })?;
            let response: CloseRcaResponse = rpc_client::call(&ctx.rpc, "rca/close", params).await?;
            output::print(ctx.format, &response, |r| output::report_rows(&r.report));
        }
    }

    Ok(())
}
