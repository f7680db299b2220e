// crates/rca-cli/src/commands/incident.rs
//
// `rca incident {submit, get}` — incident commands.
//
// Submitting an incident stores it; a running watcher picks it up and
// generates the RCA in the background.

use clap::Subcommand;
use rca_rpc::handlers::incident::{
    GetIncidentRequest, GetIncidentResponse, SubmitIncidentRequest, SubmitIncidentResponse,
};
use serde_json::{json, Value};

use super::Context;
use crate::output::{self, FieldRow};
use crate::rpc_client;

#[derive(Debug, Subcommand)]
pub enum IncidentCmd {
    /// Store a new incident.
    Submit {
        /// What happened.
        #[arg(long)]
        description: String,
        /// Tag to attach; repeat for several.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Explicit identifier. The daemon assigns one when omitted.
        #[arg(long)]
        id: Option<String>,
    },
    /// Show a stored incident.
    Get {
        #[arg(long)]
        incident_id: String,
    },
}

pub async fn run(ctx: &Context, cmd: &IncidentCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        IncidentCmd::Submit {
            description,
            tags,
            id,
        } => {
            let params = serde_json::to_value(SubmitIncidentRequest {
                document: incident_document(description, tags, id.as_deref()),
            })?;
            let response: SubmitIncidentResponse =
                rpc_client::call(&ctx.rpc, "incident/submit", params).await?;
            output::print(ctx.format, &response, |r| {
                vec![FieldRow::new("Incident", r.incident_id.as_str())]
            });
        }
        IncidentCmd::Get { incident_id } => {
            let params = serde_json::to_value(GetIncidentRequest {
                incident_id: incident_id.clone(),
            })?;
            let response: GetIncidentResponse =
                rpc_client::call(&ctx.rpc, "incident/get", params).await?;
            match (&response.incident, ctx.format) {
                (None, output::OutputFormat::Table) => {
                    println!("Incident {} not found", incident_id);
                }
                _ => output::print(ctx.format, &response, |r| match &r.incident {
                    Some(incident) => vec![
                        FieldRow::new("Incident", incident.id.as_str()),
                        FieldRow::new("Description", incident.description.as_str()),
                        FieldRow::new("Tags", incident.tags.join(", ")),
                    ],
                    None => Vec::new(),
                }),
            }
        }
    }

    Ok(())
}

/// Raw incident document in the stored `{_id, description, tags}` shape.
fn incident_document(description: &str, tags: &[String], id: Option<&str>) -> Value {
    let mut document = json!({
        "description": description,
        "tags": tags,
    });
    if let (Some(id), Some(obj)) = (id, document.as_object_mut()) {
        obj.insert("_id".to_string(), Value::String(id.to_string()));
    }
    document
}
