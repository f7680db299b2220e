// crates/rca-cli/src/main.rs
//
// CLI entrypoint for the RCA daemon.
//
// Talks to a running rca-daemon over its JSON-RPC endpoint: submit incidents,
// generate and fetch RCAs, close reports, and check daemon health.

mod commands;
mod output;
mod rpc_client;

use clap::{Parser, Subcommand};
use commands::generate::GenerateCmd;
use commands::incident::IncidentCmd;
use commands::report::ReportCmd;
use commands::Context;
use output::OutputFormat;

/// RCA CLI: root cause analysis reports for incidents.
#[derive(Parser, Debug)]
#[command(name = "rca", version, about = "Operator CLI for the RCA generation daemon")]
struct Cli {
    /// RPC endpoint for the rca-daemon.
    #[arg(long, global = true, default_value = "http://localhost:50061")]
    rpc: String,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate (or fetch the existing) RCA for an incident.
    Generate(GenerateCmd),

    /// Stored reports: get, close.
    #[command(subcommand)]
    Report(ReportCmd),

    /// Incidents: submit, get.
    #[command(subcommand)]
    Incident(IncidentCmd),

    /// Daemon health, provider and watcher state.
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let ctx = Context {
        rpc: cli.rpc,
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        },
    };

    match &cli.command {
        Commands::Generate(cmd) => commands::generate::run(&ctx, cmd).await?,
        Commands::Report(cmd) => commands::report::run(&ctx, cmd).await?,
        Commands::Incident(cmd) => commands::incident::run(&ctx, cmd).await?,
        Commands::Status => commands::status::run(&ctx).await?,
    }

    Ok(())
}
