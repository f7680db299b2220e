// crates/rca-cli/src/commands/mod.rs
//
// Command module declarations for the RCA CLI.

pub mod generate;
pub mod incident;
pub mod report;
pub mod status;

use crate::output::OutputFormat;

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub rpc: String,
    pub format: OutputFormat,
}
