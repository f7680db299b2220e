// crates/rca-cli/src/output.rs
//
// Output formatting utilities for the RCA CLI.
// Supports table and JSON output modes.

use rca_core::{RcaFields, RcaReport};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// One labelled value in a two-column table.
#[derive(Debug, Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    pub fn new(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

pub fn fields_rows(fields: &RcaFields) -> Vec<FieldRow> {
    vec![
        FieldRow::new("RCA Description", fields.rca_description.as_str()),
        FieldRow::new("Probable Causes", fields.probable_causes.as_str()),
        FieldRow::new("Impacts", fields.impacts.as_str()),
        FieldRow::new("Recommended Actions", fields.recommended_actions.as_str()),
    ]
}

/// Report metadata followed by the generated sections.
pub fn report_rows(report: &RcaReport) -> Vec<FieldRow> {
    let mut rows = vec![
        FieldRow::new("Incident", report.incident_id.as_str()),
        FieldRow::new("Report", report.id.as_str()),
        FieldRow::new("Status", report.status.to_string()),
        FieldRow::new("Provider", report.provider.clone().unwrap_or_default()),
        FieldRow::new("Tags", report.tags.join(", ")),
        FieldRow::new("Created", report.created_at.to_rfc3339()),
    ];
    rows.extend(fields_rows(&report.fields()));
    if let Some(root_cause) = &report.root_cause {
        rows.push(FieldRow::new("Root Cause", root_cause.as_str()));
    }
    rows
}

/// Print `value` as JSON, or the rows built from it as a table.
pub fn print<T: Serialize>(format: OutputFormat, value: &T, rows: impl FnOnce(&T) -> Vec<FieldRow>) {
    match format {
        OutputFormat::Json => println!("{}", format_json(value)),
        OutputFormat::Table => println!("{}", format_table(&rows(value))),
    }
}
