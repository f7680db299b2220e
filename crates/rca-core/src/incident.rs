// crates/rca-core/src/incident.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RcaError;

/// An operational incident as read from the incident collection.
///
/// Incidents are produced elsewhere; this service only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Opaque identifier, always a plain string once loaded.
    pub id: String,
    /// Free-text description. Empty when the document has none.
    pub description: String,
    /// Ordered tags. Empty when the document has none.
    pub tags: Vec<String>,
}

impl Incident {
    /// Read an incident out of a raw document `{_id, description, tags[]}`.
    ///
    /// Missing or null `description`/`tags` read as empty values. Non-string
    /// tag entries are skipped. Only a missing or unusable `_id` is an error.
    pub fn from_document(document: &Value) -> Result<Self, RcaError> {
        let obj = document.as_object().ok_or_else(|| {
            RcaError::InvalidDocument("incident document is not an object".to_string())
        })?;

        let id = obj.get("_id").and_then(document_id).ok_or_else(|| {
            RcaError::InvalidDocument("incident document has no usable _id".to_string())
        })?;

        let description = obj
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let tags = match obj.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            id,
            description,
            tags,
        })
    }

    /// Render the incident back into document form.
    pub fn to_document(&self) -> Value {
        serde_json::json!({
            "_id": self.id,
            "description": self.description,
            "tags": self.tags,
        })
    }
}

/// Normalize a document `_id` value to a plain string.
///
/// Accepts strings, numbers, and extended-JSON object ids (`{"$oid": "..."}`).
pub fn document_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("$oid")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
