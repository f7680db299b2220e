// crates/rca-store/src/document.rs
//
// Incident document preparation shared by both store backends.

use rca_core::incident::document_id;
use rca_core::RcaError;
use serde_json::Value;
use uuid::Uuid;

/// Validate an incoming incident document and settle its `_id`.
///
/// A present `_id` is normalized to a plain string (extended-JSON object ids
/// are unwrapped); an absent one is generated as a UUID v7. Returns the id and
/// the document as it will be stored.
pub fn prepare_incident(mut document: Value) -> Result<(String, Value), RcaError> {
    let obj = document.as_object_mut().ok_or_else(|| {
        RcaError::InvalidDocument("incident document must be a JSON object".to_string())
    })?;

    let id = match obj.get("_id") {
        None | Some(Value::Null) => Uuid::now_v7().to_string(),
        Some(value) => document_id(value).ok_or_else(|| {
            RcaError::InvalidDocument(format!("unsupported _id value: {}", value))
        })?,
    };
    obj.insert("_id".to_string(), Value::String(id.clone()));

    Ok((id, document))
}

/// Key for an incident document: `incident:{id}`.
pub fn incident_key(id: &str) -> Vec<u8> {
    format!("incident:{}", id).into_bytes()
}

/// Key for a report: `rca:{incident_id}`.
pub fn report_key(incident_id: &str) -> Vec<u8> {
    format!("rca:{}", incident_id).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generates_missing_id() {
        let (id, doc) = prepare_incident(json!({"description": "x"})).unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(doc["_id"], id.as_str());
        assert_eq!(doc["description"], "x");
    }

    #[test]
    fn unwraps_object_ids() {
        let (id, doc) =
            prepare_incident(json!({"_id": {"$oid": "65f1c0ffee"}, "tags": []})).unwrap();
        assert_eq!(id, "65f1c0ffee");
        assert_eq!(doc["_id"], "65f1c0ffee");
    }

    #[test]
    fn rejects_non_objects_and_bad_ids() {
        assert!(matches!(
            prepare_incident(json!(["not", "an", "object"])),
            Err(RcaError::InvalidDocument(_))
        ));
        assert!(matches!(
            prepare_incident(json!({"_id": true})),
            Err(RcaError::InvalidDocument(_))
        ));
    }

    #[test]
    fn key_layout() {
        assert_eq!(incident_key("inc-1"), b"incident:inc-1".to_vec());
        assert_eq!(report_key("inc-1"), b"rca:inc-1".to_vec());
    }
}
