//! Event Normalizer
//!
//! Applies defaults to the raw event fields and filters out event types that
//! admins are not notified about.

use sn_common::{EventRecord, NormalizedEvent, NotificationKind};

pub const DEFAULT_TITLE: &str = "Service Request Update";
pub const DEFAULT_MESSAGE: &str = "A service request has been updated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Supported(NormalizedEvent),
    /// Carries the raw type, if any, for the skip log line.
    Unsupported { kind: Option<String> },
}

pub fn normalize(record: &EventRecord) -> Normalized {
    let fields = record.fields();

    let Some(kind) = fields.kind.as_deref().and_then(NotificationKind::parse) else {
        return Normalized::Unsupported {
            kind: fields.kind.clone(),
        };
    };

    Normalized::Supported(NormalizedEvent {
        kind,
        sr_id: or_empty(&fields.sr_id),
        title: or_default(&fields.title, DEFAULT_TITLE),
        message: or_default(&fields.message, DEFAULT_MESSAGE),
        technician_name: or_empty(&fields.technician_name),
        customer_name: or_empty(&fields.customer_name),
        equipment_model: or_empty(&fields.equipment_model),
        location: or_empty(&fields.location),
    })
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

// Empty strings count as missing here.
fn or_default(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(doc: serde_json::Value) -> EventRecord {
        EventRecord::from_document("n1", &doc).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let normalized = normalize(&record(json!({ "data": { "type": "service_completed" } })));

        let Normalized::Supported(event) = normalized else {
            panic!("expected supported event");
        };
        assert_eq!(event.kind, NotificationKind::ServiceCompleted);
        assert_eq!(event.title, DEFAULT_TITLE);
        assert_eq!(event.message, DEFAULT_MESSAGE);
        assert_eq!(event.sr_id, "");
        assert_eq!(event.technician_name, "");
        assert_eq!(event.location, "");
    }

    #[test]
    fn test_empty_title_uses_default() {
        let normalized = normalize(&record(json!({ "type": "service_accepted", "title": "", "message": "m" })));

        let Normalized::Supported(event) = normalized else {
            panic!("expected supported event");
        };
        assert_eq!(event.title, DEFAULT_TITLE);
        assert_eq!(event.message, "m");
    }

    #[test]
    fn test_unsupported_types() {
        assert_eq!(
            normalize(&record(json!({ "type": "chat_message" }))),
            Normalized::Unsupported { kind: Some("chat_message".to_string()) }
        );
        assert_eq!(
            normalize(&record(json!({ "title": "no type" }))),
            Normalized::Unsupported { kind: None }
        );
    }

    #[test]
    fn test_flat_and_nested_normalize_identically() {
        let fields = json!({
            "type": "service_rejected",
            "srId": "SR9",
            "title": "Rejected",
            "message": "Technician rejected SR9",
            "technicianName": "Ana",
            "customerName": "Acme",
            "equipmentModel": "X-100",
            "location": "Plant 2"
        });

        let flat = normalize(&record(fields.clone()));
        let nested = normalize(&record(json!({ "data": fields })));
        assert_eq!(flat, nested);
    }
}
