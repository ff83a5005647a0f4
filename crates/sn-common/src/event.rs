//! Event Records
//!
//! A notification document comes in two physical shapes. Newer writers put the
//! event fields under a nested `data` object; older writers put them at the top
//! level. [`EventRecord::from_document`] decides the shape once, so nothing past
//! the ingestion boundary has to look at the raw document again.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{NotifyError, Result};

/// Service request lifecycle events that warrant an admin push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ServiceAccepted,
    ServiceRejected,
    ServiceCompleted,
}

impl NotificationKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "service_accepted" => Some(Self::ServiceAccepted),
            "service_rejected" => Some(Self::ServiceRejected),
            "service_completed" => Some(Self::ServiceCompleted),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceAccepted => "service_accepted",
            Self::ServiceRejected => "service_rejected",
            Self::ServiceCompleted => "service_completed",
        }
    }
}

/// Event fields as written by the app, before defaults are applied.
///
/// Non-string values are read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sr_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub technician_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub equipment_model: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Which physical layout the event fields were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordShape {
    /// Fields live under a non-empty `data` object.
    Nested(EventFields),
    /// Legacy layout: fields live on the document itself.
    Flat(EventFields),
}

impl RecordShape {
    pub fn fields(&self) -> &EventFields {
        match self {
            Self::Nested(fields) | Self::Flat(fields) => fields,
        }
    }
}

/// A newly created notification document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: String,
    pub shape: RecordShape,
    /// Set once a push was attempted for this record.
    pub push_sent: bool,
}

impl EventRecord {
    pub fn from_document(id: impl Into<String>, document: &Value) -> Result<Self> {
        let id = id.into();
        let Value::Object(map) = document else {
            return Err(NotifyError::invalid_document(id, "expected an object"));
        };

        let shape = match map.get("data") {
            Some(data @ Value::Object(nested)) if !nested.is_empty() => {
                RecordShape::Nested(EventFields::deserialize(data)?)
            }
            _ => RecordShape::Flat(EventFields::deserialize(document)?),
        };

        let push_sent = map
            .get("data")
            .and_then(|data| data.get("pushNotificationSent"))
            .or_else(|| map.get("pushNotificationSent"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(Self { id, shape, push_sent })
    }

    pub fn fields(&self) -> &EventFields {
        self.shape.fields()
    }
}

/// Effective event fields after defaults; every field is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub kind: NotificationKind,
    pub sr_id: String,
    pub title: String,
    pub message: String,
    pub technician_name: String,
    pub customer_name: String,
    pub equipment_model: String,
    pub location: String,
}
