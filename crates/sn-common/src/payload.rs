//! Push Payloads and Delivery Results

use serde::{Deserialize, Serialize};

/// A platform-neutral push message, addressed to no token in particular.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub notification: NotificationContent,
    pub data: PushData,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

/// Portion shown by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub sound: String,
}

/// Portion handed to the receiving app. All keys are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushData {
    pub notification_id: String,
    pub sr_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub technician_name: String,
    pub customer_name: String,
    pub equipment_model: String,
    pub location: String,
    pub click_action: String,
}

impl PushData {
    /// Key/value view in wire order.
    pub fn entries(&self) -> [(&'static str, &str); 8] {
        [
            ("notificationId", self.notification_id.as_str()),
            ("srId", self.sr_id.as_str()),
            ("type", self.kind.as_str()),
            ("technicianName", self.technician_name.as_str()),
            ("customerName", self.customer_name.as_str()),
            ("equipmentModel", self.equipment_model.as_str()),
            ("location", self.location.as_str()),
            ("clickAction", self.click_action.as_str()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidConfig {
    pub priority: String,
    pub notification: AndroidNotification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidNotification {
    pub channel_id: String,
    pub priority: String,
    pub default_sound: bool,
    pub default_vibrate_timings: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aps {
    pub sound: String,
    pub badge: u32,
}

/// Provider verdict for one token of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TokenResult {
    pub fn delivered(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            message_id: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Provider response to a batch send, one result per token in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub results: Vec<TokenResult>,
}

impl BatchResponse {
    pub fn new(results: Vec<TokenResult>) -> Self {
        Self { results }
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }
}
