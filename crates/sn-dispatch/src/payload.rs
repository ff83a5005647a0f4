//! Payload Builder

use sn_common::{
    AndroidConfig, AndroidNotification, ApnsConfig, ApnsPayload, Aps, NormalizedEvent,
    NotificationContent, PushData, PushPayload,
};

/// Routes the tap to the app's notification handler.
pub const CLICK_ACTION: &str = "FLUTTER_NOTIFICATION_CLICK";
pub const ANDROID_CHANNEL_ID: &str = "service_requests";
pub const DEFAULT_SOUND: &str = "default";
const HIGH_PRIORITY: &str = "high";

pub fn build_payload(event: &NormalizedEvent, notification_id: &str) -> PushPayload {
    PushPayload {
        notification: NotificationContent {
            title: event.title.clone(),
            body: event.message.clone(),
            sound: DEFAULT_SOUND.to_string(),
        },
        data: PushData {
            notification_id: notification_id.to_string(),
            sr_id: event.sr_id.clone(),
            kind: event.kind.as_str().to_string(),
            technician_name: event.technician_name.clone(),
            customer_name: event.customer_name.clone(),
            equipment_model: event.equipment_model.clone(),
            location: event.location.clone(),
            click_action: CLICK_ACTION.to_string(),
        },
        android: AndroidConfig {
            priority: HIGH_PRIORITY.to_string(),
            notification: AndroidNotification {
                channel_id: ANDROID_CHANNEL_ID.to_string(),
                priority: HIGH_PRIORITY.to_string(),
                default_sound: true,
                default_vibrate_timings: true,
            },
        },
        apns: ApnsConfig {
            payload: ApnsPayload {
                aps: Aps {
                    sound: DEFAULT_SOUND.to_string(),
                    badge: 1,
                },
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{normalize, Normalized};
    use serde_json::json;
    use sn_common::EventRecord;

    fn normalized(doc: serde_json::Value) -> NormalizedEvent {
        match normalize(&EventRecord::from_document("n1", &doc).unwrap()) {
            Normalized::Supported(event) => event,
            other => panic!("expected supported event, got {:?}", other),
        }
    }

    #[test]
    fn test_field_mapping() {
        let event = normalized(json!({
            "data": {
                "type": "service_accepted",
                "srId": "SR1",
                "title": "X",
                "message": "Y",
                "technicianName": "Ana"
            }
        }));
        let payload = build_payload(&event, "notif-1");

        assert_eq!(payload.notification.title, "X");
        assert_eq!(payload.notification.body, "Y");
        assert_eq!(payload.notification.sound, "default");
        assert_eq!(payload.data.notification_id, "notif-1");
        assert_eq!(payload.data.sr_id, "SR1");
        assert_eq!(payload.data.kind, "service_accepted");
        assert_eq!(payload.data.technician_name, "Ana");
        assert_eq!(payload.data.click_action, CLICK_ACTION);
        assert_eq!(payload.android.priority, "high");
        assert_eq!(payload.android.notification.channel_id, "service_requests");
        assert!(payload.android.notification.default_sound);
        assert!(payload.android.notification.default_vibrate_timings);
        assert_eq!(payload.apns.payload.aps.badge, 1);
        assert_eq!(payload.apns.payload.aps.sound, "default");
    }

    #[test]
    fn test_data_keys_always_present_as_strings() {
        let event = normalized(json!({ "type": "service_completed" }));
        let payload = build_payload(&event, "notif-2");

        let data = serde_json::to_value(&payload.data).unwrap();
        let data = data.as_object().unwrap();
        for key in [
            "notificationId", "srId", "type", "technicianName",
            "customerName", "equipmentModel", "location", "clickAction",
        ] {
            assert!(data.get(key).map(|v| v.is_string()).unwrap_or(false), "missing {}", key);
        }
        assert_eq!(data.len(), 8);
    }

    #[test]
    fn test_legacy_and_nested_shapes_build_same_payload() {
        let fields = json!({
            "type": "service_completed",
            "srId": "SR7",
            "message": "Done",
            "customerName": "Acme",
            "equipmentModel": "Z9",
            "location": "Dock 4"
        });

        let flat = build_payload(&normalized(fields.clone()), "n");
        let nested = build_payload(&normalized(json!({ "data": fields })), "n");
        assert_eq!(flat, nested);
    }
}
