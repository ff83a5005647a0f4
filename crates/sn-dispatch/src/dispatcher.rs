//! Notification Dispatcher
//!
//! Runs once per newly created notification document:
//! normalize → resolve recipients → build payload → send → record → mark sent.
//!
//! Already-sent events, unsupported types and an empty recipient list end the
//! run early as successful no-ops. The sent flag is checked both on the
//! incoming document and in the store. Any error before the event is marked is
//! turned into [`DispatchOutcome::Failed`]; the caller never sees an `Err`.
//! Per-token rejections do not stop the event from being marked, but a failed
//! batch call does.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use sn_common::{DispatchOutcome, EventRecord, SkipReason};
use tracing::{error, info, warn};

use crate::normalizer::{normalize, Normalized};
use crate::payload::build_payload;
use crate::provider::PushProvider;
use crate::recipients::resolve_recipients;
use crate::report::DeliveryReport;
use crate::repository::{AdminRepository, EventRepository};

pub struct NotificationDispatcher {
    admins: Arc<dyn AdminRepository>,
    events: Arc<dyn EventRepository>,
    provider: Arc<dyn PushProvider>,
}

impl NotificationDispatcher {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        events: Arc<dyn EventRepository>,
        provider: Arc<dyn PushProvider>,
    ) -> Self {
        Self {
            admins,
            events,
            provider,
        }
    }

    /// Handle a created notification document.
    pub async fn handle_created(&self, event_id: &str, document: &Value) -> DispatchOutcome {
        info!("[{}] Processing notification", event_id);

        match self.dispatch(event_id, document).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(event_id = %event_id, "Error sending push notification: {:#}", e);
                DispatchOutcome::failed(format!("{:#}", e))
            }
        }
    }

    async fn dispatch(&self, event_id: &str, document: &Value) -> Result<DispatchOutcome> {
        let record = EventRecord::from_document(event_id, document)?;

        if record.push_sent {
            info!("[{}] Push already sent, skipping", record.id);
            return Ok(DispatchOutcome::Skipped(SkipReason::AlreadySent));
        }

        let event = match normalize(&record) {
            Normalized::Supported(event) => event,
            Normalized::Unsupported { kind } => {
                info!(
                    "[{}] Skipping notification type: {}",
                    record.id,
                    kind.as_deref().unwrap_or("<none>")
                );
                return Ok(DispatchOutcome::Skipped(SkipReason::UnsupportedType));
            }
        };

        // A redelivered insert carries the original snapshot, so ask the store.
        let already_sent = self
            .events
            .is_push_sent(&record.id)
            .await
            .context("Failed to read notification state")?;
        if already_sent {
            info!("[{}] Push already recorded in store, skipping", record.id);
            return Ok(DispatchOutcome::Skipped(SkipReason::AlreadySent));
        }

        info!(
            "[{}] Processing {} notification for SR: {}",
            record.id,
            event.kind.as_str(),
            event.sr_id
        );

        let tokens = resolve_recipients(self.admins.as_ref())
            .await
            .context("Failed to load admin tokens")?;

        if tokens.is_empty() {
            warn!("[{}] No admin FCM tokens found", record.id);
            return Ok(DispatchOutcome::Skipped(SkipReason::NoRecipients));
        }

        info!("[{}] Found {} admin FCM tokens", record.id, tokens.len());

        let payload = build_payload(&event, &record.id);
        let response = self
            .provider
            .send_batch(&tokens, &payload)
            .await
            .context("Push batch send failed")?;

        DeliveryReport::from_response(&tokens, &response).log(&record.id);

        self.events
            .mark_push_sent(&record.id)
            .await
            .context("Failed to mark notification as sent")?;

        info!(event_id = %record.id, sent_to = tokens.len(), "Push notification sent");
        Ok(DispatchOutcome::Sent { sent_to: tokens.len() })
    }
}
