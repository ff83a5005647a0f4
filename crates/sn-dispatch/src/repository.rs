use anyhow::Result;
use async_trait::async_trait;
use sn_common::AdminRecord;

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<AdminRecord>>;

    /// Overwrite the admin's `fcmTokens` and stamp `lastTokenCleanup` server-side.
    async fn replace_tokens(&self, admin_id: &str, tokens: &[String]) -> Result<()>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Current stored state of the sent flag, which an insert snapshot cannot carry.
    async fn is_push_sent(&self, event_id: &str) -> Result<bool>;

    /// Set `pushNotificationSent` and a server timestamp on the event, once.
    async fn mark_push_sent(&self, event_id: &str) -> Result<()>;
}
