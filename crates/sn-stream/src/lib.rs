//! Service Notify Stream
//!
//! Watches the notifications collection for inserts and hands each new
//! document to an [`InsertHandler`], normally the [`NotificationDispatcher`].
//! The change stream position is checkpointed after every handled document.

pub mod checkpoint;
pub mod config;
pub mod watcher;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sn_dispatch::NotificationDispatcher;
use tracing::{info, warn};

pub use checkpoint::{CheckpointStore, MongoCheckpointStore};
pub use config::StreamConfig;
pub use watcher::MongoStreamWatcher;

#[async_trait]
pub trait StreamWatcher: Send + Sync {
    async fn watch(&self) -> Result<()>;
}

/// Receives documents inserted into the watched collection.
#[async_trait]
pub trait InsertHandler: Send + Sync {
    async fn on_insert(&self, id: &str, document: &Value);
}

#[async_trait]
impl InsertHandler for NotificationDispatcher {
    async fn on_insert(&self, id: &str, document: &Value) {
        let outcome = self.handle_created(id, document).await;
        let summary = serde_json::to_string(&outcome).unwrap_or_default();

        if outcome.is_success() {
            info!("[{}] Dispatch result: {}", id, summary);
        } else {
            warn!("[{}] Dispatch result: {}", id, summary);
        }
    }
}
