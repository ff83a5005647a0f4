use crate::checkpoint::CheckpointStore;
use crate::{InsertHandler, StreamConfig, StreamWatcher};
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::StreamExt;
use mongodb::bson::{doc, Document};
use mongodb::change_stream::event::{ChangeStreamEvent, OperationType, ResumeToken};
use mongodb::change_stream::ChangeStream;
use mongodb::{Client, Collection};
use sn_dispatch::mongo::{document_id, to_json};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

const INITIAL_BACKOFF_MS: u64 = 5000;
const MAX_BACKOFF_MS: u64 = 60000;
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Exponential reconnect delay, reset once a stream opens.
#[derive(Debug, Clone)]
struct Backoff {
    current_ms: u64,
    failures: u32,
}

impl Backoff {
    fn new() -> Self {
        Self {
            current_ms: INITIAL_BACKOFF_MS,
            failures: 0,
        }
    }

    fn reset(&mut self) {
        self.current_ms = INITIAL_BACKOFF_MS;
        self.failures = 0;
    }

    /// Returns the delay to wait now and grows the next one.
    fn next_delay(&mut self) -> Duration {
        self.failures += 1;
        let delay = Duration::from_millis(self.current_ms);
        let grown = (self.current_ms as f64 * BACKOFF_MULTIPLIER) as u64;
        self.current_ms = grown.min(MAX_BACKOFF_MS);
        delay
    }
}

pub struct MongoStreamWatcher {
    client: Client,
    config: StreamConfig,
    checkpoint_store: Arc<dyn CheckpointStore>,
    handler: Arc<dyn InsertHandler>,
}

impl MongoStreamWatcher {
    pub fn new(
        client: Client,
        config: StreamConfig,
        checkpoint_store: Arc<dyn CheckpointStore>,
        handler: Arc<dyn InsertHandler>,
    ) -> Self {
        Self {
            client,
            config,
            checkpoint_store,
            handler,
        }
    }

    async fn open_stream(
        &self,
        collection: &Collection<Document>,
        checkpoint_key: &str,
    ) -> mongodb::error::Result<ChangeStream<ChangeStreamEvent<Document>>> {
        let resume_token = match self.checkpoint_store.get_checkpoint(checkpoint_key).await {
            Ok(Some(doc)) => match mongodb::bson::from_document::<ResumeToken>(doc) {
                Ok(token) => Some(token),
                Err(e) => {
                    warn!("[{}] Ignoring unreadable checkpoint: {}", self.config.name, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("[{}] Failed to load checkpoint, starting from current: {}", self.config.name, e);
                None
            }
        };

        let pipeline = vec![
            doc! { "$match": { "operationType": { "$in": &self.config.watch_operations } } },
        ];

        let mut watch = collection.watch().pipeline(pipeline);
        match resume_token {
            Some(token) => {
                info!("[{}] Resuming from checkpoint", self.config.name);
                watch = watch.resume_after(token);
            }
            None => info!("[{}] Starting from current position (no checkpoint)", self.config.name),
        }

        watch.await
    }

    async fn clear_stale_checkpoint(&self, checkpoint_key: &str) {
        error!(
            "[{}] Resume token expired - clearing checkpoint. Notifications inserted meanwhile will not be pushed.",
            self.config.name
        );
        if let Err(e) = self.checkpoint_store.clear_checkpoint(checkpoint_key).await {
            warn!("[{}] Failed to clear checkpoint: {}", self.config.name, e);
        }
    }

    /// Consume events until the stream errors or closes.
    async fn process_stream_events(
        &self,
        stream: &mut ChangeStream<ChangeStreamEvent<Document>>,
        checkpoint_key: &str,
    ) -> Result<()> {
        loop {
            match stream.next().await {
                Some(Ok(event)) => {
                    self.handle_event(event).await;

                    if let Some(token) = stream.resume_token() {
                        let token_doc = mongodb::bson::to_document(&token)?;
                        self.checkpoint_store.save_checkpoint(checkpoint_key, token_doc).await?;
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => return Err(anyhow::anyhow!("Change stream closed unexpectedly")),
            }
        }
    }

    async fn handle_event(&self, event: ChangeStreamEvent<Document>) {
        if !matches!(event.operation_type, OperationType::Insert) {
            debug!("[{}] Ignoring {:?} event", self.config.name, event.operation_type);
            return;
        }

        let Some(document) = event.full_document else {
            warn!("[{}] Insert event without a full document", self.config.name);
            return;
        };

        let id = document_id(&document).or_else(|| event.document_key.as_ref().and_then(document_id));
        let Some(id) = id else {
            warn!("[{}] Inserted document has no usable _id", self.config.name);
            return;
        };

        debug!("[{}] New notification {}", self.config.name, id);
        let payload = to_json(document);
        self.handler.on_insert(&id, &payload).await;
    }
}

#[async_trait]
impl StreamWatcher for MongoStreamWatcher {
    /// Watch the collection, reconnecting with exponential backoff.
    ///
    /// An expired resume token clears the checkpoint and the stream restarts
    /// from the current position.
    async fn watch(&self) -> Result<()> {
        let db = self.client.database(&self.config.source_database);
        let collection: Collection<Document> = db.collection(&self.config.source_collection);
        let checkpoint_key = self.config.checkpoint_key();
        let mut backoff = Backoff::new();

        loop {
            let mut stream = match self.open_stream(&collection, &checkpoint_key).await {
                Ok(s) => {
                    backoff.reset();
                    info!(
                        "[{}] Change stream opened on {}.{}",
                        self.config.name, self.config.source_database, self.config.source_collection
                    );
                    s
                }
                Err(e) => {
                    if is_stale_resume_token_error(&e) {
                        self.clear_stale_checkpoint(&checkpoint_key).await;
                        backoff.reset();
                        continue;
                    }

                    let delay = backoff.next_delay();
                    error!(
                        "[{}] Failed to open change stream (attempt {}), retrying in {}ms: {}",
                        self.config.name,
                        backoff.failures,
                        delay.as_millis(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };

            if let Err(e) = self.process_stream_events(&mut stream, &checkpoint_key).await {
                if is_stale_resume_token_error(&e) {
                    self.clear_stale_checkpoint(&checkpoint_key).await;
                    backoff.reset();
                    continue;
                }

                let delay = backoff.next_delay();
                warn!(
                    "[{}] Change stream error (attempt {}), reconnecting in {}ms: {}",
                    self.config.name,
                    backoff.failures,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn is_stale_resume_token_error<E: std::fmt::Display>(e: &E) -> bool {
    let err_str = e.to_string().to_lowercase();
    (err_str.contains("changestream") && err_str.contains("history"))
        || err_str.contains("resume token")
        || err_str.contains("oplog")
        || err_str.contains("invalidate")
}
