//! In-memory capability implementations.
//!
//! Used for local runs and tests. Each type records the calls made against it
//! and can be told to fail, so orchestrator behaviour can be checked without a
//! database or a push provider.

use std::collections::HashSet;
use std::time::SystemTime;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use sn_common::{AdminEndpoints, AdminRecord, BatchResponse, PushPayload, TokenResult};

use crate::provider::{PushProvider, TokenValidity};
use crate::repository::{AdminRepository, EventRepository};

/// A `replace_tokens` call as seen by the repository.
#[derive(Debug, Clone)]
pub struct TokenWrite {
    pub admin_id: String,
    pub tokens: Vec<String>,
    pub cleaned_at: SystemTime,
}

#[derive(Default)]
pub struct InMemoryAdminRepository {
    admins: Mutex<Vec<AdminRecord>>,
    writes: Mutex<Vec<TokenWrite>>,
    scan_error: Mutex<Option<String>>,
    write_error: Mutex<Option<String>>,
}

impl InMemoryAdminRepository {
    pub fn new(admins: Vec<AdminRecord>) -> Self {
        Self {
            admins: Mutex::new(admins),
            ..Default::default()
        }
    }

    pub fn admins(&self) -> Vec<AdminRecord> {
        self.admins.lock().clone()
    }

    pub fn writes(&self) -> Vec<TokenWrite> {
        self.writes.lock().clone()
    }

    pub fn fail_scans(&self, message: impl Into<String>) {
        *self.scan_error.lock() = Some(message.into());
    }

    pub fn fail_writes(&self, message: impl Into<String>) {
        *self.write_error.lock() = Some(message.into());
    }
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepository {
    async fn find_all(&self) -> Result<Vec<AdminRecord>> {
        if let Some(message) = self.scan_error.lock().clone() {
            return Err(anyhow!(message));
        }
        Ok(self.admins.lock().clone())
    }

    async fn replace_tokens(&self, admin_id: &str, tokens: &[String]) -> Result<()> {
        if let Some(message) = self.write_error.lock().clone() {
            return Err(anyhow!(message));
        }

        let mut admins = self.admins.lock();
        let admin = admins
            .iter_mut()
            .find(|a| a.id == admin_id)
            .ok_or_else(|| anyhow!("Admin not found: {}", admin_id))?;
        admin.endpoints = AdminEndpoints::Many(tokens.to_vec());

        self.writes.lock().push(TokenWrite {
            admin_id: admin_id.to_string(),
            tokens: tokens.to_vec(),
            cleaned_at: SystemTime::now(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryEventRepository {
    sent: Mutex<Vec<String>>,
    error: Mutex<Option<String>>,
    read_error: Mutex<Option<String>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Event ids marked as sent, in marking order.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn fail_updates(&self, message: impl Into<String>) {
        *self.error.lock() = Some(message.into());
    }

    pub fn fail_reads(&self, message: impl Into<String>) {
        *self.read_error.lock() = Some(message.into());
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn is_push_sent(&self, event_id: &str) -> Result<bool> {
        if let Some(message) = self.read_error.lock().clone() {
            return Err(anyhow!(message));
        }
        Ok(self.sent.lock().iter().any(|id| id == event_id))
    }

    async fn mark_push_sent(&self, event_id: &str) -> Result<()> {
        if let Some(message) = self.error.lock().clone() {
            return Err(anyhow!(message));
        }

        let mut sent = self.sent.lock();
        if !sent.iter().any(|id| id == event_id) {
            sent.push(event_id.to_string());
        }
        Ok(())
    }
}

/// A batch send as seen by the provider.
#[derive(Debug, Clone)]
pub struct SentBatch {
    pub tokens: Vec<String>,
    pub payload: PushPayload,
}

/// Provider that accepts every token except the ones marked as rejected.
#[derive(Default)]
pub struct InMemoryPushProvider {
    rejected: Mutex<HashSet<String>>,
    batch_error: Mutex<Option<String>>,
    validation_error: Mutex<Option<String>>,
    batches: Mutex<Vec<SentBatch>>,
    validations: Mutex<Vec<String>>,
}

impl InMemoryPushProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_token(&self, token: impl Into<String>) {
        self.rejected.lock().insert(token.into());
    }

    pub fn fail_batches(&self, message: impl Into<String>) {
        *self.batch_error.lock() = Some(message.into());
    }

    /// Make every dry run fail as a call-level error.
    pub fn fail_validations(&self, message: impl Into<String>) {
        *self.validation_error.lock() = Some(message.into());
    }

    pub fn batches(&self) -> Vec<SentBatch> {
        self.batches.lock().clone()
    }

    pub fn validations(&self) -> Vec<String> {
        self.validations.lock().clone()
    }
}

#[async_trait]
impl PushProvider for InMemoryPushProvider {
    async fn send_batch(&self, tokens: &[String], payload: &PushPayload) -> Result<BatchResponse> {
        if let Some(message) = self.batch_error.lock().clone() {
            return Err(anyhow!(message));
        }

        self.batches.lock().push(SentBatch {
            tokens: tokens.to_vec(),
            payload: payload.clone(),
        });

        let rejected = self.rejected.lock();
        let results = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| {
                if rejected.contains(token) {
                    TokenResult::failed("Requested entity was not found.")
                } else {
                    TokenResult::delivered(format!("projects/local/messages/{}", i))
                }
            })
            .collect();

        Ok(BatchResponse::new(results))
    }

    async fn validate_token(&self, token: &str) -> Result<TokenValidity> {
        if let Some(message) = self.validation_error.lock().clone() {
            return Err(anyhow!(message));
        }
        self.validations.lock().push(token.to_string());

        if self.rejected.lock().contains(token) {
            return Ok(TokenValidity::Invalid("Requested entity was not found.".to_string()));
        }
        Ok(TokenValidity::Valid)
    }
}
