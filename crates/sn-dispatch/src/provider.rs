use anyhow::Result;
use async_trait::async_trait;
use sn_common::{BatchResponse, PushPayload};

/// Verdict of a dry-run send for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValidity {
    Valid,
    /// Rejected by the provider, with its reason.
    Invalid(String),
}

/// Push delivery provider.
#[async_trait]
pub trait PushProvider: Send + Sync {
    /// Send one payload to many tokens.
    ///
    /// Per-token rejections come back inside the response; an `Err` means the
    /// call as a whole failed and nothing can be said about any token.
    async fn send_batch(&self, tokens: &[String], payload: &PushPayload) -> Result<BatchResponse>;

    /// Dry-run send to a single token.
    ///
    /// A token rejection is `Ok(TokenValidity::Invalid)`. An `Err` is a failure
    /// of the call itself (credentials, transport) and says nothing about the token.
    async fn validate_token(&self, token: &str) -> Result<TokenValidity>;
}
