//! Token Sanitizer
//!
//! Dry-run validates every `fcmTokens` entry of every admin and writes back
//! only the survivors. An admin whose tokens all validate is not written.
//! Token rejections are the expected case and are not errors. A failed admin
//! scan, a failed write-back, or a dry run that fails for reasons unrelated to
//! the token aborts the run.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use sn_common::CleanupOutcome;
use tracing::{debug, error, info};

use crate::provider::{PushProvider, TokenValidity};
use crate::report::redact_token;
use crate::repository::AdminRepository;

/// In-flight dry runs per admin unless configured otherwise.
pub const DEFAULT_VALIDATION_CONCURRENCY: usize = 16;

pub struct TokenSanitizer {
    admins: Arc<dyn AdminRepository>,
    provider: Arc<dyn PushProvider>,
    concurrency: usize,
}

impl TokenSanitizer {
    pub fn new(admins: Arc<dyn AdminRepository>, provider: Arc<dyn PushProvider>) -> Self {
        Self {
            admins,
            provider,
            concurrency: DEFAULT_VALIDATION_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self) -> CleanupOutcome {
        match self.clean_all().await {
            Ok(cleaned_tokens) => {
                info!(cleaned_tokens, "Token cleanup complete");
                CleanupOutcome::Completed { cleaned_tokens }
            }
            Err(e) => {
                error!("Error cleaning up tokens: {:#}", e);
                CleanupOutcome::Failed {
                    error: format!("{:#}", e),
                }
            }
        }
    }

    async fn clean_all(&self) -> Result<usize> {
        let admins = self.admins.find_all().await.context("Failed to load admins")?;
        let mut cleaned = 0;

        for admin in &admins {
            let tokens = admin.registered_tokens();
            if tokens.is_empty() {
                continue;
            }

            let valid = self
                .validate_tokens(tokens)
                .await
                .with_context(|| format!("Failed to validate tokens for admin {}", admin.id))?;
            if valid.len() == tokens.len() {
                debug!("[{}] All {} tokens valid", admin.id, tokens.len());
                continue;
            }

            self.admins
                .replace_tokens(&admin.id, &valid)
                .await
                .with_context(|| format!("Failed to update tokens for admin {}", admin.id))?;

            let removed = tokens.len() - valid.len();
            info!("[{}] Removed {} invalid tokens, {} remain", admin.id, removed, valid.len());
            cleaned += removed;
        }

        Ok(cleaned)
    }

    /// Validate tokens with bounded concurrency, keeping the survivors in input order.
    async fn validate_tokens(&self, tokens: &[String]) -> Result<Vec<String>> {
        let checks: Vec<_> = tokens
            .iter()
            .map(|token| self.provider.validate_token(token))
            .collect();
        let verdicts: Vec<Result<TokenValidity>> =
            stream::iter(checks).buffered(self.concurrency).collect().await;

        let mut valid = Vec::with_capacity(tokens.len());
        for (token, verdict) in tokens.iter().zip(verdicts) {
            match verdict? {
                TokenValidity::Valid => valid.push(token.clone()),
                TokenValidity::Invalid(reason) => {
                    info!("Invalid token removed: {} ({})", redact_token(token), reason);
                }
            }
        }

        Ok(valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryAdminRepository, InMemoryPushProvider};
    use sn_common::{AdminEndpoints, AdminRecord};
    use std::time::SystemTime;

    fn sanitizer(
        admins: Vec<AdminRecord>,
    ) -> (TokenSanitizer, Arc<InMemoryAdminRepository>, Arc<InMemoryPushProvider>) {
        let repo = Arc::new(InMemoryAdminRepository::new(admins));
        let provider = Arc::new(InMemoryPushProvider::new());
        (TokenSanitizer::new(repo.clone(), provider.clone()), repo, provider)
    }

    #[tokio::test]
    async fn test_invalid_token_dropped_and_written_back() {
        let (sanitizer, repo, provider) = sanitizer(vec![
            AdminRecord::with_tokens("admin-1", ["a", "b", "c"]),
            AdminRecord::with_tokens("admin-2", ["d"]),
        ]);
        provider.reject_token("b");

        let started = SystemTime::now();
        let outcome = sanitizer.run().await;
        let finished = SystemTime::now();

        assert_eq!(outcome, CleanupOutcome::Completed { cleaned_tokens: 1 });
        let writes = repo.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].admin_id, "admin-1");
        assert_eq!(writes[0].tokens, vec!["a", "c"]);
        assert!(writes[0].cleaned_at >= started && writes[0].cleaned_at <= finished);
        assert_eq!(repo.admins()[0].registered_tokens(), &["a".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_all_valid_means_no_write() {
        let (sanitizer, repo, provider) = sanitizer(vec![AdminRecord::with_tokens("admin-1", ["a", "b"])]);

        let outcome = sanitizer.run().await;

        assert_eq!(outcome, CleanupOutcome::Completed { cleaned_tokens: 0 });
        assert!(repo.writes().is_empty());
        assert_eq!(provider.validations(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_zero_admins() {
        let (sanitizer, _repo, _provider) = sanitizer(Vec::new());

        let outcome = sanitizer.run().await;

        assert_eq!(outcome, CleanupOutcome::Completed { cleaned_tokens: 0 });
        assert_eq!(outcome.message().as_deref(), Some("Cleaned up 0 invalid tokens"));
    }

    #[tokio::test]
    async fn test_counts_accumulate_across_admins() {
        let (sanitizer, repo, provider) = sanitizer(vec![
            AdminRecord::with_tokens("admin-1", ["x1", "ok1"]),
            AdminRecord::with_tokens("admin-2", ["x2", "x3"]),
        ]);
        for token in ["x1", "x2", "x3"] {
            provider.reject_token(token);
        }

        let outcome = sanitizer.run().await;

        assert_eq!(outcome, CleanupOutcome::Completed { cleaned_tokens: 3 });
        let writes = repo.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[1].tokens.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_single_token_not_touched() {
        let (sanitizer, repo, provider) = sanitizer(vec![AdminRecord::new(
            "admin-1",
            AdminEndpoints::Single("legacy".to_string()),
        )]);
        provider.reject_token("legacy");

        let outcome = sanitizer.run().await;

        assert_eq!(outcome, CleanupOutcome::Completed { cleaned_tokens: 0 });
        assert!(provider.validations().is_empty());
        assert!(repo.writes().is_empty());
    }

    #[tokio::test]
    async fn test_scan_failure_aborts() {
        let (sanitizer, repo, _provider) = sanitizer(Vec::new());
        repo.fail_scans("not primary");

        match sanitizer.run().await {
            CleanupOutcome::Failed { error } => assert!(error.contains("not primary")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_failure_aborts() {
        let (sanitizer, repo, provider) = sanitizer(vec![AdminRecord::with_tokens("admin-1", ["a", "b"])]);
        provider.reject_token("a");
        repo.fail_writes("document too large");

        let outcome = sanitizer.run().await;

        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_provider_call_failure_aborts_without_writing() {
        let (sanitizer, repo, provider) =
            sanitizer(vec![AdminRecord::with_tokens("admin-1", ["good1", "good2", "good3"])]);
        provider.fail_validations("FCM authentication failed");

        match sanitizer.run().await {
            CleanupOutcome::Failed { error } => {
                assert!(error.contains("admin-1"));
                assert!(error.contains("FCM authentication failed"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(repo.writes().is_empty());
        assert_eq!(repo.admins()[0].registered_tokens().len(), 3);
    }

    #[tokio::test]
    async fn test_bounded_concurrency_keeps_order() {
        let (sanitizer, repo, provider) = sanitizer(vec![AdminRecord::with_tokens(
            "admin-1",
            ["t1", "t2", "t3", "t4", "t5"],
        )]);
        let sanitizer = sanitizer.with_concurrency(2);
        provider.reject_token("t2");
        provider.reject_token("t4");

        let outcome = sanitizer.run().await;

        assert_eq!(outcome, CleanupOutcome::Completed { cleaned_tokens: 2 });
        assert_eq!(repo.writes()[0].tokens, vec!["t1", "t3", "t5"]);
    }
}
