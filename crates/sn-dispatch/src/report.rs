//! Delivery Outcome Recorder
//!
//! Classification is pure; [`DeliveryReport::log`] is the only place that
//! writes diagnostics. Tokens are credentials, so only a short prefix ever
//! reaches the logs.

use sn_common::BatchResponse;
use tracing::{info, warn};

const TOKEN_PREFIX_LEN: usize = 20;

pub fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(TOKEN_PREFIX_LEN).collect();
    format!("{}...", prefix)
}

/// One token the provider did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenFailure {
    pub index: usize,
    pub token_prefix: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<TokenFailure>,
}

impl DeliveryReport {
    /// Pair each requested token with its result by position.
    ///
    /// A token the provider returned no result for counts as failed.
    pub fn from_response(tokens: &[String], response: &BatchResponse) -> Self {
        let mut report = Self::default();

        for (index, token) in tokens.iter().enumerate() {
            let reason = match response.results.get(index) {
                Some(result) => match &result.error {
                    None => {
                        report.success_count += 1;
                        continue;
                    }
                    Some(error) => error.clone(),
                },
                None => "No result returned".to_string(),
            };

            report.failure_count += 1;
            report.failures.push(TokenFailure {
                index,
                token_prefix: redact_token(token),
                reason,
            });
        }

        report
    }

    pub fn log(&self, event_id: &str) {
        info!(
            event_id = %event_id,
            success = self.success_count,
            failed = self.failure_count,
            "Push batch delivered"
        );

        for failure in &self.failures {
            warn!(
                event_id = %event_id,
                index = failure.index,
                token = %failure.token_prefix,
                "Failed to send to token {}: {}",
                failure.index,
                failure.reason
            );
        }
    }
}
