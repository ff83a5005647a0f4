//! Terminal Outcomes
//!
//! Both orchestrators swallow their errors and report one of these instead.
//! The serialized forms are what the host logs and what the cleanup endpoint
//! returns.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Why a dispatch ended early without contacting the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedType,
    AlreadySent,
    NoRecipients,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "unsupported_type",
            Self::AlreadySent => "already_sent",
            Self::NoRecipients => "no_recipients",
        }
    }
}

/// Result of one fan-out dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Push attempted and the event marked as sent.
    Sent { sent_to: usize },
    /// Routine no-op.
    Skipped(SkipReason),
    /// A step before marking failed; the event was left untouched.
    Failed { error: String },
}

impl DispatchOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl Serialize for DispatchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("success", &self.is_success())?;
        match self {
            Self::Sent { sent_to } => map.serialize_entry("sentTo", sent_to)?,
            Self::Skipped(reason) => map.serialize_entry("skipped", reason.as_str())?,
            Self::Failed { error } => map.serialize_entry("error", error)?,
        }
        map.end()
    }
}

/// Result of one token cleanup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Completed { cleaned_tokens: usize },
    Failed { error: String },
}

impl CleanupOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn message(&self) -> Option<String> {
        match self {
            Self::Completed { cleaned_tokens } => {
                Some(format!("Cleaned up {} invalid tokens", cleaned_tokens))
            }
            Self::Failed { .. } => None,
        }
    }
}

impl Serialize for CleanupOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Completed { cleaned_tokens } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("cleanedTokens", cleaned_tokens)?;
                map.serialize_entry("message", &self.message())?;
                map.end()
            }
            Self::Failed { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dispatch_outcome_json() {
        let sent = serde_json::to_value(DispatchOutcome::Sent { sent_to: 3 }).unwrap();
        assert_eq!(sent, json!({ "success": true, "sentTo": 3 }));

        let skipped = serde_json::to_value(DispatchOutcome::Skipped(SkipReason::NoRecipients)).unwrap();
        assert_eq!(skipped, json!({ "success": true, "skipped": "no_recipients" }));

        let failed = serde_json::to_value(DispatchOutcome::failed("boom")).unwrap();
        assert_eq!(failed, json!({ "success": false, "error": "boom" }));
    }

    #[test]
    fn test_cleanup_outcome_json() {
        let done = serde_json::to_value(CleanupOutcome::Completed { cleaned_tokens: 0 }).unwrap();
        assert_eq!(
            done,
            json!({ "success": true, "cleanedTokens": 0, "message": "Cleaned up 0 invalid tokens" })
        );

        let failed = CleanupOutcome::Failed { error: "scan failed".to_string() };
        assert!(!failed.is_success());
        assert_eq!(failed.message(), None);
        assert_eq!(
            serde_json::to_value(failed).unwrap(),
            json!({ "success": false, "error": "scan failed" })
        );
    }
}
