//! Service Notify Common
//!
//! Shared domain types for the notification fan-out and token cleanup engine:
//! - Event records (nested `data` shape and legacy flat shape)
//! - Administrator records and their registered push tokens
//! - Push payloads and per-token delivery results
//! - Terminal outcomes reported by the dispatcher and the sanitizer

pub mod admin;
pub mod error;
pub mod event;
pub mod outcome;
pub mod payload;

pub use admin::{AdminEndpoints, AdminRecord};
pub use error::{NotifyError, Result};
pub use event::{EventFields, EventRecord, NormalizedEvent, NotificationKind, RecordShape};
pub use outcome::{CleanupOutcome, DispatchOutcome, SkipReason};
pub use payload::{
    AndroidConfig, AndroidNotification, ApnsConfig, ApnsPayload, Aps, BatchResponse,
    NotificationContent, PushData, PushPayload, TokenResult,
};
