//! Service Notify Dispatch
//!
//! Pushes service request lifecycle events to every registered admin device,
//! and prunes push tokens the provider no longer accepts.
//!
//! The two orchestrators, [`NotificationDispatcher`] and [`TokenSanitizer`],
//! only see the datastore and the push provider through the capability traits
//! in [`repository`] and [`provider`]. Concrete adapters live behind features:
//! `mongo` for the MongoDB repositories and `fcm` for the FCM HTTP v1 client.

pub mod dispatcher;
pub mod memory;
pub mod normalizer;
pub mod payload;
pub mod provider;
pub mod recipients;
pub mod report;
pub mod repository;
pub mod sanitizer;

#[cfg(feature = "mongo")]
pub mod mongo;
#[cfg(feature = "fcm")]
pub mod fcm;

pub use dispatcher::NotificationDispatcher;
pub use normalizer::{normalize, Normalized};
pub use payload::build_payload;
pub use provider::{PushProvider, TokenValidity};
pub use recipients::resolve_recipients;
pub use report::{redact_token, DeliveryReport, TokenFailure};
pub use repository::{AdminRepository, EventRepository};
pub use sanitizer::TokenSanitizer;
