//! FCM HTTP v1 provider
//!
//! Sends through `POST {base}/v1/projects/{project}/messages:send`. The v1 API
//! takes one token per request, so a batch is fanned out as concurrent requests
//! (bounded by `max_concurrency`) and the results are returned in token order.
//!
//! A rejection of an individual token is reported inside the batch response.
//! Transport failures and authentication failures say nothing about the
//! tokens, so either one fails the whole batch.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use sn_common::{BatchResponse, PushPayload, TokenResult};
use thiserror::Error;
use tracing::{debug, warn};

use crate::provider::{PushProvider, TokenValidity};

#[derive(Debug, Clone)]
pub struct FcmConfig {
    /// API base URL, without a trailing path
    pub base_url: String,
    pub project_id: String,
    /// OAuth2 access token sent as a Bearer token
    pub access_token: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Maximum in-flight requests per batch
    pub max_concurrency: usize,
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fcm.googleapis.com".to_string(),
            project_id: String::new(),
            access_token: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_concurrency: 16,
        }
    }
}

#[derive(Error, Debug)]
pub enum FcmError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("FCM authentication failed: {message}")]
    Unauthorized { message: String },

    #[error("FCM rejected message (HTTP {status}, {code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },
}

impl FcmError {
    /// Whether the failure concerns the call itself rather than the token.
    pub fn is_call_level(&self) -> bool {
        matches!(self, FcmError::Transport(_) | FcmError::Unauthorized { .. })
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    validate_only: bool,
    message: &'a FcmMessage<'a>,
}

/// A v1 `Message` addressed to one token.
#[derive(Debug, Serialize)]
pub struct FcmMessage<'a> {
    token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification: Option<FcmNotification<'a>>,
    data: BTreeMap<&'a str, &'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    android: Option<FcmAndroidConfig<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    apns: Option<FcmApnsConfig>,
}

#[derive(Debug, Serialize)]
struct FcmNotification<'a> {
    title: &'a str,
    body: &'a str,
}

#[derive(Debug, Serialize)]
struct FcmAndroidConfig<'a> {
    priority: String,
    notification: FcmAndroidNotification<'a>,
}

#[derive(Debug, Serialize)]
struct FcmAndroidNotification<'a> {
    channel_id: &'a str,
    sound: &'a str,
    notification_priority: String,
    default_sound: bool,
    default_vibrate_timings: bool,
}

#[derive(Debug, Serialize)]
struct FcmApnsConfig {
    payload: serde_json::Value,
}

impl<'a> FcmMessage<'a> {
    pub fn from_payload(token: &'a str, payload: &'a PushPayload) -> Self {
        let android = &payload.android;
        Self {
            token,
            notification: Some(FcmNotification {
                title: &payload.notification.title,
                body: &payload.notification.body,
            }),
            data: payload.data.entries().into_iter().collect(),
            android: Some(FcmAndroidConfig {
                priority: android.priority.to_uppercase(),
                notification: FcmAndroidNotification {
                    channel_id: &android.notification.channel_id,
                    sound: &payload.notification.sound,
                    notification_priority: format!(
                        "PRIORITY_{}",
                        android.notification.priority.to_uppercase()
                    ),
                    default_sound: android.notification.default_sound,
                    default_vibrate_timings: android.notification.default_vibrate_timings,
                },
            }),
            apns: Some(FcmApnsConfig {
                payload: serde_json::json!({
                    "aps": {
                        "sound": payload.apns.payload.aps.sound,
                        "badge": payload.apns.payload.aps.badge,
                    }
                }),
            }),
        }
    }

    /// Minimal data-only message for dry-run validation.
    pub fn validation(token: &'a str) -> Self {
        Self {
            token,
            notification: None,
            data: BTreeMap::from([("test", "validation")]),
            android: None,
            apns: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    #[serde(default)]
    error_code: Option<String>,
}

impl ErrorBody {
    /// FCM-specific code (e.g. `UNREGISTERED`) if present, else the RPC status.
    fn code(&self) -> String {
        self.details
            .iter()
            .find_map(|d| d.error_code.clone())
            .unwrap_or_else(|| self.status.clone())
    }
}

pub struct FcmClient {
    config: FcmConfig,
    client: reqwest::Client,
}

impl FcmClient {
    pub fn new(config: FcmConfig) -> Result<Self, FcmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { config, client })
    }

    fn send_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/messages:send",
            self.config.base_url.trim_end_matches('/'),
            self.config.project_id
        )
    }

    /// Send one message, returning the provider's message name.
    pub async fn send_message(
        &self,
        message: &FcmMessage<'_>,
        validate_only: bool,
    ) -> Result<String, FcmError> {
        let request = SendRequest {
            validate_only,
            message,
        };

        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(&self.config.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: SendResponse = response.json().await?;
            return Ok(body.name);
        }

        let text = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) => (envelope.error.code(), envelope.error.message),
            Err(_) => (status.as_str().to_string(), text),
        };

        if status.as_u16() == 401 {
            warn!("FCM rejected credentials: {}", message);
            return Err(FcmError::Unauthorized { message });
        }

        Err(FcmError::Rejected {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn send_one(&self, token: &str, payload: &PushPayload) -> Result<String, FcmError> {
        let message = FcmMessage::from_payload(token, payload);
        self.send_message(&message, false).await
    }
}

#[async_trait]
impl PushProvider for FcmClient {
    async fn send_batch(&self, tokens: &[String], payload: &PushPayload) -> anyhow::Result<BatchResponse> {
        debug!("Sending push to {} tokens via {}", tokens.len(), self.send_url());

        let sends: Vec<_> = tokens.iter().map(|token| self.send_one(token, payload)).collect();
        let outcomes: Vec<Result<String, FcmError>> = stream::iter(sends)
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(name) => results.push(TokenResult::delivered(name)),
                Err(e) if e.is_call_level() => return Err(e.into()),
                Err(e) => results.push(TokenResult::failed(e.to_string())),
            }
        }

        Ok(BatchResponse::new(results))
    }

    async fn validate_token(&self, token: &str) -> anyhow::Result<TokenValidity> {
        let message = FcmMessage::validation(token);
        match self.send_message(&message, true).await {
            Ok(_) => Ok(TokenValidity::Valid),
            Err(e) if e.is_call_level() => Err(e.into()),
            Err(e) => Ok(TokenValidity::Invalid(e.to_string())),
        }
    }
}
