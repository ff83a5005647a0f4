//! Administrator Records

use serde_json::Value;

use crate::error::{NotifyError, Result};

/// Push tokens registered on an admin document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminEndpoints {
    /// `fcmTokens` array.
    Many(Vec<String>),
    /// Legacy `fcmToken` string.
    Single(String),
    /// Neither field present.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRecord {
    pub id: String,
    pub endpoints: AdminEndpoints,
}

impl AdminRecord {
    pub fn new(id: impl Into<String>, endpoints: AdminEndpoints) -> Self {
        Self {
            id: id.into(),
            endpoints,
        }
    }

    pub fn with_tokens<I, S>(id: impl Into<String>, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(id, AdminEndpoints::Many(tokens.into_iter().map(Into::into).collect()))
    }

    pub fn from_document(id: impl Into<String>, document: &Value) -> Result<Self> {
        let id = id.into();
        let Value::Object(map) = document else {
            return Err(NotifyError::invalid_document(id, "expected an object"));
        };

        let endpoints = match (map.get("fcmTokens"), map.get("fcmToken")) {
            (Some(Value::Array(tokens)), _) => AdminEndpoints::Many(
                tokens
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            (_, Some(Value::String(token))) => AdminEndpoints::Single(token.clone()),
            _ => AdminEndpoints::Missing,
        };

        Ok(Self { id, endpoints })
    }

    /// Every token a push should reach, in registration order.
    pub fn delivery_tokens(&self) -> Vec<&str> {
        match &self.endpoints {
            AdminEndpoints::Many(tokens) => tokens.iter().map(String::as_str).collect(),
            AdminEndpoints::Single(token) if !token.is_empty() => vec![token.as_str()],
            _ => Vec::new(),
        }
    }

    /// Tokens held in the `fcmTokens` array, the only field cleanup rewrites.
    pub fn registered_tokens(&self) -> &[String] {
        match &self.endpoints {
            AdminEndpoints::Many(tokens) => tokens,
            _ => &[],
        }
    }
}
