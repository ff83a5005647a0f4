//! Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Invalid document {id}: {message}")]
    InvalidDocument { id: String, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotifyError {
    pub fn invalid_document(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            id: id.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NotifyError>;
