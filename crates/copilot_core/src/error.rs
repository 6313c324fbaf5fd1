use serde::{Deserialize, Serialize};
use std::fmt;

/// A passage, block marker or search hit is missing required fields, or its block ranges cannot
/// be reconciled with the span they belong to.
pub const MALFORMED_METADATA: &str = "SOURCE_MALFORMED_METADATA";
/// Generated text cites a source ID that no source record carries.
pub const UNKNOWN_CITATION_REFERENCE: &str = "CITATION_UNKNOWN_REFERENCE";
/// A search hit declares a content type other than web content or video transcript.
pub const UNSUPPORTED_CONTENT_TYPE: &str = "SOURCE_UNSUPPORTED_CONTENT_TYPE";

/// Single structured error shape used across the core transforms and the AI layer.
///
/// `message` is safe to log; `details` carries diagnostic context (`key=value; ...`) and is never
/// meant for end users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(MALFORMED_METADATA, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}
