//! Adapter failures and their classification

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vendor bodies are cut to this many characters before they reach a task record.
const MAX_BODY_CHARS: usize = 200;

/// How a failure should be treated upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Timeouts, connection drops, 5xx, rate limiting. Eligible for one retry.
    Transient,
    /// Rejected request or unusable response. Never retried.
    Permanent,
    /// The capability check passed but the live call showed the configuration is wrong.
    Misconfigured,
    /// A stage was handed a context missing data it depends on.
    ContractViolation,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Transient => "transient",
            FailureKind::Permanent => "permanent",
            FailureKind::Misconfigured => "misconfigured",
            FailureKind::ContractViolation => "contract violation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Response parse error: {0}")]
    Parse(String),

    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Media processing failed: {0}")]
    Media(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    pub fn kind(&self) -> FailureKind {
        match self {
            AdapterError::Api { status, .. } if *status >= 500 => FailureKind::Transient,
            AdapterError::Api { .. } => FailureKind::Permanent,
            AdapterError::Request(_)
            | AdapterError::Timeout(_)
            | AdapterError::RateLimited { .. } => FailureKind::Transient,
            AdapterError::Auth(_) | AdapterError::Config(_) => FailureKind::Misconfigured,
            AdapterError::Parse(_)
            | AdapterError::Rejected(_)
            | AdapterError::Media(_)
            | AdapterError::Io(_) => FailureKind::Permanent,
        }
    }

    pub fn should_retry(&self) -> bool {
        self.kind() == FailureKind::Transient
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: u16, body: &str, retry_after_ms: Option<u64>) -> Self {
        match status {
            401 => AdapterError::Auth(truncate_body(body)),
            429 => AdapterError::RateLimited { retry_after_ms },
            _ => AdapterError::Api {
                status,
                message: truncate_body(body),
            },
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        AdapterError::Timeout(format!("no response within {:.1}s", limit.as_secs_f64()))
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else if err.is_builder() {
            AdapterError::Config(err.to_string())
        } else if let Some(status) = err.status() {
            AdapterError::from_status(status.as_u16(), &err.to_string(), None)
        } else {
            AdapterError::Request(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        AdapterError::Parse(err.to_string())
    }
}

pub fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(MAX_BODY_CHARS).collect();
    format!("{}...", cut)
}
