// src/error.rs

//! Unified error handling for the scraper application.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport-level HTTP failure (connect, TLS, timeout, body read)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("HTTP {code} for {url}")]
    Status { code: u16, url: String },

    /// Circuit breaker is open; requests are short-circuited
    #[error("circuit open, retry in {retry_after_secs}s")]
    CircuitOpen { retry_after_secs: u64 },

    /// Selector path pointed at a value that does not exist
    #[error("selector missed at '{path}'")]
    SelectorMiss { path: String },

    /// Selector token applied to a value of the wrong shape
    #[error("selector type mismatch at '{path}'")]
    SelectorType { path: String },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload decoding failed (charset, image bytes, embedded documents)
    #[error("decode error: {0}")]
    Decode(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// An external helper program failed
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a status error from a response.
    pub fn status(code: u16, url: impl Into<String>) -> Self {
        Self::Status {
            code,
            url: url.into(),
        }
    }

    /// Create a selector-miss error.
    pub fn selector_miss(path: impl Into<String>) -> Self {
        Self::SelectorMiss { path: path.into() }
    }

    /// Create a selector-type error.
    pub fn selector_type(path: impl Into<String>) -> Self {
        Self::SelectorType { path: path.into() }
    }

    /// Create a decode error.
    pub fn decode(message: impl fmt::Display) -> Self {
        Self::Decode(message.to_string())
    }

    /// Create an external-tool error.
    pub fn external_tool(tool: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for HTTP 404 responses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { code: 404, .. })
    }

    /// True when another attempt may succeed: transport failures and
    /// server-side statuses. Client errors (4xx) are final.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { code, .. } => !(400..500).contains(code),
            _ => false,
        }
    }

    /// True when the upstream is unavailable rather than the request
    /// being wrong; the cached facade degrades these to a missing value.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::CircuitOpen { .. })
    }

    /// True when the response shape did not match our catalog; retrying
    /// other items will hit the same mismatch, so runs stop on these.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::SelectorMiss { .. } | Self::SelectorType { .. } | Self::Json(_) | Self::Decode(_)
        )
    }
}
