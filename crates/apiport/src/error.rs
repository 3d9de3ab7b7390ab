//! Error types for the ApiPort client.
//!
//! The variants follow the failure taxonomy callers act on:
//!
//! - [`Error::Validation`]: bad or missing arguments, detected before any network call
//! - [`Error::Authentication`]: the credentials or the bearer token were rejected
//! - [`Error::Upstream`]: any other non-2xx response, with status and body
//! - [`Error::Transport`]: the request never produced a response (timeout, DNS, refused)

use std::io;
use thiserror::Error;

/// Maximum length for upstream response bodies kept in error messages.
pub const MAX_ERROR_BODY_LENGTH: usize = 500;

/// The error type for ApiPort client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument failed validation. No request was sent.
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// The offending argument.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Credentials were rejected, or the API kept answering 401 after a re-authentication.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The API answered with a non-2xx status.
    #[error("API returned HTTP {status}: {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated to [`MAX_ERROR_BODY_LENGTH`] bytes.
        body: String,
    },

    /// Network-level failure: timeout, DNS, connection refused, broken body stream.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response whose payload did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a validation error for `field`.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Build an upstream error, truncating the body.
    #[must_use]
    pub fn upstream(status: u16, body: &str) -> Self {
        Self::Upstream {
            status,
            body: truncate_body(body),
        }
    }

    /// HTTP status carried by this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error was raised before anything reached the network.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Truncate a response body to avoid carrying excessive data around.
pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }

    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}... (truncated, {} total bytes)",
        &body[..end],
        body.len()
    )
}

/// A specialized Result type for ApiPort operations.
pub type Result<T> = std::result::Result<T, Error>;
