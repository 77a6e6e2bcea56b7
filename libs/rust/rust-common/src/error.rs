//! Centralized error types for all Rust libraries.
//!
//! This module provides a unified error type that can be used across all
//! jwt-tool crates, with built-in retryability classification.

use thiserror::Error;

/// Common error type for platform operations.
///
/// All errors are classified as either retryable or non-retryable,
/// which helps callers decide whether to retry failed operations.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote endpoint answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout occurred
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

impl PlatformError {
    /// Check if this error is retryable.
    ///
    /// Retryable errors are transient failures that may succeed on retry,
    /// such as network issues, server errors, or temporary unavailability.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::PlatformError;
    ///
    /// let err = PlatformError::Timeout("jwks".to_string());
    /// assert!(err.is_retryable());
    ///
    /// let err = PlatformError::invalid_input("not a url");
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Serialization(_) | Self::InvalidInput(_) => false,
        }
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an invalid input error with the given message.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Classify a transport error, separating timeouts from other failures.
    #[must_use]
    pub fn from_transport(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            Self::Timeout(url.to_string())
        } else {
            Self::Http(err)
        }
    }
}
