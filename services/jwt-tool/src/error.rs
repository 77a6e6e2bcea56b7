//! Error taxonomy for token issuance and verification.
//!
//! Every failure in the engine is terminal for the current operation and is
//! returned to the caller; nothing here retries.

use rust_common::PlatformError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading key material, building, signing or verifying tokens.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TokenError {
    /// PEM, DER, JSON or compact token structure could not be decoded
    #[error("Malformed encoding: {reason}")]
    MalformedEncoding {
        /// What failed to decode
        reason: String,
    },

    /// Key material decoded fine but is not an RSA key
    #[error("Wrong key type: {reason}")]
    WrongKeyType {
        /// Description of the key that was found
        reason: String,
    },

    /// Expiry duration could not be parsed
    #[error("Invalid expiry duration {value:?}: {reason}")]
    InvalidExpiry {
        /// The rejected input
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// The signing backend refused to produce a signature
    #[error("Signing failed: {reason}")]
    SigningFailed {
        /// Backend failure description
        reason: String,
    },

    /// No key in the key set carries the requested identifier
    #[error("No key found for kid {kid}")]
    KeyNotFound {
        /// Requested key identifier
        kid: String,
    },

    /// Several keys in the key set carry the requested identifier
    #[error("Key set holds {count} keys with kid {kid}")]
    AmbiguousKey {
        /// Requested key identifier
        kid: String,
        /// Number of matching entries
        count: usize,
    },

    /// The key set could not be fetched or parsed
    #[error("Key resolution failed: {reason}")]
    ResolutionFailed {
        /// Description of the failure
        reason: String,
        /// Underlying platform error, when the failure came from transport
        #[source]
        source: Option<PlatformError>,
    },

    /// Signature does not match the resolved key
    #[error("Token signature invalid")]
    SignatureInvalid,

    /// Outbound request failed while driving a target service
    #[error("Request failed: {0}")]
    Request(#[source] PlatformError),

    /// A local file could not be read
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TokenError {
    /// Create a malformed-encoding error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEncoding {
            reason: reason.into(),
        }
    }

    /// Create a wrong-key-type error.
    #[must_use]
    pub fn wrong_key_type(reason: impl Into<String>) -> Self {
        Self::WrongKeyType {
            reason: reason.into(),
        }
    }

    /// Create a signing failure.
    #[must_use]
    pub fn signing(reason: impl Into<String>) -> Self {
        Self::SigningFailed {
            reason: reason.into(),
        }
    }

    /// Create a resolution failure without an underlying transport error.
    #[must_use]
    pub fn resolution(reason: impl Into<String>) -> Self {
        Self::ResolutionFailed {
            reason: reason.into(),
            source: None,
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Stable code for log fields and exit messages.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedEncoding { .. } => "MALFORMED_ENCODING",
            Self::WrongKeyType { .. } => "WRONG_KEY_TYPE",
            Self::InvalidExpiry { .. } => "INVALID_EXPIRY",
            Self::SigningFailed { .. } => "SIGNING_FAILED",
            Self::KeyNotFound { .. } => "KEY_NOT_FOUND",
            Self::AmbiguousKey { .. } => "AMBIGUOUS_KEY",
            Self::ResolutionFailed { .. } => "RESOLUTION_FAILED",
            Self::SignatureInvalid => "SIGNATURE_INVALID",
            Self::Request(_) => "REQUEST_FAILED",
            Self::Io { .. } => "IO_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether an external caller may reasonably retry the operation.
    ///
    /// Only transport-level failures qualify; the engine itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ResolutionFailed {
                source: Some(source),
                ..
            }
            | Self::Request(source) => source.is_retryable(),
            _ => false,
        }
    }
}

impl From<PlatformError> for TokenError {
    fn from(err: PlatformError) -> Self {
        Self::ResolutionFailed {
            reason: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            TokenError::malformed("x"),
            TokenError::wrong_key_type("x"),
            TokenError::InvalidExpiry {
                value: "x".to_string(),
                reason: "x".to_string(),
            },
            TokenError::signing("x"),
            TokenError::KeyNotFound {
                kid: "1".to_string(),
            },
            TokenError::AmbiguousKey {
                kid: "1".to_string(),
                count: 2,
            },
            TokenError::resolution("x"),
            TokenError::SignatureInvalid,
            TokenError::config("x"),
        ];
        let codes: std::collections::HashSet<_> = errors.iter().map(TokenError::code).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display() {
        let err = TokenError::AmbiguousKey {
            kid: "12345".to_string(),
            count: 2,
        };
        assert_eq!(err.to_string(), "Key set holds 2 keys with kid 12345");
        assert_eq!(TokenError::SignatureInvalid.to_string(), "Token signature invalid");
    }

    #[test]
    fn test_platform_errors_become_resolution_failures() {
        let err: TokenError = PlatformError::Timeout("http://keys".to_string()).into();
        assert!(matches!(err, TokenError::ResolutionFailed { source: Some(_), .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_engine_errors_are_not_retryable() {
        assert!(!TokenError::SignatureInvalid.is_retryable());
        assert!(!TokenError::resolution("bad jwk").is_retryable());
        assert!(!TokenError::KeyNotFound {
            kid: "1".to_string()
        }
        .is_retryable());
    }
}
