//! Runtime configuration shared by the jwt-tool binaries.
//!
//! Values come from environment variables (a `.env` file is loaded first)
//! and fall back to defaults. Command-line flags override them.

use crate::error::TokenError;
use crate::jwt::builder::{ClaimTemplate, SubjectTemplate, DEFAULT_AUDIENCE};
use rust_common::HttpConfig;
use std::env;
use std::time::Duration;

/// Tool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Request timeout for JWKS fetches
    pub jwks_fetch_timeout: Duration,
    /// `aud` stamped by the claim template
    pub audience: String,
    /// User agent for outbound requests
    pub user_agent: String,
    /// Request timeout for load runs
    pub load_request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jwks_fetch_timeout: Duration::from_secs(10),
            audience: DEFAULT_AUDIENCE.to_string(),
            user_agent: concat!("jwt-tool/", env!("CARGO_PKG_VERSION")).to_string(),
            load_request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, TokenError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            jwks_fetch_timeout: Duration::from_secs(parse_env(
                "JWKS_FETCH_TIMEOUT",
                defaults.jwks_fetch_timeout.as_secs(),
            )?),
            audience: env::var("JWT_AUDIENCE").unwrap_or(defaults.audience),
            user_agent: env::var("HTTP_USER_AGENT").unwrap_or(defaults.user_agent),
            load_request_timeout: Duration::from_secs(parse_env(
                "LOAD_REQUEST_TIMEOUT",
                defaults.load_request_timeout.as_secs(),
            )?),
        })
    }

    /// Override the JWKS fetch timeout.
    #[must_use]
    pub const fn with_jwks_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_fetch_timeout = timeout;
        self
    }

    /// HTTP settings for JWKS fetches.
    #[must_use]
    pub fn jwks_http_config(&self, insecure: bool) -> HttpConfig {
        HttpConfig::default()
            .with_timeout(self.jwks_fetch_timeout)
            .with_user_agent(&self.user_agent)
            .with_insecure_tls(insecure)
    }

    /// HTTP settings for load runs.
    #[must_use]
    pub fn load_http_config(&self) -> HttpConfig {
        HttpConfig::default()
            .with_timeout(self.load_request_timeout)
            .with_user_agent(&self.user_agent)
    }

    /// Claim template with the configured audience and the given subject rule.
    #[must_use]
    pub fn claim_template(&self, subject: SubjectTemplate) -> ClaimTemplate {
        ClaimTemplate::default()
            .with_subject(subject)
            .with_audience(&self.audience)
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, TokenError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| TokenError::config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.jwks_fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.audience, "jwt-tool");
        assert!(config.user_agent.starts_with("jwt-tool/"));
    }

    #[test]
    fn test_parse_env_default_when_unset() {
        let value: u64 = parse_env("JWT_TOOL_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_http_configs() {
        let config = Config::default().with_jwks_fetch_timeout(Duration::from_secs(2));
        let jwks = config.jwks_http_config(true);
        assert_eq!(jwks.timeout, Duration::from_secs(2));
        assert!(jwks.accept_invalid_certs);

        let load = config.load_http_config();
        assert_eq!(load.timeout, Duration::from_secs(30));
        assert!(!load.accept_invalid_certs);
    }

    #[test]
    fn test_claim_template_uses_audience() {
        let config = Config {
            audience: "billing".to_string(),
            ..Config::default()
        };
        let template = config.claim_template(SubjectTemplate::UnixNanos);
        assert_eq!(template.audience, "billing");
        assert_eq!(template.subject, SubjectTemplate::UnixNanos);
    }
}
