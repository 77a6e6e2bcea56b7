//! Sequential load generation against a token-protected endpoint.

use crate::error::TokenError;
use crate::issue::TokenIssuer;
use crate::jwt::ClaimOverrides;
use reqwest::header::AUTHORIZATION;
use rust_common::{build_http_client, HttpConfig, PlatformError};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};
use url::Url;

/// Requests sent by `load-jwt` when no count is given.
pub const DEFAULT_REQUEST_COUNT: u64 = 25_000;

/// Response handed to the per-request callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResponse {
    /// 1-based request number
    pub index: u64,
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Requests that got a response
    pub requests: u64,
    /// Responses with a non-2xx status
    pub failures: u64,
    /// Wall time of the run
    pub elapsed: Duration,
}

/// Sends one GET per freshly issued token, one after another.
#[derive(Debug, Clone)]
pub struct LoadRunner {
    client: reqwest::Client,
    url: Url,
    count: u64,
}

impl LoadRunner {
    /// Runner for `count` requests against `url`.
    ///
    /// # Errors
    ///
    /// `Config` for an invalid URL or HTTP client.
    pub fn new(url: &str, count: u64, config: &HttpConfig) -> Result<Self, TokenError> {
        let url = Url::parse(url).map_err(|e| TokenError::config(format!("invalid target URL {url:?}: {e}")))?;
        let client = build_http_client(config)
            .map_err(|e| TokenError::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { client, url, count })
    }

    /// Run to completion, calling `on_response` after every request.
    ///
    /// The raw token goes in the `Authorization` header without a scheme.
    ///
    /// # Errors
    ///
    /// Stops at the first issuance error or transport failure (`Request`).
    #[instrument(skip_all, fields(url = %self.url, count = self.count))]
    pub async fn run<F>(
        &self,
        issuer: &TokenIssuer,
        overrides: &ClaimOverrides,
        mut on_response: F,
    ) -> Result<LoadSummary, TokenError>
    where
        F: FnMut(&LoadResponse),
    {
        info!("Starting load run");
        let started = Instant::now();
        let mut failures = 0;

        for index in 1..=self.count {
            let issued = issuer.issue(overrides)?;
            let (status, body) = self.send(issued.token.as_str()).await?;
            if !(200..300).contains(&status) {
                failures += 1;
            }
            on_response(&LoadResponse { index, status, body });
        }

        let summary = LoadSummary {
            requests: self.count,
            failures,
            elapsed: started.elapsed(),
        };
        info!(failures = summary.failures, elapsed = ?summary.elapsed, "Load run finished");
        Ok(summary)
    }

    async fn send(&self, token: &str) -> Result<(u16, String), TokenError> {
        let url = self.url.as_str();
        let response = self
            .client
            .get(self.url.clone())
            .header(AUTHORIZATION, token)
            .send()
            .await
            .map_err(|e| TokenError::Request(PlatformError::from_transport(e, url)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TokenError::Request(PlatformError::from_transport(e, url)))?;
        debug!(status, bytes = body.len(), "Response received");
        Ok((status, body))
    }
}
