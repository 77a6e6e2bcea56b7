//! Key set providers.
//!
//! A provider hands out the current [`JwkSet`]. The HTTP provider fetches on
//! every call; wrap it in [`CachingKeySetProvider`] to reuse a fetched set.

use crate::error::TokenError;
use crate::jwks::model::JwkSet;
use arc_swap::ArcSwapOption;
use rust_common::{build_http_client, HttpConfig, PlatformError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use url::Url;

/// Source of key sets, with native async (no async-trait crate).
pub trait KeySetProvider: Send + Sync {
    /// The current key set.
    fn fetch(&self) -> impl Future<Output = Result<Arc<JwkSet>, TokenError>> + Send;
}

/// Fetches a key set document over HTTP(S) on every call.
#[derive(Debug, Clone)]
pub struct HttpKeySetProvider {
    url: Url,
    client: reqwest::Client,
}

impl HttpKeySetProvider {
    /// Provider for `url` using a client built from `config`.
    ///
    /// # Errors
    ///
    /// `Config` for an unparsable URL or a client that cannot be built.
    pub fn new(url: &str, config: &HttpConfig) -> Result<Self, TokenError> {
        let url = Url::parse(url).map_err(|e| TokenError::config(format!("invalid JWKS URL {url:?}: {e}")))?;
        let client = build_http_client(config)
            .map_err(|e| TokenError::config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self { url, client })
    }

    /// Provider sharing an existing client.
    #[must_use]
    pub const fn with_client(url: Url, client: reqwest::Client) -> Self {
        Self { url, client }
    }

    /// Endpoint this provider reads.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    async fn fetch_document(&self) -> Result<JwkSet, PlatformError> {
        let url = self.url.as_str();
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| PlatformError::from_transport(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PlatformError::from_transport(e, url))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl KeySetProvider for HttpKeySetProvider {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Arc<JwkSet>, TokenError> {
        info!("Fetching JWKS");
        let set = self.fetch_document().await.map_err(|source| TokenError::ResolutionFailed {
            reason: format!("cannot load JWKS from {}: {source}", self.url),
            source: Some(source),
        })?;
        debug!(keys = set.keys.len(), "Fetched JWKS");
        Ok(Arc::new(set))
    }
}

/// Serves a fixed key set.
#[derive(Debug, Clone, Default)]
pub struct StaticKeySetProvider {
    set: Arc<JwkSet>,
}

impl StaticKeySetProvider {
    /// Provider always returning `set`.
    #[must_use]
    pub fn new(set: JwkSet) -> Self {
        Self { set: Arc::new(set) }
    }
}

impl KeySetProvider for StaticKeySetProvider {
    async fn fetch(&self) -> Result<Arc<JwkSet>, TokenError> {
        Ok(Arc::clone(&self.set))
    }
}

struct CachedKeySet {
    set: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Reuses a fetched key set for `ttl`.
///
/// Concurrent callers that find the cache stale wait on one refresh instead
/// of fetching in parallel. Failed fetches are not cached.
pub struct CachingKeySetProvider<P> {
    inner: P,
    ttl: Duration,
    cached: ArcSwapOption<CachedKeySet>,
    refresh: Mutex<()>,
}

impl<P: KeySetProvider> CachingKeySetProvider<P> {
    /// Cache `inner` for `ttl`.
    #[must_use]
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: ArcSwapOption::empty(),
            refresh: Mutex::new(()),
        }
    }

    /// Drop the cached set so the next call fetches.
    pub fn invalidate(&self) {
        self.cached.store(None);
    }

    /// Whether the next call has to fetch.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.fresh().is_none()
    }

    fn fresh(&self) -> Option<Arc<JwkSet>> {
        self.cached
            .load_full()
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.set))
    }
}

impl<P: KeySetProvider> KeySetProvider for CachingKeySetProvider<P> {
    async fn fetch(&self) -> Result<Arc<JwkSet>, TokenError> {
        if let Some(set) = self.fresh() {
            debug!("JWKS cache hit");
            return Ok(set);
        }

        let _guard = self.refresh.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(set) = self.fresh() {
            return Ok(set);
        }

        let set = self.inner.fetch().await?;
        self.cached.store(Some(Arc::new(CachedKeySet {
            set: Arc::clone(&set),
            fetched_at: Instant::now(),
        })));
        Ok(set)
    }
}

impl<P> std::fmt::Debug for CachingKeySetProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingKeySetProvider")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
