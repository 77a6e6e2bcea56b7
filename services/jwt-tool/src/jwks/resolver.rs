//! Key resolution by key identifier.

use crate::error::TokenError;
use crate::jwks::provider::KeySetProvider;
use crate::keys::Certificate;
use rsa::RsaPublicKey;
use std::future::Future;
use tracing::{debug, instrument};

/// Maps a token's `kid` to the public key that verifies it.
pub trait KeyResolver: Send + Sync {
    /// Public key for `kid`.
    fn resolve(&self, kid: &str) -> impl Future<Output = Result<RsaPublicKey, TokenError>> + Send;
}

/// Resolves every identifier to one fixed key.
///
/// The identifier is not compared with the certificate serial, so any token
/// signed by the matching private key verifies whatever `kid` it names.
#[derive(Debug, Clone)]
pub struct DirectResolver {
    key: RsaPublicKey,
}

impl DirectResolver {
    /// Resolver returning the certificate's embedded key.
    #[must_use]
    pub fn new(cert: &Certificate) -> Self {
        Self::from_public_key(cert.public_key().clone())
    }

    /// Resolver returning `key`.
    #[must_use]
    pub const fn from_public_key(key: RsaPublicKey) -> Self {
        Self { key }
    }
}

impl KeyResolver for DirectResolver {
    async fn resolve(&self, _kid: &str) -> Result<RsaPublicKey, TokenError> {
        Ok(self.key.clone())
    }
}

/// Resolves identifiers against a key set from a [`KeySetProvider`].
#[derive(Debug, Clone)]
pub struct JwksResolver<P> {
    provider: P,
}

impl<P: KeySetProvider> JwksResolver<P> {
    /// Resolver over `provider`.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// The underlying provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: KeySetProvider> KeyResolver for JwksResolver<P> {
    #[instrument(skip(self))]
    async fn resolve(&self, kid: &str) -> Result<RsaPublicKey, TokenError> {
        let set = self.provider.fetch().await?;
        let key = set.find(kid)?.to_public_key()?;
        debug!("Resolved key");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwks::model::{Jwk, JwkSet};
    use crate::jwks::provider::StaticKeySetProvider;
    use crate::keys::load_certificate;

    const SIGNING_CERT: &[u8] = include_bytes!("../../tests/fixtures/signing.crt");
    const OTHER_CERT: &[u8] = include_bytes!("../../tests/fixtures/other.crt");

    #[tokio::test]
    async fn test_direct_ignores_kid() {
        let cert = load_certificate(SIGNING_CERT).unwrap();
        let resolver = DirectResolver::new(&cert);
        assert_eq!(resolver.resolve("12345").await.unwrap(), *cert.public_key());
        assert_eq!(resolver.resolve("unrelated").await.unwrap(), *cert.public_key());
    }

    #[tokio::test]
    async fn test_jwks_picks_matching_key() {
        let signing = load_certificate(SIGNING_CERT).unwrap();
        let other = load_certificate(OTHER_CERT).unwrap();
        let set: JwkSet = [
            Jwk::from_chain(&[other.clone()]).unwrap(),
            Jwk::from_chain(&[signing.clone()]).unwrap(),
        ]
        .into_iter()
        .collect();
        let resolver = JwksResolver::new(StaticKeySetProvider::new(set));

        assert_eq!(resolver.resolve("12345").await.unwrap(), *signing.public_key());
        assert_eq!(resolver.resolve("67890").await.unwrap(), *other.public_key());
        assert!(matches!(
            resolver.resolve("1").await.unwrap_err(),
            TokenError::KeyNotFound { .. }
        ));
    }
}
