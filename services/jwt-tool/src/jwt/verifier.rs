//! RS256 token verification.
//!
//! Only the signature is checked. `exp` and `nbf` are returned as claims and
//! left to the caller.

use crate::error::TokenError;
use crate::jwks::KeyResolver;
use crate::jwt::claims::ClaimSet;
use crate::jwt::signer::decode_token_header;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use tracing::{debug, instrument, warn};

/// Verifies tokens against keys from a [`KeyResolver`].
#[derive(Debug, Clone)]
pub struct TokenVerifier<R> {
    resolver: R,
}

impl<R: KeyResolver> TokenVerifier<R> {
    /// Verifier resolving keys through `resolver`.
    #[must_use]
    pub const fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// The resolver in use.
    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    ///
    /// - `MalformedEncoding` for a token that is not three base64url segments
    ///   or whose header has no `kid`
    /// - any resolver error
    /// - `SignatureInvalid` when the signature does not match or the header
    ///   names another algorithm
    #[instrument(skip(self, token), fields(kid))]
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        check_structure(token)?;
        let header = decode_token_header(token)?;
        tracing::Span::current().record("kid", header.kid.as_str());

        let key = self.resolver.resolve(&header.kid).await?;
        let claims = verify_with_key(token, &key).inspect_err(|e| {
            warn!(error = %e, "Token rejected");
        })?;
        debug!(claims = claims.len(), "Token verified");
        Ok(claims)
    }
}

/// Verify `token` against an already resolved key.
///
/// # Errors
///
/// `MalformedEncoding` for undecodable tokens, `SignatureInvalid` for a
/// signature or algorithm mismatch.
pub fn verify_with_key(token: &str, key: &RsaPublicKey) -> Result<ClaimSet, TokenError> {
    check_structure(token)?;

    let decoding_key = DecodingKey::from_rsa_raw_components(&key.n().to_bytes_be(), &key.e().to_bytes_be());
    let data = jsonwebtoken::decode::<ClaimSet>(token, &decoding_key, &signature_only())
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
            _ => TokenError::malformed(format!("cannot decode token: {e}")),
        })?;
    Ok(data.claims)
}

fn signature_only() -> Validation {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

fn check_structure(token: &str) -> Result<(), TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::malformed(format!(
            "token has {} segments, expected 3",
            segments.len()
        )));
    }
    for (name, segment) in ["header", "claims", "signature"].iter().zip(&segments) {
        if segment.is_empty() {
            return Err(TokenError::malformed(format!("token {name} is empty")));
        }
        URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|e| TokenError::malformed(format!("token {name} is not base64url: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwks::DirectResolver;
    use crate::jwt::signer::{sign, TokenHeader};
    use crate::keys::{load_certificate, load_private_key};

    const SIGNING_KEY: &[u8] = include_bytes!("../../tests/fixtures/signing.key");
    const SIGNING_CERT: &[u8] = include_bytes!("../../tests/fixtures/signing.crt");
    const OTHER_CERT: &[u8] = include_bytes!("../../tests/fixtures/other.crt");

    fn signed(claims: &ClaimSet) -> String {
        let key = load_private_key(SIGNING_KEY).unwrap();
        sign(claims, &TokenHeader::new("12345"), &key).unwrap().into_string()
    }

    #[tokio::test]
    async fn test_round_trip() {
        let claims: ClaimSet = [("sub", "alice"), ("role", "admin")].into_iter().collect();
        let token = signed(&claims);

        let verifier = TokenVerifier::new(DirectResolver::new(&load_certificate(SIGNING_CERT).unwrap()));
        assert_eq!(verifier.verify(&token).await.unwrap(), claims);
    }

    #[tokio::test]
    async fn test_expired_token_still_verifies() {
        let mut claims = ClaimSet::new();
        claims.insert("sub", "alice");
        claims.insert("exp", 1_i64);
        let token = signed(&claims);

        let verifier = TokenVerifier::new(DirectResolver::new(&load_certificate(SIGNING_CERT).unwrap()));
        assert_eq!(verifier.verify(&token).await.unwrap().expires_at(), Some(1));
    }

    #[tokio::test]
    async fn test_wrong_key() {
        let token = signed(&ClaimSet::new());
        let verifier = TokenVerifier::new(DirectResolver::new(&load_certificate(OTHER_CERT).unwrap()));
        assert!(matches!(
            verifier.verify(&token).await.unwrap_err(),
            TokenError::SignatureInvalid
        ));
    }

    #[test]
    fn test_structure_checks() {
        for token in ["", "a.b", "a.b.c.d", "a..c", "a.b.c!", "a.b."] {
            assert!(
                matches!(check_structure(token), Err(TokenError::MalformedEncoding { .. })),
                "{token:?}"
            );
        }
        assert!(check_structure("eyJh.eyJi.c2ln").is_ok());
    }

    #[test]
    fn test_header_without_kid() {
        // {"alg":"RS256","typ":"JWT"}
        let token = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.e30.c2ln";
        let err = decode_token_header(token).unwrap_err();
        assert!(matches!(err, TokenError::MalformedEncoding { .. }));
    }
}
