//! RS256 token signing.

use crate::error::TokenError;
use crate::jwt::claims::ClaimSet;
use crate::keys::Certificate;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::RsaPrivateKey;
use std::fmt;
use tracing::debug;

/// Header fields the signer controls. The algorithm is always RS256.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHeader {
    /// Key identifier
    pub kid: String,
}

impl TokenHeader {
    /// Header with an explicit key identifier.
    #[must_use]
    pub fn new(kid: impl Into<String>) -> Self {
        Self { kid: kid.into() }
    }

    /// Header naming the certificate's serial number.
    #[must_use]
    pub fn for_certificate(cert: &Certificate) -> Self {
        Self::new(cert.key_id())
    }
}

/// Compact `header.claims.signature` token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignedToken(String);

impl SignedToken {
    /// Wrap a compact token string without inspecting it.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the compact form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the compact form.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the header without verifying the signature.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` when the header does not decode or has no `kid`.
    pub fn header(&self) -> Result<TokenHeader, TokenError> {
        decode_token_header(&self.0)
    }
}

pub(crate) fn decode_token_header(token: &str) -> Result<TokenHeader, TokenError> {
    let header = jsonwebtoken::decode_header(token)
        .map_err(|e| TokenError::malformed(format!("invalid token header: {e}")))?;
    match header.kid {
        Some(kid) if !kid.is_empty() => Ok(TokenHeader::new(kid)),
        _ => Err(TokenError::malformed("token header has no kid")),
    }
}

impl fmt::Display for SignedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SignedToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl AsRef<str> for SignedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Signs claim sets with one RSA private key.
pub struct TokenSigner {
    key: EncodingKey,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Prepare a signer for the given key.
    ///
    /// # Errors
    ///
    /// `SigningFailed` when the key cannot be re-encoded for the backend.
    pub fn new(key: &RsaPrivateKey) -> Result<Self, TokenError> {
        let der = key
            .to_pkcs1_der()
            .map_err(|e| TokenError::signing(format!("cannot encode private key: {e}")))?;
        Ok(Self {
            key: EncodingKey::from_rsa_der(der.as_bytes()),
        })
    }

    /// Sign `claims` under `header`.
    ///
    /// # Errors
    ///
    /// `SigningFailed` for an empty key identifier or when the backend
    /// rejects the key, e.g. a modulus under 2048 bits.
    pub fn sign(&self, claims: &ClaimSet, header: &TokenHeader) -> Result<SignedToken, TokenError> {
        if header.kid.is_empty() {
            return Err(TokenError::signing("key identifier is empty"));
        }

        let mut jws_header = Header::new(Algorithm::RS256);
        jws_header.kid = Some(header.kid.clone());

        let token = jsonwebtoken::encode(&jws_header, claims, &self.key)
            .map_err(|e| TokenError::signing(e.to_string()))?;
        debug!(kid = %header.kid, claims = claims.len(), "Signed token");
        Ok(SignedToken(token))
    }
}

/// One-shot signing with a fresh [`TokenSigner`].
///
/// # Errors
///
/// See [`TokenSigner::sign`].
pub fn sign(claims: &ClaimSet, header: &TokenHeader, key: &RsaPrivateKey) -> Result<SignedToken, TokenError> {
    TokenSigner::new(key)?.sign(claims, header)
}
