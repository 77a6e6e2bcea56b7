//! JSON Web Key and key set documents.

use crate::error::TokenError;
use crate::keys::Certificate;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Serialize};

/// Key type of every key this tool publishes or accepts.
pub const KTY_RSA: &str = "RSA";

/// Public key use for signatures.
pub const USE_SIG: &str = "sig";

/// JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type (RSA, EC, oct)
    pub kty: String,
    /// Intended use (sig, enc)
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Key ID
    #[serde(default)]
    pub kid: String,
    /// Algorithm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// RSA modulus, base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent, base64url
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    /// Certificate chain, standard base64 DER, leaf first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
    /// SHA-1 thumbprint of the leaf certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x5t: Option<String>,
    /// SHA-256 thumbprint of the leaf certificate
    #[serde(rename = "x5t#S256", default, skip_serializing_if = "Option::is_none")]
    pub x5t_s256: Option<String>,
}

impl Jwk {
    /// Describe a certificate chain. The leaf (first entry) supplies the key,
    /// `kid` and thumbprints; every entry lands in `x5c`.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` for an empty chain, `WrongKeyType` when the leaf
    /// was not signed with sha256WithRSAEncryption.
    pub fn from_chain(chain: &[Certificate]) -> Result<Self, TokenError> {
        let leaf = chain
            .first()
            .ok_or_else(|| TokenError::malformed("certificate chain is empty"))?;
        let alg = leaf.jws_algorithm()?;
        let key = leaf.public_key();

        Ok(Self {
            kty: KTY_RSA.to_string(),
            key_use: Some(USE_SIG.to_string()),
            kid: leaf.key_id().to_string(),
            alg: Some(alg.to_string()),
            n: Some(URL_SAFE_NO_PAD.encode(key.n().to_bytes_be())),
            e: Some(URL_SAFE_NO_PAD.encode(key.e().to_bytes_be())),
            x5c: Some(chain.iter().map(Certificate::to_x5c).collect()),
            x5t: Some(leaf.sha1_thumbprint()),
            x5t_s256: Some(leaf.sha256_thumbprint()),
        })
    }

    /// RSA public key described by this entry.
    ///
    /// Uses `n` and `e` when both are present, otherwise the first `x5c`
    /// certificate.
    ///
    /// # Errors
    ///
    /// `WrongKeyType` for a non-RSA entry, `ResolutionFailed` when the key
    /// members are missing or do not decode.
    pub fn to_public_key(&self) -> Result<RsaPublicKey, TokenError> {
        if self.kty != KTY_RSA {
            return Err(TokenError::wrong_key_type(format!(
                "key {} has type {}",
                self.kid, self.kty
            )));
        }

        if let (Some(n), Some(e)) = (&self.n, &self.e) {
            let n = decode_component("n", n)?;
            let e = decode_component("e", e)?;
            return RsaPublicKey::new(n, e)
                .map_err(|err| TokenError::resolution(format!("key {} is not a valid RSA key: {err}", self.kid)));
        }

        let leaf = self
            .x5c
            .as_ref()
            .and_then(|chain| chain.first())
            .ok_or_else(|| TokenError::resolution(format!("key {} has neither n/e nor x5c", self.kid)))?;
        let der = STANDARD
            .decode(leaf)
            .map_err(|err| TokenError::resolution(format!("key {} has invalid x5c: {err}", self.kid)))?;
        match Certificate::from_der(&der) {
            Ok(cert) => Ok(cert.public_key().clone()),
            Err(err @ TokenError::WrongKeyType { .. }) => Err(err),
            Err(err) => Err(TokenError::resolution(format!("key {} has invalid x5c: {err}", self.kid))),
        }
    }
}

fn decode_component(name: &str, value: &str) -> Result<BigUint, TokenError> {
    URL_SAFE_NO_PAD
        .decode(value.trim_end_matches('='))
        .map(|bytes| BigUint::from_bytes_be(&bytes))
        .map_err(|err| TokenError::resolution(format!("invalid base64url in {name}: {err}")))
}

/// JSON Web Key Set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    /// Keys in document order
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Empty key set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key.
    pub fn push(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// The single entry carrying `kid`.
    ///
    /// # Errors
    ///
    /// `KeyNotFound` for no match, `AmbiguousKey` for more than one.
    pub fn find(&self, kid: &str) -> Result<&Jwk, TokenError> {
        let mut matches = self.keys.iter().filter(|key| key.kid == kid);
        match (matches.next(), matches.count()) {
            (None, _) => Err(TokenError::KeyNotFound { kid: kid.to_string() }),
            (Some(key), 0) => Ok(key),
            (Some(_), rest) => Err(TokenError::AmbiguousKey {
                kid: kid.to_string(),
                count: rest + 1,
            }),
        }
    }

    /// Key identifiers in document order.
    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|key| key.kid.as_str())
    }

    /// Parse a key set document.
    ///
    /// # Errors
    ///
    /// `ResolutionFailed` when the document is not a key set.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TokenError> {
        serde_json::from_slice(bytes).map_err(|e| TokenError::resolution(format!("invalid JWKS document: {e}")))
    }

    /// Serialize as a compact JSON document.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` if serialization fails.
    pub fn to_json(&self) -> Result<String, TokenError> {
        serde_json::to_string(self).map_err(|e| TokenError::malformed(format!("cannot encode JWKS: {e}")))
    }
}

impl FromIterator<Jwk> for JwkSet {
    fn from_iter<I: IntoIterator<Item = Jwk>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
