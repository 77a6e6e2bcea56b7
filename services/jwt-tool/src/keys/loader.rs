//! PEM decoding and RSA key parsing.
//!
//! Loaders only look at the bytes they are given. Reading files is left to
//! [`read_pem_file`] so callers decide where material comes from.

use crate::error::TokenError;
use crate::keys::certificate::Certificate;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, ALGORITHM_OID as RSA_ENCRYPTION_OID};
use rsa::pkcs8::der::Decode;
use rsa::pkcs8::{PrivateKeyInfo, SubjectPublicKeyInfoRef};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::path::Path;
use tracing::debug;

const TAG_CERTIFICATE: &str = "CERTIFICATE";
const TAG_PUBLIC_KEY: &str = "PUBLIC KEY";
const TAG_RSA_PUBLIC_KEY: &str = "RSA PUBLIC KEY";
const TAG_PRIVATE_KEY: &str = "PRIVATE KEY";
const TAG_RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";

/// Any of the three kinds of key material the tools consume.
#[derive(Debug, Clone)]
pub enum KeyMaterial {
    /// RSA private key (PKCS#1 or PKCS#8 container)
    PrivateKey(RsaPrivateKey),
    /// RSA public key
    PublicKey(RsaPublicKey),
    /// X.509 certificate carrying an RSA public key
    Certificate(Certificate),
}

impl KeyMaterial {
    /// Decode the first PEM block and parse it according to its label.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` for undecodable PEM or an unknown label, plus any
    /// error of the matching loader.
    pub fn from_pem(bytes: &[u8]) -> Result<Self, TokenError> {
        let block = decode_pem(bytes)?;
        match block.tag() {
            TAG_RSA_PRIVATE_KEY | TAG_PRIVATE_KEY => {
                private_key_from_der(block.contents()).map(Self::PrivateKey)
            }
            TAG_PUBLIC_KEY | TAG_RSA_PUBLIC_KEY => {
                public_key_from_der(block.contents()).map(Self::PublicKey)
            }
            TAG_CERTIFICATE => Certificate::from_der(block.contents()).map(Self::Certificate),
            other => Err(TokenError::malformed(format!("unsupported PEM block {other:?}"))),
        }
    }

    /// The public half of this material.
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        match self {
            Self::PrivateKey(key) => key.to_public_key(),
            Self::PublicKey(key) => key.clone(),
            Self::Certificate(cert) => cert.public_key().clone(),
        }
    }
}

/// Load an RSA private key from PEM bytes.
///
/// The block is parsed as PKCS#1 first, then as PKCS#8.
///
/// # Errors
///
/// `MalformedEncoding` when there is no PEM block or neither container
/// parses, `WrongKeyType` for a PKCS#8 key of another algorithm.
pub fn load_private_key(bytes: &[u8]) -> Result<RsaPrivateKey, TokenError> {
    let block = decode_pem(bytes)?;
    private_key_from_der(block.contents())
}

/// Load an RSA public key from PEM bytes.
///
/// Accepts SubjectPublicKeyInfo, PKCS#1 and, failing both, a certificate
/// whose embedded key is taken.
///
/// # Errors
///
/// `MalformedEncoding` when nothing decodes, `WrongKeyType` for a non-RSA key.
pub fn load_public_key(bytes: &[u8]) -> Result<RsaPublicKey, TokenError> {
    let block = decode_pem(bytes)?;
    match public_key_from_der(block.contents()) {
        Ok(key) => Ok(key),
        Err(err @ TokenError::WrongKeyType { .. }) => Err(err),
        Err(err) => match Certificate::from_der(block.contents()) {
            Ok(cert) => Ok(cert.public_key().clone()),
            Err(cert_err @ TokenError::WrongKeyType { .. }) => Err(cert_err),
            Err(_) => Err(err),
        },
    }
}

/// Load a single X.509 certificate from PEM bytes.
///
/// # Errors
///
/// `MalformedEncoding` for bad PEM or DER, `WrongKeyType` when the
/// certificate does not carry an RSA key.
pub fn load_certificate(bytes: &[u8]) -> Result<Certificate, TokenError> {
    let block = decode_pem(bytes)?;
    Certificate::from_der(block.contents())
}

/// Load every certificate of a PEM bundle, leaf first.
///
/// # Errors
///
/// `MalformedEncoding` when the bundle is empty or any block fails to parse.
pub fn load_certificate_chain(bytes: &[u8]) -> Result<Vec<Certificate>, TokenError> {
    let blocks = pem::parse_many(bytes)
        .map_err(|e| TokenError::malformed(format!("invalid PEM bundle: {e}")))?;
    if blocks.is_empty() {
        return Err(TokenError::malformed("no PEM block found"));
    }

    blocks
        .iter()
        .map(|block| Certificate::from_der(block.contents()))
        .collect()
}

/// Read a PEM file from disk.
///
/// # Errors
///
/// `Io` with the offending path.
pub fn read_pem_file(path: impl AsRef<Path>) -> Result<Vec<u8>, TokenError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading key material");
    read_file(path)
}

/// Read a whole file, keeping the path in the error.
///
/// # Errors
///
/// `Io` with the offending path.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<u8>, TokenError> {
    let path = path.as_ref();
    std::fs::read(path).map_err(|source| TokenError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn decode_pem(bytes: &[u8]) -> Result<pem::Pem, TokenError> {
    pem::parse(bytes).map_err(|e| TokenError::malformed(format!("key must be PEM encoded: {e}")))
}

fn private_key_from_der(der: &[u8]) -> Result<RsaPrivateKey, TokenError> {
    if let Ok(key) = RsaPrivateKey::from_pkcs1_der(der) {
        return Ok(key);
    }

    let info = PrivateKeyInfo::from_der(der).map_err(|e| {
        TokenError::malformed(format!("private key is neither PKCS#1 nor PKCS#8: {e}"))
    })?;
    if info.algorithm.oid != RSA_ENCRYPTION_OID {
        return Err(TokenError::wrong_key_type(format!(
            "private key algorithm {} is not RSA",
            info.algorithm.oid
        )));
    }

    RsaPrivateKey::try_from(info)
        .map_err(|e| TokenError::malformed(format!("invalid RSA private key: {e}")))
}

fn public_key_from_der(der: &[u8]) -> Result<RsaPublicKey, TokenError> {
    match rsa_public_key_from_spki(der) {
        Ok(key) => Ok(key),
        Err(err @ TokenError::WrongKeyType { .. }) => Err(err),
        Err(err) => RsaPublicKey::from_pkcs1_der(der).map_err(|_| err),
    }
}

/// Parse a DER SubjectPublicKeyInfo and require an RSA key.
pub(crate) fn rsa_public_key_from_spki(der: &[u8]) -> Result<RsaPublicKey, TokenError> {
    let spki = SubjectPublicKeyInfoRef::from_der(der)
        .map_err(|e| TokenError::malformed(format!("invalid public key info: {e}")))?;
    if spki.algorithm.oid != RSA_ENCRYPTION_OID {
        return Err(TokenError::wrong_key_type(format!(
            "public key algorithm {} is not RSA",
            spki.algorithm.oid
        )));
    }

    RsaPublicKey::try_from(spki)
        .map_err(|e| TokenError::malformed(format!("invalid RSA public key: {e}")))
}
