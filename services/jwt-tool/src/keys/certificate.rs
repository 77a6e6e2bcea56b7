//! Owned view of a parsed X.509 signing certificate.

use crate::error::TokenError;
use crate::keys::loader::rsa_public_key_from_spki;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use rsa::RsaPublicKey;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x509_parser::prelude::*;

/// sha256WithRSAEncryption
const SHA256_WITH_RSA_OID: &str = "1.2.840.113549.1.1.11";

/// A certificate whose embedded key is RSA.
///
/// The serial number, rendered in decimal, is the key identifier stamped
/// into every token signed with the matching private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    der: Vec<u8>,
    serial: String,
    subject: String,
    signature_algorithm: String,
    not_after: i64,
    public_key: RsaPublicKey,
}

impl Certificate {
    /// Parse a DER encoded certificate.
    ///
    /// # Errors
    ///
    /// `MalformedEncoding` on invalid DER or bytes after the certificate,
    /// `WrongKeyType` when the embedded key is not RSA.
    pub fn from_der(der: &[u8]) -> Result<Self, TokenError> {
        let (rest, cert) = X509Certificate::from_der(der)
            .map_err(|e| TokenError::malformed(format!("invalid certificate DER: {e}")))?;
        if !rest.is_empty() {
            return Err(TokenError::malformed("trailing data after certificate"));
        }

        let public_key = rsa_public_key_from_spki(cert.public_key().raw)?;

        Ok(Self {
            der: der.to_vec(),
            serial: cert.tbs_certificate.serial.to_string(),
            subject: cert.subject().to_string(),
            signature_algorithm: cert.signature_algorithm.algorithm.to_id_string(),
            not_after: cert.validity().not_after.timestamp(),
            public_key,
        })
    }

    /// Serial number in decimal form.
    #[must_use]
    pub fn serial_number(&self) -> &str {
        &self.serial
    }

    /// Key identifier for tokens signed under this certificate.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.serial
    }

    /// Embedded RSA public key.
    #[must_use]
    pub const fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// Raw DER bytes.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Expiry as a Unix timestamp.
    #[must_use]
    pub const fn not_after(&self) -> i64 {
        self.not_after
    }

    /// JWS algorithm name matching the certificate's own signature algorithm.
    ///
    /// # Errors
    ///
    /// `WrongKeyType` for anything other than sha256WithRSAEncryption.
    pub fn jws_algorithm(&self) -> Result<&'static str, TokenError> {
        if self.signature_algorithm == SHA256_WITH_RSA_OID {
            Ok("RS256")
        } else {
            Err(TokenError::wrong_key_type(format!(
                "unsupported certificate signature algorithm {}",
                self.signature_algorithm
            )))
        }
    }

    /// Standard base64 DER, as carried in a JWK `x5c` array.
    #[must_use]
    pub fn to_x5c(&self) -> String {
        STANDARD.encode(&self.der)
    }

    /// base64url SHA-1 thumbprint (`x5t`).
    #[must_use]
    pub fn sha1_thumbprint(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha1::digest(&self.der))
    }

    /// base64url SHA-256 thumbprint (`x5t#S256`).
    #[must_use]
    pub fn sha256_thumbprint(&self) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(&self.der))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::loader::load_certificate;

    const SIGNING_CERT: &[u8] = include_bytes!("../../tests/fixtures/signing.crt");

    #[test]
    fn test_serial_is_decimal_key_id() {
        let cert = load_certificate(SIGNING_CERT).unwrap();
        assert_eq!(cert.serial_number(), "12345");
        assert_eq!(cert.key_id(), "12345");
    }

    #[test]
    fn test_metadata() {
        let cert = load_certificate(SIGNING_CERT).unwrap();
        assert!(cert.subject().contains("jwt-tool test signer"));
        assert_eq!(cert.jws_algorithm().unwrap(), "RS256");
        assert!(cert.not_after() > chrono::Utc::now().timestamp());
    }

    #[test]
    fn test_thumbprints() {
        let cert = load_certificate(SIGNING_CERT).unwrap();
        // 20 and 32 byte digests, unpadded base64url
        assert_eq!(cert.sha1_thumbprint().len(), 27);
        assert_eq!(cert.sha256_thumbprint().len(), 43);
        assert_eq!(STANDARD.decode(cert.to_x5c()).unwrap(), cert.der());
    }

    #[test]
    fn test_garbage_der_is_malformed() {
        let err = Certificate::from_der(&[0x30, 0x03, 0x02, 0x01]).unwrap_err();
        assert!(matches!(err, TokenError::MalformedEncoding { .. }));
    }

    #[test]
    fn test_trailing_der_is_malformed() {
        let cert = load_certificate(SIGNING_CERT).unwrap();
        let mut der = cert.der().to_vec();
        der.extend_from_slice(b"\x00\x01garbage");

        let err = Certificate::from_der(&der).unwrap_err();
        assert!(matches!(err, TokenError::MalformedEncoding { .. }));
        assert!(err.to_string().contains("trailing data"));
    }
}
