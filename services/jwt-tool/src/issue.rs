//! Token issuance from a certificate, its private key and a claims document.

use crate::error::TokenError;
use crate::jwt::{ClaimOverrides, ClaimSet, ClaimSetBuilder, SignedToken, TokenHeader, TokenSigner};
use crate::keys::{load_certificate, load_private_key, read_file, read_pem_file, Certificate};
use std::path::Path;
use tracing::{debug, info};

/// A freshly signed token and the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact token
    pub token: SignedToken,
    /// Claims that were signed
    pub claims: ClaimSet,
}

/// Issues tokens under one certificate.
///
/// Key material and the claims document are loaded once; every call to
/// [`TokenIssuer::issue`] builds and signs a fresh claim set.
#[derive(Debug)]
pub struct TokenIssuer {
    certificate: Certificate,
    signer: TokenSigner,
    builder: ClaimSetBuilder,
    document: ClaimSet,
}

impl TokenIssuer {
    /// Issuer from PEM bytes.
    ///
    /// # Errors
    ///
    /// Key loading and signer preparation errors.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8], builder: ClaimSetBuilder) -> Result<Self, TokenError> {
        let certificate = load_certificate(cert_pem)?;
        let key = load_private_key(key_pem)?;
        let signer = TokenSigner::new(&key)?;
        info!(kid = %certificate.key_id(), subject = %certificate.subject(), "Loaded signing certificate");

        Ok(Self {
            certificate,
            signer,
            builder,
            document: ClaimSet::new(),
        })
    }

    /// Issuer from files on disk.
    ///
    /// # Errors
    ///
    /// `Io` when a file cannot be read, plus [`TokenIssuer::from_pem`] errors.
    pub fn from_files(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
        builder: ClaimSetBuilder,
    ) -> Result<Self, TokenError> {
        let cert_pem = read_pem_file(cert_path)?;
        let key_pem = read_pem_file(key_path)?;
        Self::from_pem(&cert_pem, &key_pem, builder)
    }

    /// Merge `document` into every token.
    #[must_use]
    pub fn with_claims(mut self, document: ClaimSet) -> Self {
        self.document = document;
        self
    }

    /// Load the claims document from a JSON file.
    ///
    /// # Errors
    ///
    /// `Io` when unreadable, `MalformedEncoding` when not a JSON object.
    pub fn with_claims_file(self, path: impl AsRef<Path>) -> Result<Self, TokenError> {
        let path = path.as_ref();
        let document = ClaimSet::from_json_slice(&read_file(path)?)?;
        debug!(path = %path.display(), claims = document.len(), "Loaded claims document");
        Ok(self.with_claims(document))
    }

    /// Signing certificate.
    #[must_use]
    pub const fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Build and sign a new token.
    ///
    /// # Errors
    ///
    /// `InvalidExpiry` or `SigningFailed`; no token is produced on error.
    pub fn issue(&self, overrides: &ClaimOverrides) -> Result<IssuedToken, TokenError> {
        let claims = self.builder.build(&self.document, overrides)?;
        let token = self
            .signer
            .sign(&claims, &TokenHeader::for_certificate(&self.certificate))?;
        Ok(IssuedToken { token, claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::claims::names;
    use crate::jwt::verify_with_key;

    const SIGNING_KEY: &[u8] = include_bytes!("../tests/fixtures/signing.key");
    const SIGNING_CERT: &[u8] = include_bytes!("../tests/fixtures/signing.crt");

    #[test]
    fn test_issue_signs_built_claims() {
        let issuer = TokenIssuer::from_pem(SIGNING_CERT, SIGNING_KEY, ClaimSetBuilder::default())
            .unwrap()
            .with_claims([("role", "admin")].into_iter().collect());

        let issued = issuer.issue(&ClaimOverrides::default().with_policy("p1")).unwrap();
        assert_eq!(issued.token.header().unwrap().kid, "12345");
        assert_eq!(issued.claims.get_str("role"), Some("admin"));
        assert_eq!(issued.claims.get_str(names::POL), Some("p1"));

        let verified = verify_with_key(issued.token.as_str(), issuer.certificate().public_key()).unwrap();
        assert_eq!(verified, issued.claims);
    }

    #[test]
    fn test_each_issue_is_fresh() {
        let issuer = TokenIssuer::from_pem(SIGNING_CERT, SIGNING_KEY, ClaimSetBuilder::default()).unwrap();
        let a = issuer.issue(&ClaimOverrides::default()).unwrap();
        let b = issuer.issue(&ClaimOverrides::default()).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_bad_expiry_yields_no_token() {
        let issuer = TokenIssuer::from_pem(SIGNING_CERT, SIGNING_KEY, ClaimSetBuilder::default()).unwrap();
        let err = issuer.issue(&ClaimOverrides::default().with_expiry("tomorrow")).unwrap_err();
        assert!(matches!(err, TokenError::InvalidExpiry { .. }));
    }

    #[test]
    fn test_missing_claims_file() {
        let issuer = TokenIssuer::from_pem(SIGNING_CERT, SIGNING_KEY, ClaimSetBuilder::default()).unwrap();
        let err = issuer.with_claims_file("/nonexistent/claims.json").unwrap_err();
        assert!(matches!(err, TokenError::Io { .. }));
    }

    #[test]
    fn test_claims_file_is_loaded() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/claims.json");
        let issuer = TokenIssuer::from_pem(SIGNING_CERT, SIGNING_KEY, ClaimSetBuilder::default())
            .unwrap()
            .with_claims_file(path)
            .unwrap();
        let expected = ClaimSet::from_json_slice(&read_file(path).unwrap()).unwrap();

        let issued = issuer.issue(&ClaimOverrides::default()).unwrap();
        for (name, value) in expected.iter() {
            if name != names::SUB {
                assert_eq!(issued.claims.get(name), Some(value), "{name}");
            }
        }
    }
}
