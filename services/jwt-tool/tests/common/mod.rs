//! Shared fixtures for integration tests.

#![allow(dead_code)]

use jwt_tool::jwt::{ClaimSetBuilder, TokenSigner};
use jwt_tool::keys::{load_certificate, load_private_key, Certificate};
use jwt_tool::{Jwk, JwkSet, TokenIssuer};
use std::path::PathBuf;

/// Absolute path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Contents of a fixture file.
pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture_path(name)).unwrap()
}

/// Certificate with serial 12345.
pub fn signing_cert() -> Certificate {
    load_certificate(&fixture("signing.crt")).unwrap()
}

/// Certificate with serial 67890, unrelated key.
pub fn other_cert() -> Certificate {
    load_certificate(&fixture("other.crt")).unwrap()
}

/// Signer for the key behind `signing.crt`.
pub fn signer() -> TokenSigner {
    TokenSigner::new(&load_private_key(&fixture("signing.key")).unwrap()).unwrap()
}

/// Issuer for `signing.crt` with the default template.
pub fn issuer() -> TokenIssuer {
    TokenIssuer::from_pem(
        &fixture("signing.crt"),
        &fixture("signing.key"),
        ClaimSetBuilder::default(),
    )
    .unwrap()
}

/// Key set publishing both fixture certificates.
pub fn key_set() -> JwkSet {
    [
        Jwk::from_chain(&[signing_cert()]).unwrap(),
        Jwk::from_chain(&[other_cert()]).unwrap(),
    ]
    .into_iter()
    .collect()
}
