//! Certificate-backed RS256 token tooling.
//!
//! Loads RSA keys and X.509 certificates, composes and signs claim sets,
//! publishes JWKS documents and verifies tokens against a certificate or a
//! remote key set. The binaries under `src/bin` are thin wrappers around
//! this library.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod issue;
pub mod jwks;
pub mod jwt;
pub mod keys;
pub mod load;

// Re-exports for convenience
pub use config::Config;
pub use error::TokenError;
pub use issue::{IssuedToken, TokenIssuer};
pub use jwks::{DirectResolver, Jwk, JwkSet, JwksResolver, KeyResolver};
pub use jwt::{ClaimOverrides, ClaimSet, ClaimSetBuilder, ClaimValue, SignedToken, TokenVerifier};
pub use keys::{Certificate, KeyMaterial};
pub use load::LoadRunner;
