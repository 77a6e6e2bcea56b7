//! Claim sets, token signing and verification.

pub mod builder;
pub mod claims;
pub mod signer;
pub mod verifier;

pub use builder::{parse_duration, ClaimOverrides, ClaimSetBuilder, ClaimTemplate, SubjectTemplate};
pub use claims::{ClaimSet, ClaimValue};
pub use signer::{sign, SignedToken, TokenHeader, TokenSigner};
pub use verifier::{verify_with_key, TokenVerifier};
