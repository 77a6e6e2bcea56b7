//! JWKS documents, key set providers and key resolvers.

pub mod model;
pub mod provider;
pub mod resolver;

pub use model::{Jwk, JwkSet};
pub use provider::{CachingKeySetProvider, HttpKeySetProvider, KeySetProvider, StaticKeySetProvider};
pub use resolver::{DirectResolver, JwksResolver, KeyResolver};
