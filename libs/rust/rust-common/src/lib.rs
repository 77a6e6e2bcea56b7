//! Shared library for cross-cutting concerns in jwt-tool crates.
//!
//! This crate provides centralized implementations for:
//! - Error types with retryability classification
//! - HTTP client configuration and building
//! - Tracing subscriber initialisation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{build_http_client, HttpConfig};
pub use tracing_config::{init_tracing, TracingConfig};
