//! Command-line arguments of the four binaries.
//!
//! Every flag can also come from the environment variable named next to it.

use crate::error::TokenError;
use crate::jwt::ClaimOverrides;
use crate::load::DEFAULT_REQUEST_COUNT;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Issue an RS256 token signed under an X.509 certificate
#[derive(Parser, Debug, Clone)]
#[command(name = "mk-jwt", version, about, long_about = None)]
pub struct MkJwtArgs {
    /// PEM certificate whose serial becomes the token kid
    #[arg(long, env = "JWT_CERT")]
    pub cert: PathBuf,

    /// PEM RSA private key (PKCS#1 or PKCS#8)
    #[arg(long, env = "JWT_KEY")]
    pub key: PathBuf,

    /// JSON object merged into the claims
    #[arg(long, env = "JWT_CLAIMS")]
    pub claims: Option<PathBuf>,

    /// Value for `sub`, wins over --random and the claims file
    #[arg(long, env = "JWT_SUBJECT")]
    pub subject: Option<String>,

    /// Value for `pol`
    #[arg(long, env = "JWT_POLICY")]
    pub policy: Option<String>,

    /// Lifetime such as 1h, 30m or 24h
    #[arg(long = "exp", value_name = "DURATION", env = "JWT_EXP")]
    pub expiry: Option<String>,

    /// Seconds added to `iat`, may be negative
    #[arg(long, default_value_t = 0, allow_negative_numbers = true, env = "JWT_IAT_OFFSET")]
    pub iat_offset: i64,

    /// Set a random UUID as `sub`
    #[arg(long, env = "JWT_RANDOM")]
    pub random: bool,

    /// Print claims and debug logs
    #[arg(short, long, env = "JWT_TOOL_VERBOSE")]
    pub verbose: bool,
}

impl MkJwtArgs {
    /// Overrides selected by the flags.
    #[must_use]
    pub fn overrides(&self) -> ClaimOverrides {
        ClaimOverrides {
            subject: self.subject.clone(),
            policy: self.policy.clone(),
            expiry: self.expiry.clone(),
            iat_offset: self.iat_offset,
            random_subject: self.random,
        }
    }

    /// Check that every input file exists.
    ///
    /// # Errors
    ///
    /// `Config` naming the first missing file.
    pub fn validate(&self) -> Result<(), TokenError> {
        ensure_file("certificate", &self.cert)?;
        ensure_file("private key", &self.key)?;
        if let Some(claims) = &self.claims {
            ensure_file("claims", claims)?;
        }
        Ok(())
    }
}

/// Verify a token against keys published at a JWKS endpoint
#[derive(Parser, Debug, Clone)]
#[command(name = "check-jwt", version, about, long_about = None)]
pub struct CheckJwtArgs {
    /// Compact token to verify
    #[arg(long, env = "JWT_TOKEN")]
    pub token: String,

    /// JWKS endpoint
    #[arg(long, alias = "jwksURL", env = "JWKS_URL")]
    pub jwks_url: String,

    /// Fetch timeout in seconds, overrides JWKS_FETCH_TIMEOUT
    #[arg(long, env = "JWKS_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Skip TLS certificate verification for the JWKS fetch
    #[arg(long, env = "JWKS_INSECURE")]
    pub insecure: bool,

    /// Debug logs
    #[arg(short, long, env = "JWT_TOOL_VERBOSE")]
    pub verbose: bool,
}

/// Print a JWKS document describing the given certificates
#[derive(Parser, Debug, Clone)]
#[command(name = "mk-jwks", version, about, long_about = None)]
pub struct MkJwksArgs {
    /// PEM files, one key each; extra certificates in a file form its x5c chain
    #[arg(required = true, value_name = "CERT")]
    pub certs: Vec<PathBuf>,

    /// Debug logs
    #[arg(short, long, env = "JWT_TOOL_VERBOSE")]
    pub verbose: bool,
}

impl MkJwksArgs {
    /// Check that every certificate file exists.
    ///
    /// # Errors
    ///
    /// `Config` naming the first missing file.
    pub fn validate(&self) -> Result<(), TokenError> {
        self.certs.iter().try_for_each(|cert| ensure_file("certificate", cert))
    }
}

/// Call an endpoint repeatedly, each time with a freshly issued token
#[derive(Parser, Debug, Clone)]
#[command(name = "load-jwt", version, about, long_about = None)]
pub struct LoadJwtArgs {
    /// PEM certificate whose serial becomes the token kid
    #[arg(long, env = "JWT_CERT")]
    pub cert: PathBuf,

    /// PEM RSA private key (PKCS#1 or PKCS#8)
    #[arg(long, env = "JWT_KEY")]
    pub key: PathBuf,

    /// JSON object merged into the claims
    #[arg(long, env = "JWT_CLAIMS")]
    pub claims: PathBuf,

    /// Endpoint to call
    #[arg(long, env = "LOAD_URL")]
    pub url: String,

    /// Number of requests
    #[arg(long, default_value_t = DEFAULT_REQUEST_COUNT, env = "LOAD_COUNT")]
    pub count: u64,

    /// Debug logs
    #[arg(short, long, env = "JWT_TOOL_VERBOSE")]
    pub verbose: bool,
}

impl LoadJwtArgs {
    /// Check that every input file exists.
    ///
    /// # Errors
    ///
    /// `Config` naming the first missing file.
    pub fn validate(&self) -> Result<(), TokenError> {
        ensure_file("certificate", &self.cert)?;
        ensure_file("private key", &self.key)?;
        ensure_file("claims", &self.claims)
    }
}

/// Require `path` to be an existing regular file.
///
/// # Errors
///
/// `Config` when it is missing or not a regular file.
pub fn ensure_file(what: &str, path: &Path) -> Result<(), TokenError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(TokenError::config(format!(
            "{what} path {} is not a regular file",
            path.display()
        ))),
        Err(e) => Err(TokenError::config(format!(
            "cannot access {what} file {}: {e}",
            path.display()
        ))),
    }
}
