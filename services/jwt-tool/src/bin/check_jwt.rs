//! check-jwt: verify a token against a JWKS endpoint and print its claims.

use anyhow::Context;
use clap::Parser;
use jwt_tool::cli::CheckJwtArgs;
use jwt_tool::jwks::HttpKeySetProvider;
use jwt_tool::{Config, JwksResolver, TokenVerifier};
use rust_common::{init_tracing, TracingConfig};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CheckJwtArgs::parse();
    init_tracing(
        &TracingConfig::default()
            .with_service_name("check-jwt")
            .with_verbose(args.verbose),
    );

    let mut config = Config::from_env()?;
    if let Some(secs) = args.timeout_secs {
        config = config.with_jwks_fetch_timeout(Duration::from_secs(secs));
    }

    let provider = HttpKeySetProvider::new(&args.jwks_url, &config.jwks_http_config(args.insecure))?;
    let verifier = TokenVerifier::new(JwksResolver::new(provider));

    let claims = verifier
        .verify(args.token.trim())
        .await
        .with_context(|| format!("Token rejected using keys from {}", args.jwks_url))?;

    for (name, value) in claims.iter() {
        println!("{name}\t{value}");
    }

    Ok(())
}
