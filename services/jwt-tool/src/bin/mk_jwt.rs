//! mk-jwt: issue one RS256 token under a certificate and check it verifies.

use anyhow::Context;
use clap::Parser;
use jwt_tool::cli::MkJwtArgs;
use jwt_tool::jwt::{verify_with_key, ClaimSetBuilder, SubjectTemplate};
use jwt_tool::{Config, TokenIssuer};
use rust_common::{init_tracing, TracingConfig};
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let args = MkJwtArgs::parse();
    init_tracing(
        &TracingConfig::default()
            .with_service_name("mk-jwt")
            .with_verbose(args.verbose),
    );

    args.validate()?;
    let config = Config::from_env()?;

    let builder = ClaimSetBuilder::new(config.claim_template(SubjectTemplate::Uuid));
    let mut issuer = TokenIssuer::from_files(&args.cert, &args.key, builder)
        .context("Failed to load signing material")?;
    if let Some(claims) = &args.claims {
        issuer = issuer.with_claims_file(claims)?;
    }

    let issued = issuer
        .issue(&args.overrides())
        .context("Failed to create token")?;
    println!("{}", issued.token);

    // The certificate and key must belong together or consumers will reject the token.
    let verified = verify_with_key(issued.token.as_str(), issuer.certificate().public_key())
        .context("Issued token does not verify against the certificate")?;
    debug!(kid = %issuer.certificate().key_id(), "Token verified against certificate");

    if args.verbose {
        println!();
        println!("Claims:");
        for (name, value) in verified.iter() {
            println!("{name}\t->\t{value}");
        }
    }

    Ok(())
}
