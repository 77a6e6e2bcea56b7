//! load-jwt: drive an endpoint with freshly issued tokens.

use anyhow::Context;
use clap::Parser;
use jwt_tool::cli::LoadJwtArgs;
use jwt_tool::jwt::{ClaimOverrides, ClaimSetBuilder, SubjectTemplate};
use jwt_tool::{Config, LoadRunner, TokenIssuer};
use rust_common::{init_tracing, TracingConfig};
use std::io::Write;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = LoadJwtArgs::parse();
    init_tracing(
        &TracingConfig::default()
            .with_service_name("load-jwt")
            .with_verbose(args.verbose),
    );

    args.validate()?;
    let config = Config::from_env()?;

    let builder = ClaimSetBuilder::new(config.claim_template(SubjectTemplate::UnixNanos));
    let issuer = TokenIssuer::from_files(&args.cert, &args.key, builder)
        .context("Failed to load signing material")?
        .with_claims_file(&args.claims)?;
    let runner = LoadRunner::new(&args.url, args.count, &config.load_http_config())?;

    let stdout = std::io::stdout();
    let summary = runner
        .run(&issuer, &ClaimOverrides::default(), |response| {
            let mut out = stdout.lock();
            // A closed stdout must not abort the run.
            let _ = write!(out, "{} {}", response.index, response.body);
        })
        .await
        .with_context(|| format!("Load run against {} aborted", args.url))?;

    info!(
        requests = summary.requests,
        failures = summary.failures,
        elapsed = ?summary.elapsed,
        "Done"
    );
    Ok(())
}
