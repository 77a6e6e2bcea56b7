//! mk-jwks: print a JWKS document for one or more certificate files.

use anyhow::Context;
use clap::Parser;
use jwt_tool::cli::MkJwksArgs;
use jwt_tool::keys::{load_certificate_chain, read_pem_file};
use jwt_tool::{Jwk, JwkSet};
use rust_common::{init_tracing, TracingConfig};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let args = MkJwksArgs::parse();
    init_tracing(
        &TracingConfig::default()
            .with_service_name("mk-jwks")
            .with_verbose(args.verbose),
    );

    args.validate()?;

    let mut set = JwkSet::new();
    for path in &args.certs {
        info!(path = %path.display(), "Loading certificate");
        let chain = load_certificate_chain(&read_pem_file(path)?)
            .with_context(|| format!("Cannot parse {}", path.display()))?;
        let jwk = Jwk::from_chain(&chain).with_context(|| format!("Cannot describe {}", path.display()))?;
        set.push(jwk);
    }

    println!("{}", set.to_json()?);
    Ok(())
}
