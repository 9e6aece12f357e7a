//! `certdesk serve` - run the HTTP API server.

use anyhow::Result;
use certdesk_srv::{server, ServerConfig};
use tracing::info;

use crate::cli::args::ServeArgs;

pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::load(&args.config)?;
    info!(
        config = %args.config.display(),
        certs_dir = %config.authority.certs_dir.display(),
        "starting certdesk server"
    );
    server::run(&config).await?;
    Ok(())
}
