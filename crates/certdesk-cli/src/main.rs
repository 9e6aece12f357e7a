//! certdesk - certificate authority desk
//!
//! Runs the API server and manages certificates from the command line.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    certdesk_cli::run().await
}
