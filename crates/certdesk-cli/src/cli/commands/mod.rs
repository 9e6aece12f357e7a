//! Command implementations.

pub mod certs;
pub mod config;
pub mod history;
pub mod serve;
pub mod users;

use anyhow::Result;
use certdesk_client::sync::{SyncConfig, Synchronizer};
use certdesk_client::CertdeskClient;
use certdesk_core::resolve_actor;
use colored::Colorize;
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Server address
    pub server_url: String,

    /// Acting user, if known
    pub username: Option<String>,

    /// Output format
    pub output_format: OutputFormat,

    /// Seed sample data before the first successful sync
    pub seed_samples: bool,

    /// Where the replica is persisted
    pub replica_path: Option<PathBuf>,
}

impl Context {
    /// Name recorded in the audit trail for this invocation.
    pub fn actor(&self) -> &str {
        resolve_actor(self.username.as_deref())
    }

    /// Create an API client for the configured server.
    pub fn client(&self) -> Result<CertdeskClient> {
        Ok(CertdeskClient::new(&self.server_url)?)
    }

    /// Open the replica synchronizer over the configured server.
    pub async fn synchronizer(&self) -> Result<Synchronizer<CertdeskClient>> {
        let config = SyncConfig {
            replica_path: self.replica_path.clone(),
            seed_samples: self.seed_samples,
        };
        Ok(Synchronizer::open(self.client()?, config).await)
    }

    /// Refresh, warning on stderr when the data shown will be stale.
    pub async fn refresh(&self, sync: &Synchronizer<CertdeskClient>) {
        if let Err(e) = sync.refresh().await {
            eprintln!(
                "{} could not reach {} ({e}); showing local data",
                "Warning:".yellow().bold(),
                self.server_url
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(username: Option<&str>) -> Context {
        Context {
            server_url: "http://127.0.0.1:8080".into(),
            username: username.map(str::to_string),
            output_format: OutputFormat::Pretty,
            seed_samples: true,
            replica_path: None,
        }
    }

    #[test]
    fn actor_falls_back_to_system() {
        assert_eq!(ctx(None).actor(), "system");
        assert_eq!(ctx(Some("alice")).actor(), "alice");
    }

    #[test]
    fn bad_server_url_is_an_error() {
        let mut context = ctx(None);
        context.server_url = "not a url".into();
        assert!(context.client().is_err());
    }
}
