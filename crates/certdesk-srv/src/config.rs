//! Server configuration.

use certdesk_ca::{ActionsConfig, AuthorityConfig, StorageConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Configuration for a certdesk API server.
///
/// ```toml
/// listen = "127.0.0.1:8080"
///
/// [authority]
/// certs_dir = "/root/tls/intermediate/certs"
///
/// [actions]
/// timeout_secs = 60
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address (default: 127.0.0.1:8080).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// CA directory layout.
    #[serde(default)]
    pub authority: AuthorityConfig,

    /// Issuance/revocation scripts.
    #[serde(default)]
    pub actions: ActionsConfig,

    /// Audit log and user store.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            authority: AuthorityConfig::default(),
            actions: ActionsConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse config from TOML text.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::SrvError::Config(e.to_string()))
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(
            config.authority.index_file,
            PathBuf::from("/root/tls/intermediate/index.txt")
        );
        assert_eq!(config.actions.timeout_secs, 120);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml(
            r#"
listen = "0.0.0.0:9000"

[actions]
issue_script = "/opt/ca/issue.sh"
timeout_secs = 30

[storage]
audit_log = "/tmp/actions.log"
"#,
        )
        .unwrap();
        assert_eq!(config.listen.port(), 9000);
        assert_eq!(config.actions.issue_script, PathBuf::from("/opt/ca/issue.sh"));
        assert_eq!(
            config.actions.revoke_script,
            PathBuf::from("/root/scripts/revoke_cert.sh")
        );
        assert_eq!(config.storage.audit_log, PathBuf::from("/tmp/actions.log"));
        assert_eq!(
            config.authority.certs_dir,
            PathBuf::from("/root/tls/intermediate/certs")
        );
    }

    #[test]
    fn invalid_toml_is_rejected() {
        assert!(matches!(
            ServerConfig::from_toml("listen = 12"),
            Err(crate::SrvError::Config(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::load(&dir.path().join("certdesk.toml")).unwrap();
        assert_eq!(config.listen, default_listen());
    }
}
