//! Filesystem and action configuration for a certificate authority.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where the external CA tooling keeps its state. Read only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// Directory of issued `*.cert.pem` files
    #[serde(default = "default_certs_dir")]
    pub certs_dir: PathBuf,

    /// Directory of `*.key.pem` private keys
    #[serde(default = "default_private_dir")]
    pub private_dir: PathBuf,

    /// OpenSSL-style revocation ledger (`index.txt`)
    #[serde(default = "default_index_file")]
    pub index_file: PathBuf,
}

/// External issuance/revocation scripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    /// Called as `<issue_script> <domain> <additional-param>`
    #[serde(default = "default_issue_script")]
    pub issue_script: PathBuf,

    /// Called as `<revoke_script> <certificate-id>`
    #[serde(default = "default_revoke_script")]
    pub revoke_script: PathBuf,

    /// Kill an action that runs longer than this (seconds)
    #[serde(default = "default_action_timeout")]
    pub timeout_secs: u64,

    /// POSIX shell used to run the scripts
    #[serde(default = "default_shell")]
    pub shell: PathBuf,
}

/// Files owned and written by certdesk itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Append-only audit log (JSON lines)
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,

    /// User account store
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            certs_dir: default_certs_dir(),
            private_dir: default_private_dir(),
            index_file: default_index_file(),
        }
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            issue_script: default_issue_script(),
            revoke_script: default_revoke_script(),
            timeout_secs: default_action_timeout(),
            shell: default_shell(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            audit_log: default_audit_log(),
            users_file: default_users_file(),
        }
    }
}

impl ActionsConfig {
    /// Timeout as a [`Duration`]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Default value functions for serde.
fn default_certs_dir() -> PathBuf {
    PathBuf::from("/root/tls/intermediate/certs")
}

fn default_private_dir() -> PathBuf {
    PathBuf::from("/root/tls/intermediate/private")
}

fn default_index_file() -> PathBuf {
    PathBuf::from("/root/tls/intermediate/index.txt")
}

fn default_issue_script() -> PathBuf {
    PathBuf::from("/root/scripts/create_cert.sh")
}

fn default_revoke_script() -> PathBuf {
    PathBuf::from("/root/scripts/revoke_cert.sh")
}

const fn default_action_timeout() -> u64 {
    120
}

fn default_shell() -> PathBuf {
    PathBuf::from("/bin/sh")
}

fn default_audit_log() -> PathBuf {
    PathBuf::from("/var/lib/certdesk/certificate_actions.log")
}

fn default_users_file() -> PathBuf {
    PathBuf::from("/var/lib/certdesk/users.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_intermediate_layout() {
        let authority = AuthorityConfig::default();
        assert!(authority.certs_dir.ends_with("intermediate/certs"));
        assert!(authority.index_file.ends_with("index.txt"));

        let actions = ActionsConfig::default();
        assert_eq!(actions.timeout(), Duration::from_secs(120));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let actions: ActionsConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(actions.timeout_secs, 5);
        assert_eq!(actions.shell, PathBuf::from("/bin/sh"));
    }
}
