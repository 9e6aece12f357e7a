//! Configuration management.

use anyhow::Result;
use certdesk_client::DEFAULT_BASE_URL;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// certdesk server address.
    pub server_url: Option<String>,

    /// Username recorded as the actor for create/revoke and used as the
    /// caller for account administration.
    pub username: Option<String>,

    /// Default output format.
    pub output_format: Option<OutputFormat>,

    /// Show sample certificates when the server has never been reached.
    #[serde(default = "default_true")]
    pub seed_samples: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            username: None,
            output_format: None,
            seed_samples: true,
        }
    }
}

const fn default_true() -> bool {
    true
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "certdesk", "certdesk")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

impl Config {
    /// Get the config file path.
    pub fn path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where the client replica is kept between runs.
    pub fn replica_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("replica.json"))
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load configuration from `path`, defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Server address, or the default.
    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Update one key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "server_url" | "server" => self.server_url = Some(value.to_string()),
            "username" | "user" => self.username = Some(value.to_string()),
            "output_format" | "output" => self.output_format = Some(value.parse()?),
            "seed_samples" => self.seed_samples = value.parse()?,
            _ => anyhow::bail!(
                "Unknown config key: {key}\n\n\
                 Available keys:\n  \
                 server_url     - certdesk server address\n  \
                 username       - Your username\n  \
                 output_format  - Default output format (pretty/json/csv)\n  \
                 seed_samples   - Show sample data before the first sync (true/false)"
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server_url(), DEFAULT_BASE_URL);
        assert!(config.seed_samples);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn set_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.set("server", "http://ca.internal:8080").unwrap();
        config.set("username", "alice").unwrap();
        config.set("output_format", "csv").unwrap();
        config.set("seed_samples", "false").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server_url(), "http://ca.internal:8080");
        assert_eq!(loaded.username.as_deref(), Some("alice"));
        assert_eq!(loaded.output_format, Some(OutputFormat::Csv));
        assert!(!loaded.seed_samples);
    }

    #[test]
    fn rejects_unknown_key_and_bad_values() {
        let mut config = Config::default();
        assert!(config.set("api_key", "x").is_err());
        assert!(config.set("seed_samples", "maybe").is_err());
        assert!(config.set("output_format", "yaml").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn seed_samples_defaults_on_when_absent() {
        let config: Config = toml::from_str("username = \"bob\"\n").unwrap();
        assert!(config.seed_samples);
    }
}
