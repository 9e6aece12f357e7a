//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Certificate authority desk
///
/// Run the API server over a CA directory, or manage certificates through
/// it. Certificate commands keep working from a local replica while the
/// server is unreachable.
#[derive(Parser, Debug)]
#[command(name = "certdesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Server address (default from config, then http://127.0.0.1:8080)
    #[arg(short, long, env = "CERTDESK_SERVER", global = true)]
    pub server: Option<String>,

    /// Act as this user
    #[arg(short, long, env = "CERTDESK_USER", global = true)]
    pub user: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Log filter (e.g. "debug", "certdesk_ca=trace")
    #[arg(long, env = "RUST_LOG", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),

    /// List certificates
    List,

    /// Show the audit history, newest first
    History,

    /// Issue a certificate
    Create(CreateArgs),

    /// Revoke a certificate
    Revoke(RevokeArgs),

    /// Manage user accounts
    Users(UsersArgs),

    /// Check credentials and remember the username
    Login(LoginArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Serve command
// ============================================================================

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Server configuration file (defaults apply if it does not exist)
    #[arg(short, long, env = "CERTDESK_CONFIG", default_value = "certdesk.toml")]
    pub config: PathBuf,
}

// ============================================================================
// Certificate commands
// ============================================================================

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Domain the certificate is issued for
    pub domain: String,

    /// Extra parameter passed to the issuance script
    pub param: String,
}

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Certificate ID (as shown by `certdesk list`)
    pub id: String,
}

// ============================================================================
// Users command
// ============================================================================

#[derive(Args, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommands,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// List accounts
    List,

    /// Create an account (admin only)
    Add {
        /// New username
        username: String,

        /// Password for the new account
        #[arg(short, long, env = "CERTDESK_NEW_PASSWORD")]
        password: String,

        /// Role: admin or user
        #[arg(short, long, default_value = "user")]
        role: String,
    },

    /// Delete an account by ID (admin only, not yourself)
    Delete {
        /// Account ID
        id: String,
    },
}

// ============================================================================
// Login command
// ============================================================================

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username
    pub username: String,

    /// Password
    #[arg(short, long, env = "CERTDESK_PASSWORD")]
    pub password: String,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (server_url, username, output_format, seed_samples)
        key: String,

        /// Value to set
        value: String,
    },

    /// Show config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "certdesk",
            "create",
            "foo.example.com",
            "server",
            "--user",
            "alice",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.user.as_deref(), Some("alice"));
        assert_eq!(cli.output, Some(OutputFormat::Json));
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.domain, "foo.example.com");
                assert_eq!(args.param, "server");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn create_requires_param() {
        assert!(Cli::try_parse_from(["certdesk", "create", "foo.example.com"]).is_err());
    }

    #[test]
    fn users_add_defaults_to_user_role() {
        let cli = Cli::try_parse_from(["certdesk", "users", "add", "bob", "-p", "pw"]).unwrap();
        match cli.command {
            Commands::Users(UsersArgs {
                command: UsersCommands::Add { username, role, .. },
            }) => {
                assert_eq!(username, "bob");
                assert_eq!(role, "user");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
