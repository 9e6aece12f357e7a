//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;

use crate::config::Config;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_level.as_deref(), &cli.command);

    // Load configuration
    let config = Config::load()?;

    // Flags and environment override the config file
    let ctx = commands::Context {
        server_url: cli
            .server
            .clone()
            .unwrap_or_else(|| config.server_url().to_string()),
        username: cli.user.clone().or_else(|| config.username.clone()),
        output_format: cli.output.or(config.output_format).unwrap_or_default(),
        seed_samples: config.seed_samples,
        replica_path: Config::replica_path().ok(),
    };

    // Dispatch to appropriate command
    match cli.command {
        Commands::Serve(args) => commands::serve::execute(args).await,
        Commands::List => commands::certs::list(ctx).await,
        Commands::History => commands::history::execute(ctx).await,
        Commands::Create(args) => commands::certs::create(ctx, args).await,
        Commands::Revoke(args) => commands::certs::revoke(ctx, args).await,
        Commands::Users(args) => commands::users::execute(ctx, args).await,
        Commands::Login(args) => commands::users::login(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args),
    }
}

/// Logs go to stderr so JSON and CSV output stay clean. The server logs
/// requests at `info`; client commands only surface warnings.
fn init_logging(level: Option<&str>, command: &Commands) {
    let default = if matches!(command, Commands::Serve(_)) {
        "info"
    } else {
        "warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_new(level.unwrap_or(default))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
