//! `certdesk config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::{self, OutputFormat};

pub fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&key, &value),
        ConfigCommands::Path => show_path(),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = Config::load()?;

    if ctx.output_format == OutputFormat::Json {
        return output::print_json(&config);
    }

    let unset = || "(not set)".dimmed().to_string();
    println!("{}", "Current Configuration:".bold());
    println!();
    println!(
        "  {} {}",
        "server_url:".bold(),
        config.server_url.clone().unwrap_or_else(unset)
    );
    println!(
        "  {} {}",
        "username:".bold(),
        config.username.clone().unwrap_or_else(unset)
    );
    println!(
        "  {} {}",
        "output_format:".bold(),
        config.output_format.unwrap_or_default()
    );
    println!("  {} {}", "seed_samples:".bold(), config.seed_samples);

    Ok(())
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;
    println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    Ok(())
}

fn show_path() -> Result<()> {
    println!("{}", Config::path()?.display());
    Ok(())
}
