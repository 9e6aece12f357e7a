//! `certdesk users` and `certdesk login` - account administration.

use anyhow::Result;
use certdesk_core::Role;
use colored::Colorize;

use super::Context;
use crate::cli::args::{LoginArgs, UsersArgs, UsersCommands};
use crate::config::Config;
use crate::output::{self, OutputFormat, UserRow};

pub async fn execute(ctx: Context, args: UsersArgs) -> Result<()> {
    match args.command {
        UsersCommands::List => list_users(ctx).await,
        UsersCommands::Add {
            username,
            password,
            role,
        } => add_user(ctx, &username, &password, &role).await,
        UsersCommands::Delete { id } => delete_user(ctx, &id).await,
    }
}

async fn list_users(ctx: Context) -> Result<()> {
    let users = ctx.client()?.users().list().await?;
    let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&users)?,
        OutputFormat::Csv => output::print_csv(&rows)?,
        OutputFormat::Pretty => {
            println!("{}", "Accounts:".bold());
            println!();
            output::print_table(&rows, "No accounts.");
        }
    }

    Ok(())
}

async fn add_user(ctx: Context, username: &str, password: &str, role: &str) -> Result<()> {
    let role: Role = role.parse()?;
    let user = ctx
        .client()?
        .users()
        .create(ctx.username.as_deref(), username, password, role)
        .await?;

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&user)?,
        _ => println!(
            "{} created {} ({}) with id {}",
            "Success:".green().bold(),
            user.username.cyan(),
            user.role,
            user.id
        ),
    }
    Ok(())
}

async fn delete_user(ctx: Context, id: &str) -> Result<()> {
    ctx.client()?
        .users()
        .delete(ctx.username.as_deref(), id)
        .await?;
    println!("{} account {id} deleted.", "Success:".green().bold());
    Ok(())
}

pub async fn login(ctx: Context, args: LoginArgs) -> Result<()> {
    let user = ctx
        .client()?
        .users()
        .login(&args.username, &args.password)
        .await?;

    let mut config = Config::load()?;
    config.username = Some(user.username.clone());
    config.save()?;

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&user)?,
        _ => println!(
            "{} logged in as {} ({}).",
            "Success:".green().bold(),
            user.username.cyan(),
            user.role
        ),
    }
    Ok(())
}
