//! `certdesk list|create|revoke` - certificates through the replica.

use anyhow::Result;
use certdesk_client::sync::{MutationOutcome, ReplicaOrigin};
use chrono::Utc;
use colored::Colorize;
use serde_json::json;

use super::Context;
use crate::cli::args::{CreateArgs, RevokeArgs};
use crate::output::{self, CertificateRow, OutputFormat};

pub async fn list(ctx: Context) -> Result<()> {
    let sync = ctx.synchronizer().await?;
    ctx.refresh(&sync).await;
    let replica = sync.replica().await;

    let now = Utc::now();
    let mut rows: Vec<CertificateRow> = replica
        .certificates
        .iter()
        .map(|c| CertificateRow::new(c, now))
        .collect();

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&replica.certificates)?,
        OutputFormat::Csv => output::print_csv(&rows)?,
        OutputFormat::Pretty => {
            println!("{}", "Certificates:".bold());
            println!();
            for row in &mut rows {
                row.status = output::colorize_status(&row.status);
            }
            output::print_table(&rows, "No certificates found.");

            match replica.origin {
                ReplicaOrigin::Seeded => {
                    println!();
                    println!("{}", "Sample data: the server has not been reached yet.".dimmed());
                }
                ReplicaOrigin::Diverged { since } => {
                    println!();
                    println!(
                        "{}",
                        format!(
                            "Includes local changes since {} not confirmed by the server.",
                            since.format("%Y-%m-%d %H:%M:%S UTC")
                        )
                        .dimmed()
                    );
                }
                ReplicaOrigin::Empty | ReplicaOrigin::Remote { .. } => {}
            }
        }
    }

    Ok(())
}

pub async fn create(ctx: Context, args: CreateArgs) -> Result<()> {
    let sync = ctx.synchronizer().await?;
    let outcome = sync.create(&args.domain, &args.param, ctx.actor()).await?;
    report(&ctx, &outcome)
}

pub async fn revoke(ctx: Context, args: RevokeArgs) -> Result<()> {
    let sync = ctx.synchronizer().await?;
    // Without any local data there is nothing to fall back on
    if sync.replica().await.is_empty() {
        ctx.refresh(&sync).await;
    }
    let outcome = sync.revoke(&args.id, ctx.actor()).await?;
    report(&ctx, &outcome)
}

fn report(ctx: &Context, outcome: &MutationOutcome) -> Result<()> {
    if ctx.output_format == OutputFormat::Json {
        let value = match outcome {
            MutationOutcome::Confirmed { message, refreshed } => json!({
                "confirmed": true,
                "message": message,
                "refreshed": refreshed,
            }),
            MutationOutcome::LocalOnly { error } => json!({
                "confirmed": false,
                "error": error.to_string(),
            }),
        };
        return output::print_json(&value);
    }

    match outcome {
        MutationOutcome::Confirmed { message, refreshed } => {
            println!("{} {message}", "Confirmed:".green().bold());
            if !refreshed {
                println!("{}", "Local list could not be refreshed; run `certdesk list` later.".dimmed());
            }
        }
        MutationOutcome::LocalOnly { error } => {
            println!("{} server unreachable ({error})", "Saved locally only:".yellow().bold());
            println!(
                "{}",
                "The change is replaced by the server's state at the next successful sync.".dimmed()
            );
        }
    }
    Ok(())
}
