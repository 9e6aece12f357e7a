//! `certdesk history` - the audit trail.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::output::{self, HistoryRow, OutputFormat};

pub async fn execute(ctx: Context) -> Result<()> {
    let sync = ctx.synchronizer().await?;
    ctx.refresh(&sync).await;
    let history = sync.history().await;

    match ctx.output_format {
        OutputFormat::Json => output::print_json(&history)?,
        OutputFormat::Csv => {
            let rows: Vec<HistoryRow> = history.iter().map(HistoryRow::from).collect();
            output::print_csv(&rows)?;
        }
        OutputFormat::Pretty => {
            println!("{}", "Audit History:".bold());
            println!();
            let rows: Vec<HistoryRow> = history.iter().map(HistoryRow::from).collect();
            output::print_table(&rows, "No actions recorded yet.");
        }
    }

    Ok(())
}
