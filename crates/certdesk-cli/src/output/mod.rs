//! Output formatting for different formats.

use anyhow::Result;
use certdesk_core::{AuditEntry, Certificate, CertificateState, User};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed tables with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
    /// CSV output
    Csv,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "table" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => anyhow::bail!(
                "Unknown output format: {s}\n\
                 Valid formats: pretty, json, csv"
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One certificate as a table/CSV row.
#[derive(Debug, Tabled, Serialize)]
pub struct CertificateRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Domain")]
    pub domain: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Issued")]
    pub issued: String,
    #[tabled(rename = "Expires")]
    pub expires: String,
    #[tabled(rename = "Days Left")]
    pub days_left: i64,
    #[tabled(rename = "Key")]
    pub has_private_key: bool,
}

impl CertificateRow {
    /// Row for `cert` as of `now`
    pub fn new(cert: &Certificate, now: DateTime<Utc>) -> Self {
        let status = match cert.state() {
            CertificateState::Active if cert.is_expired_at(now) => "expired".to_string(),
            state => state.to_string(),
        };
        Self {
            id: cert.id.clone(),
            domain: cert.domain.clone(),
            status,
            issued: cert.issued_date.format("%Y-%m-%d").to_string(),
            expires: cert.expiry_date.format("%Y-%m-%d").to_string(),
            days_left: cert.days_remaining(now),
            has_private_key: cert.has_private_key,
        }
    }
}

/// One audit entry as a table/CSV row.
#[derive(Debug, Tabled, Serialize)]
pub struct HistoryRow {
    #[tabled(rename = "Time (UTC)")]
    pub timestamp: String,
    #[tabled(rename = "User")]
    pub username: String,
    #[tabled(rename = "Action")]
    pub action: String,
    #[tabled(rename = "Certificate")]
    pub certificate: String,
}

impl From<&AuditEntry> for HistoryRow {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            timestamp: entry.timestamp.format(TIME_FORMAT).to_string(),
            username: entry.username.clone(),
            action: entry.action.to_string(),
            certificate: entry.certificate_name.clone(),
        }
    }
}

/// One account as a table/CSV row.
#[derive(Debug, Tabled, Serialize)]
pub struct UserRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Username")]
    pub username: String,
    #[tabled(rename = "Role")]
    pub role: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role.to_string(),
        }
    }
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render rows as CSV with a header line.
pub fn render_csv<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV output: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// Print rows as CSV.
pub fn print_csv<T: Serialize>(rows: &[T]) -> Result<()> {
    print!("{}", render_csv(rows)?);
    Ok(())
}

/// Print rows as a rounded table, or `empty` when there are none.
pub fn print_table<T: Tabled>(rows: &[T], empty: &str) {
    if rows.is_empty() {
        println!("  {}", empty.dimmed());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}

/// Colorize a certificate status for the pretty format.
pub fn colorize_status(status: &str) -> String {
    match status {
        "active" => status.green().to_string(),
        "revoked" => status.red().to_string(),
        _ => status.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certdesk_core::AuditAction;
    use chrono::{Duration, TimeZone};

    fn cert(now: DateTime<Utc>) -> Certificate {
        Certificate {
            id: "example.com".into(),
            name: "example.com".into(),
            domain: "example.com".into(),
            issued_date: now - Duration::days(30),
            expiry_date: now + Duration::days(335),
            is_revoked: false,
            has_private_key: true,
            revoked_by: None,
            revoked_date: None,
        }
    }

    #[test]
    fn certificate_status() {
        let now = Utc::now();
        let mut c = cert(now);
        assert_eq!(CertificateRow::new(&c, now).status, "active");
        assert_eq!(
            CertificateRow::new(&c, now + Duration::days(400)).status,
            "expired"
        );
        c.revoke("admin", now);
        assert_eq!(CertificateRow::new(&c, now).status, "revoked");
        assert_eq!(
            CertificateRow::new(&c, now + Duration::days(400)).status,
            "revoked"
        );
    }

    #[test]
    fn certificate_csv_counts_days_left() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        let mut expired = cert(now - Duration::days(400));
        expired.id = "old.example.com".into();
        expired.domain = "old.example.com".into();

        let rows = [CertificateRow::new(&cert(now), now), CertificateRow::new(&expired, now)];
        assert_eq!(rows[0].days_left, 335);
        assert_eq!(rows[1].days_left, -65);
        assert_eq!(
            render_csv(&rows).unwrap(),
            "id,domain,status,issued,expires,days_left,has_private_key\n\
             example.com,example.com,active,2026-09-19,2027-09-19,335,true\n\
             old.example.com,old.example.com,expired,2025-08-15,2026-08-15,-65,true\n"
        );
    }

    #[test]
    fn history_csv() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        let entry = AuditEntry::at(AuditAction::Revoke, "foo.example.com", "alice", at);
        let csv = render_csv(&[HistoryRow::from(&entry)]).unwrap();
        assert_eq!(
            csv,
            "timestamp,username,action,certificate\n\
             2026-10-19 08:30:00,alice,revoke,foo.example.com\n"
        );
    }

    #[test]
    fn empty_csv_has_no_rows() {
        let rows: Vec<UserRow> = Vec::new();
        assert_eq!(render_csv(&rows).unwrap(), "");
    }

    #[test]
    fn parse_format() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Pretty);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
