//! Revocation ledger parsing.
//!
//! The authority keeps an OpenSSL-style `index.txt`: one tab-separated record
//! per line, status flag first. A line counts as a revocation only when it has
//! at least five fields and its status is `R`; field 4 holds the identity the
//! certificates are matched against.
//!
//! Matching is a substring test of the certificate ID inside that field, so a
//! free-form subject such as `/CN=foo.example.com/O=Example` still matches
//! `foo.example.com`. The flip side is that `a.example.com` also matches a
//! subject naming `data.example.com`.

use std::path::Path;
use tracing::{debug, warn};

/// Status flag of a revoked record
pub const REVOKED_MARKER: &str = "R";

/// Minimum number of tab-separated fields in a usable record
const MIN_FIELDS: usize = 5;

/// Index of the identity field
const IDENTITY_FIELD: usize = 4;

/// Status flag of a ledger record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerStatus {
    /// `V`
    Valid,
    /// `R`
    Revoked,
    /// `E`
    Expired,
    /// Anything else
    Other(String),
}

impl From<&str> for LedgerStatus {
    fn from(flag: &str) -> Self {
        match flag {
            "V" => Self::Valid,
            REVOKED_MARKER => Self::Revoked,
            "E" => Self::Expired,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One parsed ledger line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Field 0
    pub status: LedgerStatus,
    /// Field 1, expiry in ASN.1 `YYMMDDHHMMSSZ` form
    pub expires: String,
    /// Field 2, revocation date and optional reason (empty unless revoked)
    pub revoked_at: String,
    /// Field 3, hex serial
    pub serial: String,
    /// Field 4, identity used for matching
    pub identity: String,
    /// Any remaining fields
    pub extra: Vec<String>,
}

impl LedgerEntry {
    /// Parse one line. Returns `None` for lines that do not have the record
    /// shape (blank, too few fields).
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            return None;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < MIN_FIELDS {
            return None;
        }

        Some(Self {
            status: LedgerStatus::from(fields[0]),
            expires: fields[1].to_string(),
            revoked_at: fields[2].to_string(),
            serial: fields[3].to_string(),
            identity: fields[IDENTITY_FIELD].to_string(),
            extra: fields[MIN_FIELDS..].iter().map(ToString::to_string).collect(),
        })
    }

    /// Returns true for `R` records
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.status == LedgerStatus::Revoked
    }
}

/// Identities the ledger currently marks revoked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevokedSet {
    identities: Vec<String>,
}

impl RevokedSet {
    /// Returns true if any revoked identity contains `certificate_id`
    #[must_use]
    pub fn is_revoked(&self, certificate_id: &str) -> bool {
        if certificate_id.is_empty() {
            return false;
        }
        self.identities
            .iter()
            .any(|identity| identity.contains(certificate_id))
    }

    /// Number of revocation records
    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Returns true if nothing is revoked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

/// Parse every well-formed record of a ledger, skipping malformed lines
#[must_use]
pub fn parse_entries(text: &str) -> Vec<LedgerEntry> {
    text.lines()
        .enumerate()
        .filter_map(|(n, line)| {
            let entry = LedgerEntry::parse(line);
            if entry.is_none() && !line.trim().is_empty() {
                debug!(line = n + 1, "skipping malformed ledger line");
            }
            entry
        })
        .collect()
}

/// Parse a ledger into the set of revoked identities
#[must_use]
pub fn parse_revoked(text: &str) -> RevokedSet {
    RevokedSet {
        identities: parse_entries(text)
            .into_iter()
            .filter(LedgerEntry::is_revoked)
            .map(|entry| entry.identity)
            .collect(),
    }
}

/// Read and parse the ledger at `path`.
///
/// A missing or unreadable ledger is treated as empty: every certificate is
/// then reported active.
pub async fn load_revoked(path: &Path) -> RevokedSet {
    match tokio::fs::read(path).await {
        Ok(bytes) => parse_revoked(&String::from_utf8_lossy(&bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "ledger not found, treating as empty");
            RevokedSet::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read ledger, treating as empty");
            RevokedSet::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEDGER: &str = "V\t270101000000Z\t\t1000\tunknown\t/CN=keep.example.com\n\
R\t270101000000Z\t260301120000Z\t1001\tCN=foo.example.com/O=Example\n\
\n\
garbage line without tabs\n\
R\tshort\n\
E\t240101000000Z\t\t1002\t/CN=old.example.com\n";

    #[test]
    fn revoked_line_marks_identity() {
        let revoked = parse_revoked(LEDGER);
        assert_eq!(revoked.len(), 1);
        assert!(revoked.is_revoked("foo.example.com"));
        assert!(!revoked.is_revoked("keep.example.com"));
        assert!(!revoked.is_revoked("old.example.com"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let entries = parse_entries(LEDGER);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].status, LedgerStatus::Valid);
        assert_eq!(entries[1].serial, "1001");
        assert_eq!(entries[2].status, LedgerStatus::Expired);
    }

    #[test]
    fn extra_fields_are_kept() {
        let entry = LedgerEntry::parse("V\t270101000000Z\t\t1000\tunknown\t/CN=a").unwrap();
        assert_eq!(entry.identity, "unknown");
        assert_eq!(entry.extra, vec!["/CN=a"]);
    }

    #[test]
    fn empty_ledger_revokes_nothing() {
        let revoked = parse_revoked("");
        assert!(revoked.is_empty());
        assert!(!revoked.is_revoked("anything"));
    }

    #[test]
    fn empty_identity_never_matches() {
        assert!(!parse_revoked(LEDGER).is_revoked(""));
    }

    #[test]
    fn crlf_lines_parse() {
        let revoked = parse_revoked("R\tx\ty\tz\tCN=crlf.example.com\r\n");
        assert!(revoked.is_revoked("crlf.example.com"));
    }

    #[test]
    fn lowercase_marker_is_not_revoked() {
        let revoked = parse_revoked("r\tx\ty\tz\tCN=foo.example.com\n");
        assert!(!revoked.is_revoked("foo.example.com"));
    }

    #[test]
    fn substring_matching_is_permissive() {
        let revoked = parse_revoked("R\tx\ty\tz\tCN=data.example.com\n");
        assert!(revoked.is_revoked("data.example.com"));
        assert!(revoked.is_revoked("a.example.com"));
    }

    #[tokio::test]
    async fn missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let revoked = load_revoked(&dir.path().join("index.txt")).await;
        assert!(revoked.is_empty());
    }

    #[tokio::test]
    async fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.txt");
        std::fs::write(&path, LEDGER).unwrap();
        let revoked = load_revoked(&path).await;
        assert!(revoked.is_revoked("foo.example.com"));
    }
}
