use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Kind of action recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// A certificate was issued
    Create,
    /// A certificate was revoked
    Revoke,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Revoke => write!(f, "revoke"),
        }
    }
}

/// One immutable record of a create/revoke action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: String,

    /// When the action completed (second granularity, UTC)
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Who performed the action
    pub username: String,

    /// What was done
    pub action: AuditAction,

    /// Target certificate
    pub certificate_name: String,
}

impl AuditEntry {
    /// Create an entry stamped with the current time
    #[must_use]
    pub fn new(
        action: AuditAction,
        certificate_name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self::at(action, certificate_name, username, Utc::now())
    }

    /// Create an entry stamped with `at`, truncated to whole seconds
    #[must_use]
    pub fn at(
        action: AuditAction,
        certificate_name: impl Into<String>,
        username: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: at.trunc_subsecs(0),
            username: username.into(),
            action,
            certificate_name: certificate_name.into(),
        }
    }
}

/// Sort entries newest first.
///
/// The sort is stable, so entries sharing a timestamp keep their relative
/// (insertion) order.
pub fn sort_newest_first(entries: &mut [AuditEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Second-granularity timestamps.
///
/// Written as RFC 3339 (`2026-10-19T08:30:00Z`), always in UTC. Also reads
/// the older `2026-10-19 08:30:00` layout. Those entries carry no zone: they
/// were written in the server's local time, which is not recorded anywhere,
/// so they are read as UTC. On a host whose clock was not UTC, legacy entries
/// are off by that host's offset and may sort out of place among new ones.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
    const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(WRITE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    /// Parse either supported layout. Zoneless legacy values are taken as UTC.
    #[must_use]
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, LEGACY_FORMAT)
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }
}
