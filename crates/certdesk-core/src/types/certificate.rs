use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A certificate issued by the authority.
///
/// Never stored: the server recomputes it from the certificate directory and
/// the revocation ledger on every read. Clients keep copies in their replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Filename stem, unique within the certificate directory
    pub id: String,

    /// Display name (same as `id` for server-derived certificates)
    pub name: String,

    /// Subject common name
    #[serde(default)]
    pub domain: String,

    /// Start of the validity window (not-before)
    pub issued_date: DateTime<Utc>,

    /// End of the validity window (not-after)
    pub expiry_date: DateTime<Utc>,

    /// Whether the ledger marks this certificate revoked
    #[serde(default)]
    pub is_revoked: bool,

    /// Whether a matching private key exists next to the certificate
    #[serde(default)]
    pub has_private_key: bool,

    /// Who revoked it, only known for revocations recorded client-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_by: Option<String>,

    /// When it was revoked, only known for revocations recorded client-side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked_date: Option<DateTime<Utc>>,
}

impl Certificate {
    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> CertificateState {
        if self.is_revoked {
            CertificateState::Revoked
        } else {
            CertificateState::Active
        }
    }

    /// Returns true if the validity window has closed at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry_date
    }

    /// Days until expiry at `now` (negative once expired)
    #[must_use]
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry_date - now).num_days()
    }

    /// Mark the certificate revoked.
    ///
    /// One-way: an already revoked certificate keeps its original
    /// `revoked_by` / `revoked_date`.
    pub fn revoke(&mut self, by: impl Into<String>, at: DateTime<Utc>) {
        if self.is_revoked {
            return;
        }
        self.is_revoked = true;
        self.revoked_by = Some(by.into());
        self.revoked_date = Some(at);
    }
}

/// Lifecycle of a certificate. `Revoked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateState {
    /// Issued and not revoked
    Active,
    /// Present in the ledger with the revoked marker
    Revoked,
}

impl std::fmt::Display for CertificateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Revoked => write!(f, "revoked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Certificate {
        let now = Utc::now();
        Certificate {
            id: "foo.example.com".into(),
            name: "foo.example.com".into(),
            domain: "foo.example.com".into(),
            issued_date: now - Duration::days(10),
            expiry_date: now + Duration::days(355),
            is_revoked: false,
            has_private_key: true,
            revoked_by: None,
            revoked_date: None,
        }
    }

    #[test]
    fn revoke_is_one_way() {
        let mut cert = sample();
        let first = Utc::now();
        cert.revoke("alice", first);
        assert_eq!(cert.state(), CertificateState::Revoked);

        cert.revoke("bob", first + Duration::hours(1));
        assert!(cert.is_revoked);
        assert_eq!(cert.revoked_by.as_deref(), Some("alice"));
        assert_eq!(cert.revoked_date, Some(first));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("issuedDate").is_some());
        assert!(json.get("expiryDate").is_some());
        assert_eq!(json["isRevoked"], false);
        assert!(json.get("revokedBy").is_none());
    }

    #[test]
    fn expiry_helpers() {
        let cert = sample();
        let now = Utc::now();
        assert!(!cert.is_expired_at(now));
        assert!(cert.is_expired_at(now + Duration::days(400)));
        assert!(cert.days_remaining(now) >= 354);
    }
}
