//! Local mirror of the server's certificates and history.

use certdesk_core::{
    sort_newest_first, AuditAction, AuditEntry, CertdeskError, Certificate, Result,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Validity given to certificates synthesized while offline
pub const LOCAL_VALIDITY_DAYS: i64 = 365;

/// Where the replica's current contents came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReplicaOrigin {
    /// Never populated
    #[default]
    Empty,
    /// Holds the built-in sample set
    Seeded,
    /// Matches the server as of `synced_at`
    Remote {
        /// Time of the last successful refresh
        synced_at: DateTime<Utc>,
    },
    /// Carries local mutations the server has not confirmed
    Diverged {
        /// Time of the first unconfirmed mutation
        since: DateTime<Utc>,
    },
}

/// Certificates and history as last seen (or locally changed) by the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
    /// Certificate mirror
    #[serde(default)]
    pub certificates: Vec<Certificate>,

    /// History mirror, newest first
    #[serde(default)]
    pub history: Vec<AuditEntry>,

    /// Provenance
    #[serde(default)]
    pub origin: ReplicaOrigin,
}

impl Replica {
    /// Replica holding exactly what the server returned
    #[must_use]
    pub fn from_remote(
        certificates: Vec<Certificate>,
        mut history: Vec<AuditEntry>,
        synced_at: DateTime<Utc>,
    ) -> Self {
        sort_newest_first(&mut history);
        Self {
            certificates,
            history,
            origin: ReplicaOrigin::Remote { synced_at },
        }
    }

    /// The built-in sample set
    #[must_use]
    pub fn samples(now: DateTime<Utc>) -> Self {
        let sample = |name: &str, issued_ago: i64, expires_in: i64| Certificate {
            id: name.to_string(),
            name: name.to_string(),
            domain: name.to_string(),
            issued_date: now - Duration::days(issued_ago),
            expiry_date: now + Duration::days(expires_in),
            is_revoked: false,
            has_private_key: false,
            revoked_by: None,
            revoked_date: None,
        };

        let mut revoked = sample("api.example.com", 60, 305);
        revoked.revoke("admin", now - Duration::days(5));

        Self {
            certificates: vec![
                sample("example.com", 30, 335),
                revoked,
                sample("dev.example.com", 15, 350),
            ],
            history: Vec::new(),
            origin: ReplicaOrigin::Seeded,
        }
    }

    /// Returns true if the replica has never held any data
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.origin == ReplicaOrigin::Empty
    }

    /// Record a locally synthesized issuance
    pub fn apply_local_create(&mut self, domain: &str, username: &str, now: DateTime<Utc>) {
        self.certificates.push(Certificate {
            id: domain.to_string(),
            name: domain.to_string(),
            domain: domain.to_string(),
            issued_date: now,
            expiry_date: now + Duration::days(LOCAL_VALIDITY_DAYS),
            is_revoked: false,
            has_private_key: false,
            revoked_by: None,
            revoked_date: None,
        });
        self.record(AuditAction::Create, domain, username, now);
    }

    /// Record a local revocation. Returns false (and changes nothing) if the
    /// certificate is not in the replica.
    pub fn apply_local_revoke(&mut self, id: &str, username: &str, now: DateTime<Utc>) -> bool {
        let Some(cert) = self.certificates.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        cert.revoke(username, now);
        let name = cert.name.clone();
        self.record(AuditAction::Revoke, &name, username, now);
        true
    }

    fn record(&mut self, action: AuditAction, name: &str, username: &str, now: DateTime<Utc>) {
        self.history.insert(0, AuditEntry::at(action, name, username, now));
        if !matches!(self.origin, ReplicaOrigin::Diverged { .. }) {
            self.origin = ReplicaOrigin::Diverged { since: now };
        }
    }

    /// Load a persisted replica. A missing or unreadable file yields an empty
    /// replica.
    pub async fn load(path: &Path) -> Self {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no replica yet");
                return Self::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read replica, starting empty");
                return Self::default();
            }
        };

        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "corrupt replica, starting empty");
            Self::default()
        })
    }

    /// Persist the replica atomically (temp file + rename)
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CertdeskError::io(parent.display().to_string(), e))?;
        }

        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CertdeskError::io(tmp.display().to_string(), e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| CertdeskError::io(path.display().to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_set() {
        let now = Utc::now();
        let replica = Replica::samples(now);
        let names: Vec<&str> = replica.certificates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["example.com", "api.example.com", "dev.example.com"]);
        assert!(!replica.certificates[0].is_revoked);
        assert!(replica.certificates[1].is_revoked);
        assert_eq!(replica.certificates[1].revoked_by.as_deref(), Some("admin"));
        assert!(!replica.certificates[2].is_revoked);
        assert_eq!(replica.origin, ReplicaOrigin::Seeded);
    }

    #[test]
    fn local_create_synthesizes_a_year() {
        let now = Utc::now();
        let mut replica = Replica::default();
        replica.apply_local_create("bar.example.com", "alice", now);

        let cert = &replica.certificates[0];
        assert_eq!(cert.expiry_date - cert.issued_date, Duration::days(365));
        assert_eq!(replica.history[0].action, AuditAction::Create);
        assert_eq!(replica.history[0].username, "alice");
        assert_eq!(replica.origin, ReplicaOrigin::Diverged { since: now });
    }

    #[test]
    fn local_revoke_of_unknown_changes_nothing() {
        let now = Utc::now();
        let mut replica = Replica::samples(now);
        let before = replica.clone();
        assert!(!replica.apply_local_revoke("missing.example.com", "alice", now));
        assert_eq!(replica, before);
    }

    #[test]
    fn divergence_keeps_first_timestamp() {
        let now = Utc::now();
        let mut replica = Replica::samples(now);
        assert!(replica.apply_local_revoke("example.com", "alice", now));
        replica.apply_local_create("x.example.com", "alice", now + Duration::seconds(10));
        assert_eq!(replica.origin, ReplicaOrigin::Diverged { since: now });
        assert_eq!(replica.history.len(), 2);
        assert_eq!(replica.history[0].certificate_name, "x.example.com");
    }

    #[tokio::test]
    async fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/replica.json");
        let replica = Replica::samples(chrono::SubsecRound::trunc_subsecs(Utc::now(), 0));
        replica.save(&path).await.unwrap();
        assert_eq!(Replica::load(&path).await, replica);
    }

    #[tokio::test]
    async fn corrupt_replica_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("replica.json");
        std::fs::write(&path, "{oops").unwrap();
        assert!(Replica::load(&path).await.is_empty());
    }
}
