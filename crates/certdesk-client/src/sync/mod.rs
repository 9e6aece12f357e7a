//! Client-side synchronization.
//!
//! The [`Synchronizer`] keeps a [`Replica`] of the server's certificates and
//! history. Reads are served from the replica; refreshes replace it wholesale
//! when the server answers. Mutations go to the server first and fall back to
//! a local-only change when the server cannot be reached, so the operator
//! keeps a usable view while offline.
//!
//! ```text
//! refresh ──► RemoteService ──ok──► Replica::from_remote ──► persist
//!                  │
//!                  └─err──► keep replica (seed samples if never populated)
//! ```

mod remote;
mod replica;

pub use remote::RemoteService;
pub use replica::{Replica, ReplicaOrigin, LOCAL_VALIDITY_DAYS};

use certdesk_core::{AuditEntry, CertdeskError, Certificate, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Synchronizer settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Where to persist the replica between runs (none keeps it in memory)
    #[serde(default)]
    pub replica_path: Option<PathBuf>,

    /// Show the built-in sample set when the server has never been reached
    #[serde(default)]
    pub seed_samples: bool,
}

/// Result of a create or revoke
#[derive(Debug)]
pub enum MutationOutcome {
    /// The server performed the action
    Confirmed {
        /// Server confirmation message
        message: String,
        /// Whether the follow-up refresh succeeded
        refreshed: bool,
    },
    /// The server was unreachable; only the replica changed
    LocalOnly {
        /// Why the server could not be reached
        error: CertdeskError,
    },
}

impl MutationOutcome {
    /// Returns true if the server performed the action
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Keeps a local replica in step with a [`RemoteService`]
pub struct Synchronizer<R> {
    remote: R,
    config: SyncConfig,
    replica: RwLock<Replica>,
    refresh_lock: Mutex<()>,
}

impl<R: RemoteService> Synchronizer<R> {
    /// Create a synchronizer, loading a persisted replica if configured
    pub async fn open(remote: R, config: SyncConfig) -> Self {
        let replica = match &config.replica_path {
            Some(path) => Replica::load(path).await,
            None => Replica::default(),
        };
        debug!(origin = ?replica.origin, certificates = replica.certificates.len(), "replica loaded");

        Self {
            remote,
            config,
            replica: RwLock::new(replica),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The remote service
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// Copy of the current replica
    pub async fn replica(&self) -> Replica {
        self.replica.read().await.clone()
    }

    /// Certificates as currently known
    pub async fn certificates(&self) -> Vec<Certificate> {
        self.replica.read().await.certificates.clone()
    }

    /// History as currently known, newest first
    pub async fn history(&self) -> Vec<AuditEntry> {
        self.replica.read().await.history.clone()
    }

    /// Replace the replica with the server's state.
    ///
    /// On failure the replica is left untouched, except that a replica that
    /// has never held data is seeded with samples when enabled. Concurrent
    /// refreshes are serialized.
    ///
    /// # Errors
    ///
    /// Returns the error from whichever fetch failed first.
    pub async fn refresh(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        let fetched = tokio::try_join!(self.remote.fetch_certificates(), self.remote.fetch_history());
        match fetched {
            Ok((certificates, history)) => {
                let fresh = Replica::from_remote(certificates, history, Utc::now());
                info!(
                    certificates = fresh.certificates.len(),
                    history = fresh.history.len(),
                    "replica refreshed"
                );
                *self.replica.write().await = fresh;
                self.persist().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "refresh failed, keeping replica");
                if self.config.seed_samples {
                    let mut replica = self.replica.write().await;
                    if replica.is_empty() {
                        info!("seeding replica with sample certificates");
                        *replica = Replica::samples(Utc::now());
                        drop(replica);
                        self.persist().await;
                    }
                }
                Err(e)
            }
        }
    }

    /// Issue a certificate through the server, or record it locally if the
    /// server is unreachable.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for blank inputs and any server error that is not
    /// a network failure.
    pub async fn create(
        &self,
        domain: &str,
        additional_param: &str,
        username: &str,
    ) -> Result<MutationOutcome> {
        if domain.trim().is_empty() || additional_param.trim().is_empty() {
            return Err(CertdeskError::validation(
                "domain and additional parameter are required",
            ));
        }

        match self
            .remote
            .create_certificate(domain, additional_param, username)
            .await
        {
            Ok(message) => Ok(self.confirmed(message).await),
            Err(e) if e.is_network_error() => {
                warn!(domain, error = %e, "server unreachable, recording issuance locally");
                self.replica
                    .write()
                    .await
                    .apply_local_create(domain, username, Utc::now());
                self.persist().await;
                Ok(MutationOutcome::LocalOnly { error: e })
            }
            Err(e) => Err(e),
        }
    }

    /// Revoke a certificate through the server, or locally if the server is
    /// unreachable.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank id, any server error that is not a
    /// network failure, and the network error itself when the certificate is
    /// not in the replica.
    pub async fn revoke(&self, id: &str, username: &str) -> Result<MutationOutcome> {
        if id.trim().is_empty() {
            return Err(CertdeskError::validation("certificate id is required"));
        }

        match self.remote.revoke_certificate(id, username).await {
            Ok(message) => Ok(self.confirmed(message).await),
            Err(e) if e.is_network_error() => {
                let applied = self
                    .replica
                    .write()
                    .await
                    .apply_local_revoke(id, username, Utc::now());
                if !applied {
                    return Err(e);
                }
                warn!(id, error = %e, "server unreachable, recording revocation locally");
                self.persist().await;
                Ok(MutationOutcome::LocalOnly { error: e })
            }
            Err(e) => Err(e),
        }
    }

    async fn confirmed(&self, message: String) -> MutationOutcome {
        let refreshed = self.refresh().await.is_ok();
        MutationOutcome::Confirmed { message, refreshed }
    }

    async fn persist(&self) {
        let Some(path) = &self.config.replica_path else {
            return;
        };
        let snapshot = self.replica.read().await.clone();
        if let Err(e) = snapshot.save(path).await {
            warn!(path = %path.display(), error = %e, "failed to persist replica");
        }
    }
}
