//! User account store.
//!
//! Accounts live in a JSON file with argon2 password hashes. All writes go
//! through one lock and replace the file atomically (temp file + rename).
//! Hashing and verification run on the blocking pool, never under the lock.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use certdesk_core::{CertdeskError, Result, Role, User};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SALT_LEN: usize = 16;

/// Accounts created when no store exists yet: `(username, password, role)`
pub const DEFAULT_ACCOUNTS: &[(&str, &str, Role)] = &[
    ("admin", "admin123", Role::Admin),
    ("user", "user123", Role::User),
];

/// An account as persisted, including its password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    /// Unique account ID
    pub id: String,
    /// Login name
    pub username: String,
    /// PHC-format argon2 hash
    pub password_hash: String,
    /// Account role
    #[serde(default)]
    pub role: Role,
}

impl StoredUser {
    /// The account without password material
    #[must_use]
    pub fn sanitized(&self) -> User {
        User {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
        }
    }
}

/// File-backed account store with a single serialized writer
pub struct UserStore {
    path: PathBuf,
    users: Mutex<Vec<StoredUser>>,
    hasher: Argon2<'static>,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl UserStore {
    /// Open the store at `path`, creating it with [`DEFAULT_ACCOUNTS`] if it
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// the default store cannot be written.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(path.into(), Argon2::default()).await
    }

    async fn open_with(path: PathBuf, hasher: Argon2<'static>) -> Result<Self> {
        let users = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<StoredUser>>(&bytes).map_err(|e| {
                CertdeskError::Config(format!("invalid user store {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(CertdeskError::io(path.display().to_string(), e)),
        };

        let store = Self {
            path,
            users: Mutex::new(users),
            hasher,
        };

        {
            let mut users = store.users.lock().await;
            if users.is_empty() {
                for (username, password, role) in DEFAULT_ACCOUNTS {
                    users.push(store.new_account(username, password, *role).await?);
                }
                store.persist(&users).await?;
                info!(path = %store.path.display(), "created user store with default accounts");
            } else {
                debug!(path = %store.path.display(), count = users.len(), "loaded user store");
            }
        }

        Ok(store)
    }

    /// Store with cheap hashing parameters for tests
    #[cfg(test)]
    pub(crate) async fn open_for_tests(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with_cost(path, 1024, 1).await
    }

    #[cfg(test)]
    async fn open_with_cost(path: impl Into<PathBuf>, m_cost: u32, t_cost: u32) -> Result<Self> {
        let params = argon2::Params::new(m_cost, t_cost, 1, None)
            .map_err(|e| CertdeskError::Internal(e.to_string()))?;
        let hasher = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);
        Self::open_with(path.into(), hasher).await
    }

    /// Location of the store
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All accounts, without passwords
    pub async fn list(&self) -> Vec<User> {
        self.users.lock().await.iter().map(StoredUser::sanitized).collect()
    }

    /// Look up an account by login name
    pub async fn find_by_username(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.username == username)
            .map(StoredUser::sanitized)
    }

    /// Check a username/password pair.
    ///
    /// # Errors
    ///
    /// Returns `CertdeskError::InvalidCredentials` for an unknown user or a
    /// wrong password.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User> {
        let (user, stored_hash) = {
            let users = self.users.lock().await;
            let Some(user) = users.iter().find(|u| u.username == username) else {
                return Err(CertdeskError::InvalidCredentials);
            };
            (user.sanitized(), user.password_hash.clone())
        };

        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let name = user.username.clone();
        off_runtime(move || {
            let parsed = PasswordHash::new(&stored_hash).map_err(|e| {
                warn!(username = %name, error = %e, "stored password hash is unreadable");
                CertdeskError::InvalidCredentials
            })?;
            hasher
                .verify_password(password.as_bytes(), &parsed)
                .map_err(|_| CertdeskError::InvalidCredentials)
        })
        .await?;

        Ok(user)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// - `CertdeskError::Validation` if username or password is blank
    /// - `CertdeskError::Conflict` if the username is taken
    /// - `CertdeskError::Io` if the store cannot be written
    pub async fn create(&self, username: &str, password: &str, role: Role) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CertdeskError::validation("username is required"));
        }
        if password.is_empty() {
            return Err(CertdeskError::validation("password is required"));
        }

        let account = self.new_account(username, password, role).await?;
        let user = account.sanitized();

        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.username == username) {
            return Err(CertdeskError::Conflict(format!(
                "username already exists: {username}"
            )));
        }

        let mut next = users.clone();
        next.push(account);
        self.persist(&next).await?;
        *users = next;

        info!(username, role = %role, "created user");
        Ok(user)
    }

    /// Delete the account with `id`.
    ///
    /// # Errors
    ///
    /// - `CertdeskError::NotFound` if no account has that ID
    /// - `CertdeskError::Io` if the store cannot be written
    pub async fn delete(&self, id: &str) -> Result<User> {
        let mut users = self.users.lock().await;
        let Some(index) = users.iter().position(|u| u.id == id) else {
            return Err(CertdeskError::NotFound {
                resource: format!("user {id}"),
            });
        };

        let mut next = users.clone();
        let removed = next.remove(index);
        self.persist(&next).await?;
        *users = next;

        info!(username = %removed.username, "deleted user");
        Ok(removed.sanitized())
    }

    async fn new_account(&self, username: &str, password: &str, role: Role) -> Result<StoredUser> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let password_hash = off_runtime(move || hash_password(&hasher, &password)).await?;

        Ok(StoredUser {
            id: uuid::Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            password_hash,
            role,
        })
    }

    async fn persist(&self, users: &[StoredUser]) -> Result<()> {
        let json = serde_json::to_string_pretty(users)?;
        let path_str = self.path.display().to_string();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CertdeskError::io(parent.display().to_string(), e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CertdeskError::io(tmp.display().to_string(), e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CertdeskError::io(path_str, e))
    }
}

fn hash_password(hasher: &Argon2<'_>, password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt)
        .map_err(|e| CertdeskError::Internal(format!("salt encoding failed: {e}")))?;

    hasher
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CertdeskError::Internal(format!("password hashing failed: {e}")))
}

/// Run CPU-heavy password work on the blocking pool
async fn off_runtime<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CertdeskError::Internal(format!("password worker failed: {e}")))?
}
