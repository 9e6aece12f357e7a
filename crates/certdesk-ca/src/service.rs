//! Request layer: the operations the HTTP surface exposes.

use async_trait::async_trait;
use certdesk_core::{AuditEntry, CertdeskError, Certificate, Result, Role, User};
use std::sync::Arc;
use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::config::{ActionsConfig, AuthorityConfig, StorageConfig};
use crate::executor::{ActionExecutor, ActionKind, ActionRunner, ShellRunner};
use crate::scanner;
use crate::users::UserStore;

/// Decides whether a caller may administer accounts
#[async_trait]
pub trait AdminCheck: Send + Sync {
    /// Returns true if `caller` (a username) holds the admin capability
    async fn is_admin(&self, caller: &str) -> bool;
}

/// Admin check backed by the role stored for the caller's account
#[derive(Debug, Clone)]
pub struct RoleAdminCheck {
    users: Arc<UserStore>,
}

impl RoleAdminCheck {
    /// Check roles in `users`
    #[must_use]
    pub const fn new(users: Arc<UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AdminCheck for RoleAdminCheck {
    async fn is_admin(&self, caller: &str) -> bool {
        self.users
            .find_by_username(caller)
            .await
            .is_some_and(|user| user.role == Role::Admin)
    }
}

/// Certificate, history and account operations
pub struct CertificateService {
    authority: AuthorityConfig,
    executor: ActionExecutor,
    users: Arc<UserStore>,
    admin: Arc<dyn AdminCheck>,
}

impl std::fmt::Debug for CertificateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateService")
            .field("authority", &self.authority)
            .field("executor", &self.executor)
            .field("users", &self.users)
            .finish_non_exhaustive()
    }
}

impl CertificateService {
    /// Assemble a service from its parts
    pub fn new(
        authority: AuthorityConfig,
        executor: ActionExecutor,
        users: Arc<UserStore>,
        admin: Arc<dyn AdminCheck>,
    ) -> Self {
        Self {
            authority,
            executor,
            users,
            admin,
        }
    }

    /// Service running the configured scripts, with role-based admin checks
    ///
    /// # Errors
    ///
    /// Returns an error if the user store cannot be opened.
    pub async fn from_config(
        authority: AuthorityConfig,
        actions: ActionsConfig,
        storage: StorageConfig,
    ) -> Result<Self> {
        Self::with_runner(
            authority,
            Arc::new(ShellRunner::new(actions)),
            storage,
        )
        .await
    }

    /// Service running actions through `runner`
    ///
    /// # Errors
    ///
    /// Returns an error if the user store cannot be opened.
    pub async fn with_runner(
        authority: AuthorityConfig,
        runner: Arc<dyn ActionRunner>,
        storage: StorageConfig,
    ) -> Result<Self> {
        let users = Arc::new(UserStore::open(storage.users_file).await?);
        Ok(Self::assemble(
            authority,
            runner,
            AuditLog::new(storage.audit_log),
            users,
        ))
    }

    fn assemble(
        authority: AuthorityConfig,
        runner: Arc<dyn ActionRunner>,
        audit: AuditLog,
        users: Arc<UserStore>,
    ) -> Self {
        let admin = Arc::new(RoleAdminCheck::new(users.clone()));
        Self::new(authority, ActionExecutor::new(runner, audit), users, admin)
    }

    /// Every issued certificate with its current status. Never fails.
    pub async fn list_certificates(&self) -> Vec<Certificate> {
        scanner::scan_certificates(&self.authority).await
    }

    /// Issue a certificate for `domain`.
    ///
    /// # Errors
    ///
    /// `Validation` for blank input, `ExternalAction` if issuance fails.
    pub async fn create_certificate(
        &self,
        domain: &str,
        additional_param: &str,
        actor: &str,
    ) -> Result<String> {
        self.executor
            .execute(
                ActionKind::Issue,
                &[domain.to_string(), additional_param.to_string()],
                actor,
            )
            .await?;
        Ok(format!("Certificate for {domain} created successfully"))
    }

    /// Revoke the certificate `certificate_id`.
    ///
    /// Revoking an already revoked certificate runs the action again and
    /// reports whatever it answers.
    ///
    /// # Errors
    ///
    /// `Validation` for a blank id, `ExternalAction` if revocation fails.
    pub async fn revoke_certificate(&self, certificate_id: &str, actor: &str) -> Result<String> {
        self.executor
            .execute(ActionKind::Revoke, &[certificate_id.to_string()], actor)
            .await?;
        Ok(format!("Certificate {certificate_id} revoked successfully"))
    }

    /// Audit history, newest first. Never fails.
    pub async fn list_history(&self) -> Vec<AuditEntry> {
        match self.executor.audit_log().read_all().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "failed to read audit log");
                Vec::new()
            }
        }
    }

    /// All accounts, without passwords
    pub async fn list_users(&self) -> Vec<User> {
        self.users.list().await
    }

    /// Check credentials.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown user or wrong password.
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let result = self.users.verify(username, password).await;
        match &result {
            Ok(_) => info!(username, "login succeeded"),
            Err(_) => warn!(username, "login failed"),
        }
        result
    }

    /// Create an account on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// - `Validation` if a field is blank or the role is unknown
    /// - `Forbidden` if `caller` is missing or not an admin
    /// - `Conflict` if the username is taken
    pub async fn create_user(
        &self,
        caller: Option<&str>,
        username: &str,
        password: &str,
        role: &str,
    ) -> Result<User> {
        if username.trim().is_empty() || password.is_empty() || role.trim().is_empty() {
            return Err(CertdeskError::validation(
                "username, password and role are required",
            ));
        }
        let role: Role = role.trim().parse()?;

        self.require_admin(caller).await?;
        self.users.create(username, password, role).await
    }

    /// Delete account `id` on behalf of `caller`.
    ///
    /// Nobody may delete their own account, admins included.
    ///
    /// # Errors
    ///
    /// - `Validation` if `id` is blank
    /// - `Forbidden` for self-deletion, a missing caller or a non-admin
    /// - `NotFound` if no account has that ID
    pub async fn delete_user(&self, caller: Option<&str>, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(CertdeskError::validation("id is required"));
        }

        let caller_name = caller_name(caller)?;
        if let Some(me) = self.users.find_by_username(caller_name).await {
            if me.id == id {
                return Err(CertdeskError::Forbidden(
                    "cannot delete your own account".to_string(),
                ));
            }
        }

        self.require_admin(caller).await?;
        self.users.delete(id).await.map(|_| ())
    }

    async fn require_admin(&self, caller: Option<&str>) -> Result<()> {
        let caller = caller_name(caller)?;
        if self.admin.is_admin(caller).await {
            Ok(())
        } else {
            Err(CertdeskError::Forbidden(format!(
                "{caller} is not an administrator"
            )))
        }
    }
}

fn caller_name(caller: Option<&str>) -> Result<&str> {
    caller
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| CertdeskError::Forbidden("caller is not identified".to_string()))
}
