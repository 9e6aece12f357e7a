//! # certdesk-ca
//!
//! Certificate state and audit trail for an OpenSSL-style certificate
//! authority.
//!
//! The authority's own tooling owns the certificate directory and the
//! revocation ledger; this crate only reads them. Issuance and revocation go
//! through external scripts, and every successful action is appended to an
//! audit log.
//!
//! ## Data Flow
//!
//! ```text
//! Read path (no side effects)
//!   certs/*.cert.pem + private/*.key.pem + index.txt
//!   -> scanner::scan_certificates() -> Vec<Certificate>
//!   actions.log -> AuditLog::read_all() -> Vec<AuditEntry> (newest first)
//!
//! Write path
//!   CertificateService::create_certificate / revoke_certificate
//!   -> ActionExecutor: validate -> quote -> sh -c -> exit status
//!   -> exit 0: AuditLog::append()
//! ```

pub mod audit;
pub mod config;
pub mod executor;
pub mod ledger;
pub mod scanner;
pub mod service;
pub mod users;

pub use audit::AuditLog;
pub use config::{ActionsConfig, AuthorityConfig, StorageConfig};
pub use executor::{ActionExecutor, ActionKind, ActionOutput, ActionRunner, ShellRunner};
pub use service::{AdminCheck, CertificateService, RoleAdminCheck};
pub use users::UserStore;
