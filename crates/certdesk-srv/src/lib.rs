//! certdesk-srv: HTTP API for certificate lifecycle management.
//!
//! Serves the certificate list, issuance, revocation, audit history and
//! account administration as JSON over HTTP.
//!
//! # Routes
//!
//! - `GET /api/certificates` - certificates with revocation status
//! - `POST /api/certificate/create` - run the issuance script
//! - `POST /api/certificate/revoke` - run the revocation script
//! - `GET /api/history` - audit log, newest first
//! - `GET|POST|DELETE /api/users`, `POST /api/users/login` - accounts
//! - `GET /healthz` - liveness
//!
//! Account administration identifies the caller by the `X-Certdesk-User`
//! header.

pub mod config;
pub mod error;
pub mod routes;
pub mod server;

// Re-exports for convenience.
pub use config::ServerConfig;
pub use error::{ApiError, SrvError};

/// Result type for certdesk-srv operations.
pub type Result<T> = std::result::Result<T, SrvError>;
