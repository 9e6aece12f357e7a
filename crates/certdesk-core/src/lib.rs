//! Core types and error taxonomy for certdesk.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - **Types**: certificates derived from the authority's directory, audit
//!   entries, user accounts and the JSON request/response bodies of the API
//! - **Errors**: one taxonomy, [`CertdeskError`], shared by server and client
//!
//! # Example
//!
//! ```rust,ignore
//! use certdesk_core::{Certificate, Result};
//!
//! fn print_status(cert: &Certificate) -> Result<()> {
//!     println!("{}: revoked={}", cert.name, cert.is_revoked);
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/certdesk-core/0.3.0")]

mod error;
pub mod types;

pub use error::{CertdeskError, Result};
pub use types::*;
