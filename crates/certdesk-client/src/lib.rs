//! HTTP client for the certdesk API.
//!
//! [`CertdeskClient`] talks to a certdesk server. [`sync::Synchronizer`]
//! keeps a local replica of certificates and history on top of it, so the
//! data stays usable while the server is unreachable.

#![doc(html_root_url = "https://docs.rs/certdesk-client/0.3.0")]

mod client;
mod config;
pub mod api;
pub mod sync;

pub use client::{CertdeskClient, CertdeskClientBuilder, DEFAULT_BASE_URL};
pub use config::*;
pub use certdesk_core::{CertdeskError, Result};
