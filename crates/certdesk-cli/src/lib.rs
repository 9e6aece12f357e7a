//! # certdesk-cli
//!
//! Command-line interface for certdesk.
//!
//! ## Features
//!
//! - **Server**: `certdesk serve` runs the HTTP API over a CA directory
//! - **Certificates**: list, issue and revoke, falling back to a local
//!   replica while the server is unreachable
//! - **Accounts**: list, add and delete users; verify credentials
//! - **Multiple output formats**: Pretty tables, JSON, CSV

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
