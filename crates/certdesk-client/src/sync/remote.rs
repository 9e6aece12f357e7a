//! The server as seen by the synchronizer.

use async_trait::async_trait;
use certdesk_core::{AuditEntry, Certificate, Result};

use crate::CertdeskClient;

/// Remote certificate service the synchronizer reconciles against
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Current certificates
    async fn fetch_certificates(&self) -> Result<Vec<Certificate>>;

    /// Audit history, newest first
    async fn fetch_history(&self) -> Result<Vec<AuditEntry>>;

    /// Issue a certificate, returning the server's confirmation
    async fn create_certificate(
        &self,
        domain: &str,
        additional_param: &str,
        username: &str,
    ) -> Result<String>;

    /// Revoke a certificate, returning the server's confirmation
    async fn revoke_certificate(&self, id: &str, username: &str) -> Result<String>;
}

#[async_trait]
impl RemoteService for CertdeskClient {
    async fn fetch_certificates(&self) -> Result<Vec<Certificate>> {
        self.certificates().list().await
    }

    async fn fetch_history(&self) -> Result<Vec<AuditEntry>> {
        self.history().list().await
    }

    async fn create_certificate(
        &self,
        domain: &str,
        additional_param: &str,
        username: &str,
    ) -> Result<String> {
        self.certificates()
            .create(domain, additional_param, Some(username))
            .await
            .map(|resp| resp.message)
    }

    async fn revoke_certificate(&self, id: &str, username: &str) -> Result<String> {
        self.certificates()
            .revoke(id, Some(username))
            .await
            .map(|resp| resp.message)
    }
}
