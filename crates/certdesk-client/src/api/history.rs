//! Audit history API endpoints.

use crate::CertdeskClient;
use certdesk_core::{AuditEntry, HistoryList, Result};

/// Audit history API endpoints
pub struct HistoryApi<'a> {
    client: &'a CertdeskClient,
}

impl<'a> HistoryApi<'a> {
    pub(crate) const fn new(client: &'a CertdeskClient) -> Self {
        Self { client }
    }

    /// All audit entries, newest first
    pub async fn list(&self) -> Result<Vec<AuditEntry>> {
        let list: HistoryList = self.client.get("/api/history").await?;
        Ok(list.history)
    }
}
