//! Certificate API endpoints.

use crate::CertdeskClient;
use certdesk_core::{
    ActionResponse, Certificate, CertificateList, CreateCertificateRequest, Result,
    RevokeCertificateRequest,
};

/// Certificate API endpoints
pub struct CertificatesApi<'a> {
    client: &'a CertdeskClient,
}

impl<'a> CertificatesApi<'a> {
    pub(crate) const fn new(client: &'a CertdeskClient) -> Self {
        Self { client }
    }

    /// List all certificates with their revocation status
    pub async fn list(&self) -> Result<Vec<Certificate>> {
        let list: CertificateList = self.client.get("/api/certificates").await?;
        Ok(list.certificates)
    }

    /// Issue a certificate. `username` is recorded in the audit trail.
    pub async fn create(
        &self,
        domain: &str,
        additional_param: &str,
        username: Option<&str>,
    ) -> Result<ActionResponse> {
        let body = CreateCertificateRequest {
            domain: domain.to_string(),
            additional_param: additional_param.to_string(),
            username: username.map(ToString::to_string),
        };
        self.client.post("/api/certificate/create", &body).await
    }

    /// Revoke a certificate. `username` is recorded in the audit trail.
    pub async fn revoke(&self, id: &str, username: Option<&str>) -> Result<ActionResponse> {
        let body = RevokeCertificateRequest {
            id: id.to_string(),
            username: username.map(ToString::to_string),
        };
        self.client.post("/api/certificate/revoke", &body).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{CertdeskClient, CertdeskError, RetryConfig};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> CertdeskClient {
        CertdeskClient::builder()
            .base_url(server.uri())
            .retry(RetryConfig::none())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn list_parses_certificates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/certificates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "certificates": [{
                    "id": "foo.example.com",
                    "name": "foo.example.com",
                    "domain": "foo.example.com",
                    "issuedDate": "2026-01-01T00:00:00Z",
                    "expiryDate": "2027-01-01T00:00:00Z",
                    "isRevoked": true,
                    "hasPrivateKey": true
                }]
            })))
            .mount(&server)
            .await;

        let certs = client(&server).await.certificates().list().await.unwrap();
        assert_eq!(certs.len(), 1);
        assert!(certs[0].is_revoked);
        assert!(certs[0].revoked_by.is_none());
    }

    #[tokio::test]
    async fn create_sends_original_field_names() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/certificate/create"))
            .and(body_json(json!({
                "domain": "bar.example.com",
                "additionalParam": "aux",
                "username": "alice"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Certificate for bar.example.com created successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client(&server)
            .await
            .certificates()
            .create("bar.example.com", "aux", Some("alice"))
            .await
            .unwrap();
        assert!(resp.success);
    }

    #[tokio::test]
    async fn revoke_failure_carries_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/certificate/revoke"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "revoke action failed (exit status 1)",
                "action": "revoke",
                "status": 1,
                "output": "ERROR: Already revoked"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .await
            .certificates()
            .revoke("foo.example.com", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CertdeskError::ExternalAction { ref output, .. } if output == "ERROR: Already revoked"
        ));
    }
}
