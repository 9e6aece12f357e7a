//! Account API endpoints.

use crate::CertdeskClient;
use certdesk_core::{
    CreateUserRequest, DeleteUserRequest, LoginRequest, Result, Role, SuccessResponse, User,
    UserList, UserResponse,
};
use reqwest::Method;

/// Account API endpoints
pub struct UsersApi<'a> {
    client: &'a CertdeskClient,
}

impl<'a> UsersApi<'a> {
    pub(crate) const fn new(client: &'a CertdeskClient) -> Self {
        Self { client }
    }

    /// List all accounts
    pub async fn list(&self) -> Result<Vec<User>> {
        let list: UserList = self.client.get("/api/users").await?;
        Ok(list.users)
    }

    /// Check credentials and return the account
    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp: UserResponse = self.client.post("/api/users/login", &body).await?;
        Ok(resp.user)
    }

    /// Create an account on behalf of `caller` (must be an admin)
    pub async fn create(
        &self,
        caller: Option<&str>,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User> {
        let body = CreateUserRequest {
            username: username.to_string(),
            password: password.to_string(),
            role: role.to_string(),
        };
        let resp: UserResponse = self
            .client
            .request_with_headers(
                Method::POST,
                "/api/users",
                &body,
                CertdeskClient::caller_headers(caller),
            )
            .await?;
        Ok(resp.user)
    }

    /// Delete an account on behalf of `caller` (must be an admin, not self)
    pub async fn delete(&self, caller: Option<&str>, id: &str) -> Result<()> {
        let body = DeleteUserRequest { id: id.to_string() };
        let _: SuccessResponse = self
            .client
            .request_with_headers(
                Method::DELETE,
                "/api/users",
                &body,
                CertdeskClient::caller_headers(caller),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{CertdeskClient, CertdeskError};
    use certdesk_core::Role;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_sends_caller_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users"))
            .and(header("x-certdesk-user", "admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "user": { "id": "u3", "username": "carol", "role": "user" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CertdeskClient::new(server.uri()).unwrap();
        let user = client
            .users()
            .create(Some("admin"), "carol", "pw", Role::User)
            .await
            .unwrap();
        assert_eq!(user.username, "carol");
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/users/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "error": "invalid username or password" })),
            )
            .mount(&server)
            .await;

        let client = CertdeskClient::new(server.uri()).unwrap();
        assert!(matches!(
            client.users().login("admin", "nope").await,
            Err(CertdeskError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn self_delete_is_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/users"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_json(json!({ "error": "forbidden: cannot delete your own account" })),
            )
            .mount(&server)
            .await;

        let client = CertdeskClient::new(server.uri()).unwrap();
        assert!(matches!(
            client.users().delete(Some("admin"), "u1").await,
            Err(CertdeskError::Forbidden(_))
        ));
    }
}
