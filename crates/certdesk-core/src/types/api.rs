//! JSON bodies exchanged between the server and management clients.

use serde::{Deserialize, Serialize};

use super::{AuditEntry, Certificate, User};

/// Actor recorded when a request does not name one
pub const DEFAULT_ACTOR: &str = "system";

/// Header carrying the calling username for account administration
pub const CALLER_HEADER: &str = "x-certdesk-user";

/// Resolve the actor for an audited action, falling back to [`DEFAULT_ACTOR`]
#[must_use]
pub fn resolve_actor(username: Option<&str>) -> &str {
    username
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_ACTOR)
}

/// Response from `GET /api/certificates`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateList {
    /// All certificates, unordered
    #[serde(default)]
    pub certificates: Vec<Certificate>,
}

/// Response from `GET /api/history`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryList {
    /// Audit entries, newest first
    #[serde(default)]
    pub history: Vec<AuditEntry>,
}

/// Response from `GET /api/users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserList {
    /// Accounts without password material
    #[serde(default)]
    pub users: Vec<User>,
}

/// Body of `POST /api/certificate/create`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateRequest {
    /// Domain to issue for
    #[serde(default)]
    pub domain: String,

    /// Second argument handed to the issuance action
    #[serde(default)]
    pub additional_param: String,

    /// Acting user, defaults to [`DEFAULT_ACTOR`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Body of `POST /api/certificate/revoke`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevokeCertificateRequest {
    /// Certificate ID to revoke
    #[serde(default)]
    pub id: String,

    /// Acting user, defaults to [`DEFAULT_ACTOR`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Confirmation for a successful create/revoke
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Always true for a 2xx answer
    pub success: bool,

    /// Human readable confirmation
    pub message: String,
}

/// Body of `POST /api/users/login`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login name
    #[serde(default)]
    pub username: String,

    /// Plain-text password
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /api/users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    /// Login name
    #[serde(default)]
    pub username: String,

    /// Plain-text password, hashed before storage
    #[serde(default)]
    pub password: String,

    /// `admin` or `user`
    #[serde(default)]
    pub role: String,
}

/// Body of `DELETE /api/users`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    /// Account ID to delete
    #[serde(default)]
    pub id: String,
}

/// Response carrying a sanitized account (login, create user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// Always true for a 2xx answer
    pub success: bool,

    /// The account, without password
    pub user: User,
}

/// Bare success acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Always true for a 2xx answer
    pub success: bool,
}

/// Error body returned with every non-2xx status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error message
    pub error: String,

    /// Failed external action (`issue` / `revoke`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Exit status of the failed action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,

    /// Captured output of the failed action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actor_defaults_to_system() {
        assert_eq!(resolve_actor(None), "system");
        assert_eq!(resolve_actor(Some("  ")), "system");
        assert_eq!(resolve_actor(Some("alice")), "alice");
    }

    #[test]
    fn create_request_uses_original_field_names() {
        let req: CreateCertificateRequest =
            serde_json::from_str(r#"{"domain":"bar.example.com","additionalParam":"aux"}"#).unwrap();
        assert_eq!(req.domain, "bar.example.com");
        assert_eq!(req.additional_param, "aux");
        assert!(req.username.is_none());
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let req: CreateCertificateRequest = serde_json::from_str("{}").unwrap();
        assert!(req.domain.is_empty());
        assert!(req.additional_param.is_empty());
    }
}
