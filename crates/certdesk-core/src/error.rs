use thiserror::Error;

/// Result type alias for certdesk operations
pub type Result<T> = std::result::Result<T, CertdeskError>;

/// Errors that can occur anywhere in certdesk
#[derive(Error, Debug)]
pub enum CertdeskError {
    /// Required input was missing, empty or malformed
    #[error("validation failed: {0}")]
    Validation(String),

    /// Caller lacks the capability for this operation
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Login attempt with an unknown user or a wrong password
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The external issuance/revocation action did not succeed
    #[error("{action} action failed ({})", .status.map_or_else(|| "no exit status".to_string(), |code| format!("exit status {code}")))]
    ExternalAction {
        /// Which action ran (`issue` or `revoke`)
        action: String,
        /// Process exit status, `None` if the process never exited normally
        status: Option<i32>,
        /// Captured output of the action, verbatim
        output: String,
    },

    /// Resource not found
    #[error("resource not found: {resource}")]
    NotFound {
        /// Description of the resource that wasn't found
        resource: String,
    },

    /// Resource already exists
    #[error("conflict: {0}")]
    Conflict(String),

    /// Server answered with an unexpected error status
    #[error("API error ({code}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Error message from the server
        message: String,
    },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Request timed out
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Connection failed
    #[error("connection failed: {0}")]
    Connection(String),

    /// Filesystem I/O failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path being read or written
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CertdeskError {
    /// Build an I/O error tagged with the path involved
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true if the server could not be reached at all.
    ///
    /// Gateway statuses count as unreachable: a proxy answered, the
    /// certificate service behind it did not.
    #[must_use]
    pub const fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Connection(_)
                | Self::Timeout(_)
                | Self::Api {
                    code: 502..=504,
                    ..
                }
        )
    }

    /// Returns true if the error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
    }

    /// Returns the HTTP status code that represents this error
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Validation(_) => Some(400),
            Self::InvalidCredentials => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Conflict(_) => Some(409),
            Self::ExternalAction { .. } => Some(500),
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_action_message_includes_status() {
        let err = CertdeskError::ExternalAction {
            action: "revoke".into(),
            status: Some(3),
            output: "openssl: no such certificate".into(),
        };
        assert_eq!(err.to_string(), "revoke action failed (exit status 3)");

        let err = CertdeskError::ExternalAction {
            action: "issue".into(),
            status: None,
            output: String::new(),
        };
        assert_eq!(err.to_string(), "issue action failed (no exit status)");
    }

    #[test]
    fn network_errors_are_classified() {
        assert!(CertdeskError::Connection("refused".into()).is_network_error());
        assert!(CertdeskError::Timeout(30).is_network_error());
        assert!(CertdeskError::Api {
            code: 503,
            message: "unavailable".into()
        }
        .is_network_error());
        assert!(!CertdeskError::Api {
            code: 500,
            message: "boom".into()
        }
        .is_network_error());
        assert!(!CertdeskError::validation("missing domain").is_network_error());
    }

    #[test]
    fn status_codes() {
        assert_eq!(CertdeskError::validation("x").status_code(), Some(400));
        assert_eq!(CertdeskError::InvalidCredentials.status_code(), Some(401));
        assert_eq!(CertdeskError::Forbidden("x".into()).status_code(), Some(403));
        assert_eq!(CertdeskError::Conflict("x".into()).status_code(), Some(409));
        assert_eq!(CertdeskError::Internal("x".into()).status_code(), None);
    }
}
