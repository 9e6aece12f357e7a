use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::CertdeskError;

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May manage other accounts
    Admin,
    /// Regular operator
    #[default]
    User,
}

impl FromStr for Role {
    type Err = CertdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(CertdeskError::validation(format!("invalid role: {s}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A user account as shown to callers. Never carries a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique account ID
    pub id: String,

    /// Login name
    pub username: String,

    /// Account role
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// Returns true if the account has the admin role
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!(matches!(
            "root".parse::<Role>(),
            Err(CertdeskError::Validation(_))
        ));
    }
}
