//! Account credentials and the roles that gate account management.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::password::validate_password;

/// A user's role. Only [`Role::Admin`] may create accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Supervisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
        }
    }

    pub fn can_manage_accounts(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "supervisor" => Ok(Role::Supervisor),
            other => Err(format!(
                "unknown role '{}', expected 'admin' or 'supervisor'",
                other
            )),
        }
    }
}

/// A new-account draft. Exists only while an account is being created.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl Credential {
    /// Names of required fields that are empty, in form order.
    pub fn missing_fields(&self) -> Vec<String> {
        [
            ("username", self.username.trim()),
            ("password", self.password.as_str()),
            ("confirm_password", self.confirm_password.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name.to_string())
        .collect()
    }

    /// Run the local checks in order: required fields, confirmation match,
    /// password policy. Stops at the first failing stage.
    pub fn check(&self) -> Result<(), ValidationError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::Mismatch {
                field: "confirm_password".to_string(),
                other: "password".to_string(),
            });
        }
        let violations = validate_password(&self.password);
        if !violations.is_empty() {
            return Err(ValidationError::PasswordPolicy(violations));
        }
        Ok(())
    }
}
