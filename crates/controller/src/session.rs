use dairyops_core::Role;
use dairyops_storage::BearerToken;
use serde::{Deserialize, Serialize};

use crate::error::GeneralError;

/// The signed-in user as reported at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Who is acting and with which credential.
///
/// Created at login and handed to every controller constructor. The only
/// change allowed during its lifetime is a token refresh, which produces a
/// new context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    user: CurrentUser,
    credential: Option<BearerToken>,
}

impl SessionContext {
    pub fn new(user: CurrentUser, credential: Option<BearerToken>) -> Self {
        SessionContext { user, credential }
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    /// The bearer credential, or `Unauthenticated` when the session has none.
    pub fn credential(&self) -> Result<&BearerToken, GeneralError> {
        self.credential
            .as_ref()
            .ok_or_else(|| GeneralError::Unauthenticated("no session credential".to_string()))
    }

    pub fn with_refreshed_token(self, token: BearerToken) -> Self {
        SessionContext {
            credential: Some(token),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: "7".into(),
            username: "asha".into(),
            role: Role::Supervisor,
        }
    }

    #[test]
    fn missing_credential_is_unauthenticated() {
        let session = SessionContext::new(user(), None);
        assert!(matches!(
            session.credential(),
            Err(GeneralError::Unauthenticated(_))
        ));
    }

    #[test]
    fn refresh_replaces_only_the_token() {
        let session = SessionContext::new(user(), Some(BearerToken::new("old")));
        let refreshed = session.clone().with_refreshed_token(BearerToken::new("new"));
        assert_eq!(refreshed.user(), session.user());
        assert_eq!(refreshed.credential().unwrap().expose(), "new");
    }
}
