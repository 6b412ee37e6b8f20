//! Admin-only account creation.
//!
//! The role gate is checked when the flow is opened and again right before
//! the store call. Local checks run in order (required fields, confirmation
//! match, password policy) and stop at the first failing stage.

use std::time::{Duration, Instant};

use dairyops_core::{validate_password, Credential, Role, RuleViolation, ValidationError};
use dairyops_storage::{Account, AccountStore, FieldErrors, StoreError};
use thiserror::Error;

use crate::error::GeneralError;
use crate::session::SessionContext;

/// How long the "account created" acknowledgment stays visible.
pub const ACKNOWLEDGMENT_WINDOW: Duration = Duration::from_secs(3);

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required.";
pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Field-keyed messages from the account store, untouched.
    #[error("rejected: {0}")]
    Rejected(FieldErrors),

    #[error(transparent)]
    General(#[from] GeneralError),

    #[error("an account is already being created")]
    AlreadySubmitting,
}

impl AccountError {
    /// Messages to show, keyed by the field they belong next to. General
    /// messages use [`FieldErrors::NON_FIELD`].
    pub fn field_errors(&self) -> FieldErrors {
        match self {
            AccountError::Validation(ValidationError::MissingFields(_)) => {
                FieldErrors::single(FieldErrors::NON_FIELD, ALL_FIELDS_REQUIRED)
            }
            AccountError::Validation(ValidationError::Mismatch { field, .. }) => {
                FieldErrors::single(field.clone(), PASSWORDS_DO_NOT_MATCH)
            }
            AccountError::Validation(ValidationError::PasswordPolicy(violations)) => {
                let mut errors = FieldErrors::new();
                for v in violations {
                    errors.push("password", v.message());
                }
                errors
            }
            AccountError::Validation(ValidationError::Invalid { field, message }) => {
                FieldErrors::single(field.clone(), message.clone())
            }
            AccountError::Rejected(errors) => errors.clone(),
            other => FieldErrors::single(FieldErrors::NON_FIELD, other.to_string()),
        }
    }
}

pub struct AccountCreationFlow {
    session: SessionContext,
    draft: Credential,
    submitting: bool,
    acknowledged_at: Option<Instant>,
}

impl AccountCreationFlow {
    /// Open the flow. Refused unless the session belongs to an admin.
    pub fn open(session: SessionContext) -> Result<Self, AccountError> {
        check_role(session.role())?;
        Ok(AccountCreationFlow {
            session,
            draft: Credential::default(),
            submitting: false,
            acknowledged_at: None,
        })
    }

    pub fn credential(&self) -> &Credential {
        &self.draft
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.draft.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.draft.password = password.into();
    }

    pub fn set_confirm_password(&mut self, confirm: impl Into<String>) {
        self.draft.confirm_password = confirm.into();
    }

    pub fn set_role(&mut self, role: Role) {
        self.draft.role = role;
    }

    /// Live policy feedback for the password field. Cheap enough to call on
    /// every keystroke.
    pub fn password_violations(&self) -> Vec<RuleViolation> {
        validate_password(&self.draft.password)
    }

    /// Run the local checks, then ask the account store to create the
    /// account. On success the draft is cleared and the acknowledgment is
    /// shown from `now`.
    pub async fn create_account(
        &mut self,
        store: &dyn AccountStore,
        now: Instant,
    ) -> Result<Account, AccountError> {
        if self.submitting {
            return Err(AccountError::AlreadySubmitting);
        }
        check_role(self.session.role())?;
        self.draft.check()?;
        let auth = self.session.credential()?.clone();

        let result = {
            let _in_flight = InFlight::enter(&mut self.submitting);
            store.create_account(&auth, &self.draft).await
        };

        match result {
            Ok(account) => {
                tracing::info!(username = %account.username, role = account.role.as_str(), "account created");
                self.draft = Credential::default();
                self.acknowledged_at = Some(now);
                Ok(account)
            }
            Err(StoreError::Rejected(errors)) => {
                tracing::warn!(%errors, "account store rejected credential");
                Err(AccountError::Rejected(errors))
            }
            Err(e) => {
                tracing::warn!(error = %e, "account creation failed");
                Err(AccountError::General(e.into()))
            }
        }
    }

    /// Whether the success acknowledgment is showing at `now`. Once the
    /// window has passed it is dismissed for good.
    pub fn acknowledgment(&mut self, now: Instant) -> bool {
        match self.acknowledged_at {
            Some(at) if now.saturating_duration_since(at) < ACKNOWLEDGMENT_WINDOW => true,
            Some(_) => {
                self.acknowledged_at = None;
                false
            }
            None => false,
        }
    }
}

/// Holds the submitting flag up while a store call is pending. Clears it on
/// drop so an abandoned call does not lock the flow.
struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a mut bool) -> Self {
        *flag = true;
        InFlight(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn check_role(role: Role) -> Result<(), GeneralError> {
    if role.can_manage_accounts() {
        Ok(())
    } else {
        Err(GeneralError::Forbidden(format!(
            "the {} role cannot create accounts",
            role.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::CurrentUser;
    use dairyops_storage::{BearerToken, MemoryAccountStore};

    fn session(role: Role) -> SessionContext {
        SessionContext::new(
            CurrentUser {
                id: "1".into(),
                username: "root".into(),
                role,
            },
            Some(BearerToken::new("admin-token")),
        )
    }

    fn filled(flow: &mut AccountCreationFlow, password: &str, confirm: &str) {
        flow.set_username("milker");
        flow.set_password(password);
        flow.set_confirm_password(confirm);
    }

    #[test]
    fn supervisor_cannot_open() {
        let err = AccountCreationFlow::open(session(Role::Supervisor))
            .err()
            .unwrap();
        assert!(matches!(err, AccountError::General(GeneralError::Forbidden(_))));
    }

    #[tokio::test]
    async fn missing_fields_are_a_general_error() {
        let store = MemoryAccountStore::new();
        let mut flow = AccountCreationFlow::open(session(Role::Admin)).unwrap();
        flow.set_username("milker");
        let err = flow
            .create_account(&store, Instant::now())
            .await
            .unwrap_err();
        assert_eq!(
            err.field_errors().get(FieldErrors::NON_FIELD).unwrap(),
            [ALL_FIELDS_REQUIRED]
        );
    }

    #[tokio::test]
    async fn mismatch_is_keyed_to_confirmation() {
        let store = MemoryAccountStore::new();
        let mut flow = AccountCreationFlow::open(session(Role::Admin)).unwrap();
        filled(&mut flow, "Abc123!@", "Abc123!#");
        let err = flow
            .create_account(&store, Instant::now())
            .await
            .unwrap_err();
        assert_eq!(
            err.field_errors().get("confirm_password").unwrap(),
            [PASSWORDS_DO_NOT_MATCH]
        );
    }

    #[tokio::test]
    async fn policy_violations_are_keyed_to_password() {
        let store = MemoryAccountStore::new();
        let mut flow = AccountCreationFlow::open(session(Role::Admin)).unwrap();
        filled(&mut flow, "abc12345", "abc12345");
        let err = flow
            .create_account(&store, Instant::now())
            .await
            .unwrap_err();
        assert_eq!(
            err.field_errors().get("password").unwrap(),
            ["One uppercase letter", "One special character"]
        );
        assert!(store.accounts().is_empty());
    }

    struct StalledStore;

    #[async_trait::async_trait]
    impl AccountStore for StalledStore {
        async fn create_account(
            &self,
            _auth: &BearerToken,
            _credential: &Credential,
        ) -> Result<Account, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn abandoned_submission_does_not_lock_the_flow() {
        let mut flow = AccountCreationFlow::open(session(Role::Admin)).unwrap();
        filled(&mut flow, "Abc123!@", "Abc123!@");

        let abandoned = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            flow.create_account(&StalledStore, Instant::now()),
        )
        .await;
        assert!(abandoned.is_err());

        let token = BearerToken::new("admin-token");
        let store = MemoryAccountStore::new().with_session(&token, Role::Admin);
        let account = flow.create_account(&store, Instant::now()).await.unwrap();
        assert_eq!(account.username, "milker");
    }

    #[tokio::test]
    async fn success_clears_draft_and_acknowledges_for_three_seconds() {
        let token = BearerToken::new("admin-token");
        let store = MemoryAccountStore::new().with_session(&token, Role::Admin);
        let mut flow = AccountCreationFlow::open(session(Role::Admin)).unwrap();
        filled(&mut flow, "Abc123!@", "Abc123!@");

        let start = Instant::now();
        let account = flow.create_account(&store, start).await.unwrap();
        assert_eq!(account.username, "milker");
        assert_eq!(flow.credential(), &Credential::default());

        assert!(flow.acknowledgment(start + Duration::from_millis(2900)));
        assert!(!flow.acknowledgment(start + ACKNOWLEDGMENT_WINDOW));
        assert!(!flow.acknowledgment(start + Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn store_field_errors_pass_through() {
        let token = BearerToken::new("admin-token");
        let store = MemoryAccountStore::new().with_session(&token, Role::Admin);
        let mut flow = AccountCreationFlow::open(session(Role::Admin)).unwrap();
        filled(&mut flow, "Abc123!@", "Abc123!@");
        flow.create_account(&store, Instant::now()).await.unwrap();

        filled(&mut flow, "Abc123!@", "Abc123!@");
        let err = flow
            .create_account(&store, Instant::now())
            .await
            .unwrap_err();
        assert_eq!(
            err.field_errors().get("username").unwrap(),
            ["A user with that username already exists."]
        );
    }
}
