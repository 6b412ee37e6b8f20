//! The create/edit form for one record.
//!
//! ```text
//! Empty ──set_field──▶ Editing ──submit──▶ Validating ──▶ Submitting ──▶ Submitted
//!   ▲                     ▲                    │               │
//!   └──────cancel─────────┤◀── invalid ────────┘               ▼
//!                         └────────── set_field ─────────── Failed
//! ```
//!
//! Only [`RecordDraftController::submit`] performs I/O.

use dairyops_core::{
    dependents, derive_all, missing_fields, DeriveContext, Entity, FieldAccessError, FieldValue,
    Record, RecordSchema, ValidationError,
};
use dairyops_storage::{FieldErrors, RecordStore, StoreError};
use thiserror::Error;

use crate::error::GeneralError;
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    Empty,
    Editing,
    Validating,
    Submitting,
    Submitted,
    /// The store refused or could not be reached. The draft is kept.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Field(#[from] FieldAccessError),

    /// Field-keyed messages from the store, untouched.
    #[error("rejected: {0}")]
    Rejected(FieldErrors),

    #[error(transparent)]
    General(#[from] GeneralError),

    #[error("a submission is already in progress")]
    AlreadySubmitting,
}

/// A successful submit. The owning list must be refetched.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission<S: RecordSchema> {
    pub record: Record<S>,
    /// `true` for a create, `false` for an update.
    pub created: bool,
}

pub struct RecordDraftController<S: RecordSchema> {
    session: SessionContext,
    catalog: Vec<Entity>,
    state: DraftState,
    draft: Record<S>,
    last_error: Option<DraftError>,
}

impl<S: RecordSchema> RecordDraftController<S> {
    /// A blank draft. `catalog` resolves per-entity targets.
    pub fn new(session: SessionContext, catalog: Vec<Entity>) -> Self {
        let draft = Record::draft(S::default(), &DeriveContext::new(&catalog));
        RecordDraftController {
            session,
            catalog,
            state: DraftState::Empty,
            draft,
            last_error: None,
        }
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn draft(&self) -> &Record<S> {
        &self.draft
    }

    /// The error from the most recent failed action, cleared by the next edit.
    pub fn last_error(&self) -> Option<&DraftError> {
        self.last_error.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.state == DraftState::Submitting
    }

    /// Start editing a persisted record. Derived fields are recomputed from
    /// its inputs, never copied.
    pub fn load(&mut self, record: Record<S>) -> Result<(), DraftError> {
        self.guard()?;
        let derived = derive_all(&record.inputs, &self.ctx());
        self.draft = Record { derived, ..record };
        self.last_error = None;
        self.transition(DraftState::Editing);
        Ok(())
    }

    /// Set one input field and recompute the derived fields that depend on it.
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), DraftError> {
        self.guard()?;
        if S::DERIVED.contains(&name) {
            return Err(FieldAccessError::Derived {
                field: name.to_string(),
            }
            .into());
        }
        self.draft.inputs.set_field(name, value.into())?;
        let ctx = DeriveContext::new(&self.catalog);
        for field in dependents::<S>(name) {
            self.draft.inputs.derive(field, &mut self.draft.derived, &ctx);
        }
        self.last_error = None;
        self.transition(DraftState::Editing);
        Ok(())
    }

    /// Replace the entity catalog, e.g. after it finished loading.
    pub fn set_catalog(&mut self, catalog: Vec<Entity>) {
        self.catalog = catalog;
        self.draft.derived = derive_all(&self.draft.inputs, &self.ctx());
    }

    /// Local checks only: required fields, then cross-field constraints.
    /// A failure returns the draft to `Editing`.
    pub fn validate(&mut self) -> Result<(), DraftError> {
        self.guard()?;
        self.transition(DraftState::Validating);
        let missing = missing_fields(&self.draft.inputs);
        let result = if missing.is_empty() {
            self.draft.inputs.cross_check()
        } else {
            Err(ValidationError::MissingFields(missing))
        };
        if let Err(e) = result {
            tracing::debug!(kind = %S::KIND, error = %e, "draft failed validation");
            self.transition(DraftState::Editing);
            return Err(self.fail_with(e.into()));
        }
        Ok(())
    }

    /// Validate, then create or update depending on whether the draft has an
    /// id. On success the draft is cleared.
    pub async fn submit(
        &mut self,
        store: &dyn RecordStore<S>,
    ) -> Result<Submission<S>, DraftError> {
        self.validate()?;
        let auth = match self.session.credential().cloned() {
            Ok(token) => token,
            Err(e) => {
                self.transition(DraftState::Failed);
                return Err(self.fail_with(e.into()));
            }
        };

        let mut payload = self.draft.clone();
        payload.derived = derive_all(&payload.inputs, &self.ctx());
        if payload.owner_ref.is_none() {
            payload.owner_ref = Some(self.session.user().id.clone());
        }

        self.transition(DraftState::Submitting);
        let created = payload.id.is_none();
        let result = match payload.id.as_deref() {
            Some(id) => store.update(&auth, id, &payload).await,
            None => store.create(&auth, &payload).await,
        };

        match result {
            Ok(record) => {
                tracing::info!(
                    kind = %S::KIND,
                    id = record.id.as_deref().unwrap_or(""),
                    created,
                    "record saved"
                );
                self.reset();
                self.transition(DraftState::Submitted);
                Ok(Submission { record, created })
            }
            Err(e) => {
                tracing::warn!(kind = %S::KIND, error = %e, "record save failed");
                self.transition(DraftState::Failed);
                let error = match e {
                    StoreError::Rejected(errors) => DraftError::Rejected(errors),
                    other => DraftError::General(other.into()),
                };
                Err(self.fail_with(error))
            }
        }
    }

    /// Discard the draft unconditionally.
    pub fn cancel(&mut self) {
        self.reset();
        self.transition(DraftState::Empty);
    }

    fn ctx(&self) -> DeriveContext<'_> {
        DeriveContext::new(&self.catalog)
    }

    fn guard(&self) -> Result<(), DraftError> {
        if self.is_submitting() {
            return Err(DraftError::AlreadySubmitting);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.draft = Record::draft(S::default(), &self.ctx());
        self.last_error = None;
    }

    fn fail_with(&mut self, error: DraftError) -> DraftError {
        self.last_error = Some(error.clone());
        error
    }

    fn transition(&mut self, next: DraftState) {
        if self.state != next {
            tracing::debug!(kind = %S::KIND, from = ?self.state, to = ?next, "draft state");
            self.state = next;
        }
    }
}
