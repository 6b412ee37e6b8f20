//! One list screen: the fetched records for a kind, the active filter, and
//! the actions that mutate the list.

use std::collections::BTreeMap;
use std::sync::Arc;

use dairyops_core::filter::{filter, summarize, summarize_by_month};
use dairyops_core::{Entity, FilterCriteria, MonthKey, Record, RecordSchema};
use dairyops_storage::{
    CatalogKind, EntityCatalog, ExportFile, ExportService, ListHints, RecordStore, StoreError,
};
use thiserror::Error;

use crate::draft::{DraftError, RecordDraftController, Submission};
use crate::error::GeneralError;
use crate::session::SessionContext;

/// Blocking yes/no prompt shown before a destructive action.
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirmation for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScreenError {
    #[error(transparent)]
    General(#[from] GeneralError),

    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error("no record with id {0} on this screen")]
    UnknownRecord(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; nothing was sent to the store.
    Declined,
    Deleted,
}

/// A saved draft and the result of the refetch that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOutcome<S: RecordSchema> {
    pub submission: Submission<S>,
    /// Set when the save succeeded but reloading the list did not.
    pub refresh_error: Option<GeneralError>,
}

pub struct ListScreen<S: RecordSchema> {
    session: SessionContext,
    store: Arc<dyn RecordStore<S>>,
    records: Vec<Record<S>>,
    criteria: FilterCriteria,
    error: Option<GeneralError>,
}

impl<S: RecordSchema> ListScreen<S> {
    pub fn new(session: SessionContext, store: Arc<dyn RecordStore<S>>) -> Self {
        ListScreen {
            session,
            store,
            records: Vec::new(),
            criteria: FilterCriteria::default(),
            error: None,
        }
    }

    /// Fetch the list. On failure the previous list is kept and the error
    /// is remembered for the banner.
    pub async fn load(&mut self) -> Result<(), GeneralError> {
        let hints = ListHints::between(self.criteria.date_from, self.criteria.date_to);
        let result = match self.session.credential() {
            Ok(auth) => self.store.list(auth, &hints).await.map_err(GeneralError::from),
            Err(e) => Err(e),
        };
        match result {
            Ok(records) => {
                tracing::debug!(kind = %S::KIND, count = records.len(), "list loaded");
                self.records = records;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(kind = %S::KIND, error = %e, "list load failed");
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Re-issue the same list fetch.
    pub async fn retry(&mut self) -> Result<(), GeneralError> {
        self.load().await
    }

    pub fn records(&self) -> &[Record<S>] {
        &self.records
    }

    pub fn error(&self) -> Option<&GeneralError> {
        self.error.as_ref()
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Replace the filter. Narrowing is applied locally; call [`load`] after
    /// widening the date range so the store can return the extra records.
    ///
    /// [`load`]: ListScreen::load
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    /// Records passing the active filter, in fetch order.
    pub fn visible(&self) -> Vec<&Record<S>> {
        filter(&self.records, &self.criteria)
    }

    pub fn totals(&self) -> S::Totals {
        summarize(self.visible())
    }

    pub fn monthly_summary(&self) -> BTreeMap<MonthKey, S::Totals> {
        summarize_by_month(self.visible())
    }

    /// Fetch reference entities for new or edited drafts.
    pub async fn fetch_catalog(
        &self,
        catalog: &dyn EntityCatalog,
        kind: CatalogKind,
    ) -> Result<Vec<Entity>, GeneralError> {
        let auth = self.session.credential()?;
        catalog.list(auth, kind).await.map_err(|e| {
            tracing::warn!(catalog = kind.endpoint(), error = %e, "catalog fetch failed");
            GeneralError::from(e)
        })
    }

    pub fn open_new(&self, catalog: Vec<Entity>) -> RecordDraftController<S> {
        RecordDraftController::new(self.session.clone(), catalog)
    }

    pub fn open_edit(
        &self,
        id: &str,
        catalog: Vec<Entity>,
    ) -> Result<RecordDraftController<S>, ScreenError> {
        let record = self
            .find(id)
            .cloned()
            .ok_or_else(|| ScreenError::UnknownRecord(id.to_string()))?;
        let mut draft = RecordDraftController::new(self.session.clone(), catalog);
        draft.load(record)?;
        Ok(draft)
    }

    /// Submit `draft`, then refetch the list. An update whose target
    /// vanished also refetches before the error is returned.
    pub async fn save(
        &mut self,
        draft: &mut RecordDraftController<S>,
    ) -> Result<SaveOutcome<S>, ScreenError> {
        let submission = match draft.submit(self.store.as_ref()).await {
            Ok(submission) => submission,
            Err(e @ DraftError::General(GeneralError::NotFound { .. })) => {
                tracing::warn!(kind = %S::KIND, "update target gone, refreshing");
                let _ = self.load().await;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };
        let refresh_error = self.load().await.err();
        Ok(SaveOutcome {
            submission,
            refresh_error,
        })
    }

    /// Delete after the user confirms. Declining sends nothing. A record
    /// that vanished from the store triggers a refetch before the error is
    /// returned; other failures leave the list as it was.
    pub async fn delete(
        &mut self,
        id: &str,
        confirmation: &dyn Confirmation,
    ) -> Result<DeleteOutcome, ScreenError> {
        if self.find(id).is_none() {
            return Err(ScreenError::UnknownRecord(id.to_string()));
        }
        let prompt = format!("Delete this {} record?", S::KIND.label());
        if !confirmation.confirm(&prompt) {
            tracing::debug!(kind = %S::KIND, id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        let auth = self.session.credential()?.clone();
        match self.store.delete(&auth, id).await {
            Ok(()) => {
                tracing::info!(kind = %S::KIND, id, "record deleted");
                self.records.retain(|r| r.id.as_deref() != Some(id));
                Ok(DeleteOutcome::Deleted)
            }
            Err(e @ StoreError::NotFound { .. }) => {
                tracing::warn!(kind = %S::KIND, id, "record already gone, refreshing");
                // The refetch outcome lands in `error()`.
                let _ = self.load().await;
                Err(GeneralError::from(e).into())
            }
            Err(e) => {
                tracing::warn!(kind = %S::KIND, id, error = %e, "delete failed");
                Err(GeneralError::from(e).into())
            }
        }
    }

    /// Ask the export service for a spreadsheet of the active criteria.
    pub async fn export(&self, service: &dyn ExportService) -> Result<ExportFile, GeneralError> {
        let auth = self.session.credential()?;
        let file = service.export(auth, S::KIND, &self.criteria).await?;
        tracing::info!(kind = %S::KIND, file = %file.file_name, bytes = file.bytes.len(), "export ready");
        Ok(file)
    }

    fn find(&self, id: &str) -> Option<&Record<S>> {
        self.records.iter().find(|r| r.id.as_deref() == Some(id))
    }
}
