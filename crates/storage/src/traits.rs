use async_trait::async_trait;
use dairyops_core::{Credential, Entity, FilterCriteria, Record, RecordKind, RecordSchema, Role};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::auth::BearerToken;
use crate::error::StoreError;

/// Optional narrowing a store may apply when listing. The client still
/// filters the returned records itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListHints {
    pub date_from: Option<Date>,
    pub date_to: Option<Date>,
}

impl ListHints {
    pub fn between(date_from: Option<Date>, date_to: Option<Date>) -> Self {
        ListHints { date_from, date_to }
    }
}

/// The record store for one record kind.
///
/// Every call carries the session's bearer credential. A store that does not
/// accept the credential returns [`StoreError::Unauthenticated`].
///
/// `list` returns records newest first (date descending, then creation time
/// descending). `create` and `update` return the record as stored, with `id`
/// and timestamps filled in. Rejected payloads come back as
/// [`StoreError::Rejected`] with the store's messages untouched.
///
/// Implementations must be `Send + Sync + 'static` so controllers can hold
/// them behind an `Arc`.
#[async_trait]
pub trait RecordStore<S: RecordSchema>: Send + Sync + 'static {
    async fn list(&self, auth: &BearerToken, hints: &ListHints)
        -> Result<Vec<Record<S>>, StoreError>;

    async fn create(&self, auth: &BearerToken, payload: &Record<S>)
        -> Result<Record<S>, StoreError>;

    /// Returns `Err(StoreError::NotFound)` if `id` does not exist.
    async fn update(
        &self,
        auth: &BearerToken,
        id: &str,
        payload: &Record<S>,
    ) -> Result<Record<S>, StoreError>;

    /// Returns `Err(StoreError::NotFound)` if `id` does not exist.
    async fn delete(&self, auth: &BearerToken, id: &str) -> Result<(), StoreError>;
}

/// Which reference list to read from the entity catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Animals,
    Employees,
}

impl CatalogKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            CatalogKind::Animals => "animals",
            CatalogKind::Employees => "employees",
        }
    }
}

/// Read-only reference entities (active animals, active employees).
#[async_trait]
pub trait EntityCatalog: Send + Sync + 'static {
    async fn list(&self, auth: &BearerToken, kind: CatalogKind)
        -> Result<Vec<Entity>, StoreError>;
}

/// A downloadable spreadsheet produced by the export service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Produces a spreadsheet of the records matching `criteria`.
#[async_trait]
pub trait ExportService: Send + Sync + 'static {
    async fn export(
        &self,
        auth: &BearerToken,
        kind: RecordKind,
        criteria: &FilterCriteria,
    ) -> Result<ExportFile, StoreError>;
}

/// A created user account as reported by the account store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Creates user accounts. Only the account-creation flow talks to it.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    async fn create_account(
        &self,
        auth: &BearerToken,
        credential: &Credential,
    ) -> Result<Account, StoreError>;
}
