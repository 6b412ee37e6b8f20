//! In-memory reference backend.
//!
//! Implements every store trait against process memory. It behaves like the
//! REST backend in the ways the controllers depend on: token checks, newest
//! first listing, server-assigned ids and timestamps, field-keyed rejection
//! of payloads without a date, and `NotFound` for vanished ids. Tests can
//! queue failures with `fail_next` and inspect the calls that were made.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use dairyops_core::{
    sort_newest_first, Credential, Entity, FilterCriteria, Record, RecordKind, RecordSchema, Role,
};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::auth::BearerToken;
use crate::error::{FieldErrors, StoreError};
use crate::traits::{
    Account, AccountStore, CatalogKind, EntityCatalog, ExportFile, ExportService, ListHints,
    RecordStore,
};

/// Content type of exported spreadsheets.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

fn authorize(accepted: &BTreeSet<String>, auth: &BearerToken) -> Result<(), StoreError> {
    if accepted.contains(auth.expose()) {
        Ok(())
    } else {
        Err(StoreError::Unauthenticated(
            "invalid or expired token".to_string(),
        ))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex.lock().map_err(|_| StoreError::Unexpected {
        status: 500,
        message: "in-memory store lock poisoned".to_string(),
    })
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

/// A call observed by [`MemoryRecordStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List,
    Create,
    Update(String),
    Delete(String),
}

struct RecordState<S: RecordSchema> {
    records: Vec<Record<S>>,
    next_id: u64,
    calls: Vec<StoreCall>,
    failures: VecDeque<StoreError>,
    list_failures: VecDeque<StoreError>,
}

/// In-memory [`RecordStore`] for one record kind.
pub struct MemoryRecordStore<S: RecordSchema> {
    tokens: BTreeSet<String>,
    state: Mutex<RecordState<S>>,
}

impl<S: RecordSchema> MemoryRecordStore<S> {
    /// An empty store accepting `token`.
    pub fn new(token: &BearerToken) -> Self {
        MemoryRecordStore {
            tokens: [token.expose().to_string()].into_iter().collect(),
            state: Mutex::new(RecordState {
                records: Vec::new(),
                next_id: 1,
                calls: Vec::new(),
                failures: VecDeque::new(),
                list_failures: VecDeque::new(),
            }),
        }
    }

    /// Also accept `token`.
    pub fn accept(mut self, token: &BearerToken) -> Self {
        self.tokens.insert(token.expose().to_string());
        self
    }

    /// Seed records as if they had been stored earlier. Records without an
    /// id are assigned one.
    pub fn with_records(self, records: Vec<Record<S>>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            for mut record in records {
                if record.id.is_none() {
                    record.id = Some(state.next_id.to_string());
                    state.next_id += 1;
                }
                state.records.push(record);
            }
        }
        self
    }

    /// Make the next call fail with `error` after its token check.
    pub fn fail_next(&self, error: StoreError) {
        if let Ok(mut state) = self.state.lock() {
            state.failures.push_back(error);
        }
    }

    /// Make the next `list` call fail with `error`, leaving other calls alone.
    pub fn fail_next_list(&self, error: StoreError) {
        if let Ok(mut state) = self.state.lock() {
            state.list_failures.push_back(error);
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    /// Stored records in insertion order.
    pub fn records(&self) -> Vec<Record<S>> {
        self.state
            .lock()
            .map(|s| s.records.clone())
            .unwrap_or_default()
    }

    fn begin(
        &self,
        auth: &BearerToken,
        call: StoreCall,
    ) -> Result<MutexGuard<'_, RecordState<S>>, StoreError> {
        authorize(&self.tokens, auth)?;
        let mut state = lock(&self.state)?;
        let is_list = call == StoreCall::List;
        state.calls.push(call);
        if is_list {
            if let Some(error) = state.list_failures.pop_front() {
                return Err(error);
            }
        }
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        Ok(state)
    }

    fn not_found(id: &str) -> StoreError {
        StoreError::NotFound {
            kind: S::KIND.endpoint().to_string(),
            id: id.to_string(),
        }
    }
}

fn reject_undated<S: RecordSchema>(payload: &Record<S>) -> Result<(), StoreError> {
    if payload.inputs.date().is_none() {
        return Err(StoreError::Rejected(FieldErrors::single(
            "date",
            "This field is required.",
        )));
    }
    Ok(())
}

#[async_trait]
impl<S: RecordSchema> RecordStore<S> for MemoryRecordStore<S> {
    async fn list(
        &self,
        auth: &BearerToken,
        hints: &ListHints,
    ) -> Result<Vec<Record<S>>, StoreError> {
        let state = self.begin(auth, StoreCall::List)?;
        let mut records: Vec<Record<S>> = state
            .records
            .iter()
            .filter(|r| {
                let date = r.inputs.date();
                hints.date_from.map_or(true, |from| date.map_or(false, |d| d >= from))
                    && hints.date_to.map_or(true, |to| date.map_or(false, |d| d <= to))
            })
            .cloned()
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn create(
        &self,
        auth: &BearerToken,
        payload: &Record<S>,
    ) -> Result<Record<S>, StoreError> {
        let mut state = self.begin(auth, StoreCall::Create)?;
        reject_undated(payload)?;
        let now = now_rfc3339();
        let mut stored = payload.clone();
        stored.id = Some(state.next_id.to_string());
        stored.created_at = Some(now.clone());
        stored.updated_at = Some(now);
        state.next_id += 1;
        state.records.push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        auth: &BearerToken,
        id: &str,
        payload: &Record<S>,
    ) -> Result<Record<S>, StoreError> {
        let mut state = self.begin(auth, StoreCall::Update(id.to_string()))?;
        let existing = state
            .records
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(id))
            .ok_or_else(|| Self::not_found(id))?;
        reject_undated(payload)?;
        existing.inputs = payload.inputs.clone();
        existing.derived = payload.derived.clone();
        existing.updated_at = Some(now_rfc3339());
        Ok(existing.clone())
    }

    async fn delete(&self, auth: &BearerToken, id: &str) -> Result<(), StoreError> {
        let mut state = self.begin(auth, StoreCall::Delete(id.to_string()))?;
        let before = state.records.len();
        state.records.retain(|r| r.id.as_deref() != Some(id));
        if state.records.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

/// In-memory [`EntityCatalog`].
pub struct MemoryCatalog {
    tokens: BTreeSet<String>,
    animals: Vec<Entity>,
    employees: Vec<Entity>,
}

impl MemoryCatalog {
    pub fn new(token: &BearerToken) -> Self {
        MemoryCatalog {
            tokens: [token.expose().to_string()].into_iter().collect(),
            animals: Vec::new(),
            employees: Vec::new(),
        }
    }

    pub fn with_animals(mut self, animals: Vec<Entity>) -> Self {
        self.animals = animals;
        self
    }

    pub fn with_employees(mut self, employees: Vec<Entity>) -> Self {
        self.employees = employees;
        self
    }
}

#[async_trait]
impl EntityCatalog for MemoryCatalog {
    async fn list(
        &self,
        auth: &BearerToken,
        kind: CatalogKind,
    ) -> Result<Vec<Entity>, StoreError> {
        authorize(&self.tokens, auth)?;
        Ok(match kind {
            CatalogKind::Animals => self.animals.clone(),
            CatalogKind::Employees => self.employees.clone(),
        })
    }
}

/// In-memory [`AccountStore`] that re-checks the caller's role server-side.
pub struct MemoryAccountStore {
    /// token -> role of the user holding it
    sessions: Vec<(String, Role)>,
    accounts: Mutex<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        MemoryAccountStore {
            sessions: Vec::new(),
            accounts: Mutex::new(Vec::new()),
        }
    }

    /// Accept `token` as belonging to a user with `role`.
    pub fn with_session(mut self, token: &BearerToken, role: Role) -> Self {
        self.sessions.push((token.expose().to_string(), role));
        self
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create_account(
        &self,
        auth: &BearerToken,
        credential: &Credential,
    ) -> Result<Account, StoreError> {
        let role = self
            .sessions
            .iter()
            .find(|(token, _)| token == auth.expose())
            .map(|(_, role)| *role)
            .ok_or_else(|| StoreError::Unauthenticated("invalid or expired token".to_string()))?;
        if !role.can_manage_accounts() {
            return Err(StoreError::Forbidden(
                "only admins may create accounts".to_string(),
            ));
        }

        let mut accounts = lock(&self.accounts)?;
        if accounts
            .iter()
            .any(|a| a.username.eq_ignore_ascii_case(&credential.username))
        {
            return Err(StoreError::Rejected(FieldErrors::single(
                "username",
                "A user with that username already exists.",
            )));
        }
        let account = Account {
            id: (accounts.len() + 1).to_string(),
            username: credential.username.clone(),
            role: credential.role,
        };
        accounts.push(account.clone());
        Ok(account)
    }
}

/// In-memory [`ExportService`] that records every request it receives.
///
/// The produced file body is the JSON encoding of the forwarded criteria,
/// which lets tests assert on exactly what was forwarded.
pub struct MemoryExportService {
    tokens: BTreeSet<String>,
    requests: Mutex<Vec<(RecordKind, FilterCriteria)>>,
}

impl MemoryExportService {
    pub fn new(token: &BearerToken) -> Self {
        MemoryExportService {
            tokens: [token.expose().to_string()].into_iter().collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(RecordKind, FilterCriteria)> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ExportService for MemoryExportService {
    async fn export(
        &self,
        auth: &BearerToken,
        kind: RecordKind,
        criteria: &FilterCriteria,
    ) -> Result<ExportFile, StoreError> {
        authorize(&self.tokens, auth)?;
        lock(&self.requests)?.push((kind, criteria.clone()));
        let bytes = serde_json::to_vec(criteria).map_err(|e| StoreError::Unexpected {
            status: 500,
            message: e.to_string(),
        })?;
        Ok(ExportFile {
            file_name: format!("{}_export.xlsx", kind.endpoint()),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            bytes,
        })
    }
}
