//! dairyops-core: record kinds, derived metrics, filtering and credential
//! rules for the dairy operations screens.
//!
//! Everything in this crate is pure and synchronous. Stores, sessions and
//! controllers live in `dairyops-storage` and `dairyops-controller`.
//!
//! # Public API
//!
//! - [`password::validate_password`] -- credential policy
//! - [`metrics`] -- derived-field functions (`total_yield`, `performance`, ...)
//! - [`filter::filter`] / [`filter::summarize`] -- list filtering and totals
//! - [`RecordSchema`] / [`Record`] -- the record envelope and per-kind schemas
//! - [`records`] -- the six concrete record kinds

pub mod credential;
pub mod error;
pub mod filter;
pub mod metrics;
pub mod numeric;
pub mod password;
pub mod record;
pub mod records;

pub use credential::{Credential, Role};
pub use error::{FieldAccessError, ValidationError};
pub use filter::{FilterCriteria, Filterable, MonthKey, Summarize};
pub use metrics::Performance;
pub use numeric::NumericInput;
pub use password::{validate_password, RuleViolation};
pub use record::{
    dependents, derive_all, missing_fields, sort_newest_first, DeriveContext, Entity, FieldValue,
    Record, RecordKind, RecordSchema,
};
