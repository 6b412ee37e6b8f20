//! The generic record envelope and the schema trait every record kind
//! implements.
//!
//! Record kinds are a closed set ([`RecordKind`]); each has its own input
//! struct implementing [`RecordSchema`]. The filter and derivation
//! algorithms are written once against the trait.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime, Time};

use crate::error::{FieldAccessError, ValidationError};
use crate::filter::{Filterable, Summarize};

// ──────────────────────────────────────────────
// Record kinds
// ──────────────────────────────────────────────

/// The record kinds managed by the farm screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    MilkYield,
    FeedStock,
    PurchaseRequest,
    MilkingHygiene,
    Attendance,
    RecordBackup,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::MilkYield,
        RecordKind::FeedStock,
        RecordKind::PurchaseRequest,
        RecordKind::MilkingHygiene,
        RecordKind::Attendance,
        RecordKind::RecordBackup,
    ];

    /// REST collection name for this kind.
    pub fn endpoint(&self) -> &'static str {
        match self {
            RecordKind::MilkYield => "milk-yield",
            RecordKind::FeedStock => "feed-stock",
            RecordKind::PurchaseRequest => "purchase-request",
            RecordKind::MilkingHygiene => "milking-hygiene",
            RecordKind::Attendance => "attendance",
            RecordKind::RecordBackup => "record-backup",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::MilkYield => "milk yield",
            RecordKind::FeedStock => "feed stock",
            RecordKind::PurchaseRequest => "purchase request",
            RecordKind::MilkingHygiene => "milking hygiene",
            RecordKind::Attendance => "attendance",
            RecordKind::RecordBackup => "record backup",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        RecordKind::ALL
            .into_iter()
            .find(|k| k.endpoint() == wanted)
            .ok_or_else(|| format!("unknown record kind '{}'", s))
    }
}

// ──────────────────────────────────────────────
// Entity catalog entries
// ──────────────────────────────────────────────

/// A read-only reference entity (an animal or an employee).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Per-entity target, e.g. an animal's expected daily yield.
    #[serde(default)]
    pub target_metric: Option<Decimal>,
}

/// Read-only context available to derivations.
#[derive(Debug, Clone, Copy)]
pub struct DeriveContext<'a> {
    pub catalog: &'a [Entity],
}

impl<'a> DeriveContext<'a> {
    pub fn new(catalog: &'a [Entity]) -> Self {
        DeriveContext { catalog }
    }

    pub fn empty() -> DeriveContext<'static> {
        DeriveContext { catalog: &[] }
    }
}

// ──────────────────────────────────────────────
// Field values
// ──────────────────────────────────────────────

/// A value written into a draft field by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Empty,
    Text(String),
    Date(Date),
    Time(Time),
    Flag(bool),
    Selection(Vec<String>),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Empty => "Empty",
            FieldValue::Text(_) => "Text",
            FieldValue::Date(_) => "Date",
            FieldValue::Time(_) => "Time",
            FieldValue::Flag(_) => "Flag",
            FieldValue::Selection(_) => "Selection",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Date> for FieldValue {
    fn from(d: Date) -> Self {
        FieldValue::Date(d)
    }
}

impl From<Time> for FieldValue {
    fn from(t: Time) -> Self {
        FieldValue::Time(t)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(ids: Vec<String>) -> Self {
        FieldValue::Selection(ids)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(ids: Vec<&str>) -> Self {
        FieldValue::Selection(ids.into_iter().map(str::to_string).collect())
    }
}

// ──────────────────────────────────────────────
// Schema trait
// ──────────────────────────────────────────────

/// The input schema of one record kind.
///
/// The implementing struct holds the user-entered fields; `Derived` holds the
/// fields computed from them. Derivation is driven by two static tables:
/// `DERIVED` lists every derived field in recompute order, and
/// `DEPENDENCIES` maps each input field to the derived fields that must be
/// recomputed, in order, when it changes.
pub trait RecordSchema:
    Clone + Default + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Derived: Clone
        + Default
        + fmt::Debug
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
    type Totals: Clone + Default + fmt::Debug + PartialEq + Serialize + Send + 'static;

    const KIND: RecordKind;
    const REQUIRED: &'static [&'static str];
    const DERIVED: &'static [&'static str];
    const DEPENDENCIES: &'static [(&'static str, &'static [&'static str])];

    /// Overwrite one input field.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldAccessError>;

    /// Whether an input field holds a non-blank value.
    fn has_value(&self, name: &str) -> bool;

    /// Recompute a single derived field from the current inputs. Derived
    /// fields listed earlier in `DERIVED` are already up to date.
    fn derive(&self, field: &str, derived: &mut Self::Derived, ctx: &DeriveContext<'_>);

    fn date(&self) -> Option<Date>;

    /// Text fields matched by free-text search.
    fn search_fields(&self) -> Vec<&str>;

    /// Value of the categorical facet, if the record has one.
    fn facet<'a>(&'a self, derived: &'a Self::Derived) -> Option<&'a str>;

    /// Fold this record into running totals.
    fn accumulate(&self, derived: &Self::Derived, totals: &mut Self::Totals);

    /// Cross-field constraints checked on submit.
    fn cross_check(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Derived fields to recompute after `input` changes.
pub fn dependents<S: RecordSchema>(input: &str) -> &'static [&'static str] {
    S::DEPENDENCIES
        .iter()
        .find(|(name, _)| *name == input)
        .map(|(_, derived)| *derived)
        .unwrap_or(&[])
}

/// Compute every derived field from scratch.
pub fn derive_all<S: RecordSchema>(inputs: &S, ctx: &DeriveContext<'_>) -> S::Derived {
    let mut derived = S::Derived::default();
    for field in S::DERIVED {
        inputs.derive(field, &mut derived, ctx);
    }
    derived
}

/// Required fields with no value, in schema order.
pub fn missing_fields<S: RecordSchema>(inputs: &S) -> Vec<String> {
    S::REQUIRED
        .iter()
        .filter(|name| !inputs.has_value(name))
        .map(|name| name.to_string())
        .collect()
}

// ──────────────────────────────────────────────
// Record envelope
// ──────────────────────────────────────────────

/// A record of kind `S`: inputs and derived fields plus store-managed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Record<S: RecordSchema> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_ref: Option<String>,
    #[serde(flatten)]
    pub inputs: S,
    #[serde(flatten)]
    pub derived: S::Derived,
    /// RFC 3339 timestamp set by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// RFC 3339 timestamp set by the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl<S: RecordSchema> Default for Record<S> {
    fn default() -> Self {
        Record {
            id: None,
            owner_ref: None,
            inputs: S::default(),
            derived: S::Derived::default(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl<S: RecordSchema> Record<S> {
    /// An unsaved record with derived fields computed from `inputs`.
    pub fn draft(inputs: S, ctx: &DeriveContext<'_>) -> Self {
        let derived = derive_all(&inputs, ctx);
        Record {
            inputs,
            derived,
            ..Record::default()
        }
    }

    pub fn kind(&self) -> RecordKind {
        S::KIND
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Whether the stored derived fields agree with a fresh derivation.
    pub fn derived_is_current(&self, ctx: &DeriveContext<'_>) -> bool {
        derive_all(&self.inputs, ctx) == self.derived
    }

    fn created_at_parsed(&self) -> Option<OffsetDateTime> {
        self.created_at
            .as_deref()
            .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
    }
}

impl<S: RecordSchema> Filterable for Record<S> {
    fn record_date(&self) -> Option<Date> {
        self.inputs.date()
    }

    fn search_fields(&self) -> Vec<&str> {
        self.inputs.search_fields()
    }

    fn facet_value(&self) -> Option<&str> {
        self.inputs.facet(&self.derived)
    }
}

impl<S: RecordSchema> Summarize for Record<S> {
    type Totals = S::Totals;

    fn accumulate(&self, totals: &mut Self::Totals) {
        self.inputs.accumulate(&self.derived, totals);
    }
}

/// Sort newest first: by date descending, ties broken by creation time
/// descending. Records without a date sort last. The sort is stable.
pub fn sort_newest_first<S: RecordSchema>(records: &mut [Record<S>]) {
    records.sort_by(|a, b| match (a.inputs.date(), b.inputs.date()) {
        (Some(da), Some(db)) => db
            .cmp(&da)
            .then_with(|| b.created_at_parsed().cmp(&a.created_at_parsed())),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.created_at_parsed().cmp(&a.created_at_parsed()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::FeedStock;
    use time::macros::date;

    fn feed(day: Date, created_at: &str) -> Record<FeedStock> {
        let inputs = FeedStock {
            date: Some(day),
            feed_type: "maize".into(),
            ..FeedStock::default()
        };
        Record {
            id: Some(created_at.to_string()),
            created_at: Some(created_at.to_string()),
            ..Record::draft(inputs, &DeriveContext::empty())
        }
    }

    #[test]
    fn kind_parses_from_endpoint_and_snake_case() {
        assert_eq!("milk-yield".parse::<RecordKind>().unwrap(), RecordKind::MilkYield);
        assert_eq!("feed_stock".parse::<RecordKind>().unwrap(), RecordKind::FeedStock);
        assert!("cows".parse::<RecordKind>().is_err());
    }

    #[test]
    fn kind_serializes_as_endpoint() {
        for kind in RecordKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, serde_json::Value::String(kind.endpoint().to_string()));
        }
    }

    #[test]
    fn newest_first_breaks_ties_by_creation_time() {
        let mut records = vec![
            feed(date!(2024 - 01 - 02), "2024-01-02T08:00:00Z"),
            feed(date!(2024 - 01 - 05), "2024-01-05T08:00:00Z"),
            feed(date!(2024 - 01 - 05), "2024-01-05T09:30:00Z"),
            feed(date!(2024 - 01 - 03), "2024-01-03T08:00:00Z"),
        ];
        sort_newest_first(&mut records);
        let ids: Vec<&str> = records.iter().filter_map(|r| r.id.as_deref()).collect();
        assert_eq!(
            ids,
            vec![
                "2024-01-05T09:30:00Z",
                "2024-01-05T08:00:00Z",
                "2024-01-03T08:00:00Z",
                "2024-01-02T08:00:00Z"
            ]
        );
    }

    #[test]
    fn unsaved_record_omits_store_fields() {
        let record = Record::draft(FeedStock::default(), &DeriveContext::empty());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("created_at").is_none());
        assert!(json.get("total_cost").is_some());
    }
}
