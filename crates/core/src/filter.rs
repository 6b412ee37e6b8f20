//! Client-side filtering and aggregation of fetched records.
//!
//! [`filter`] keeps a record iff it matches the free text AND the date range
//! AND the facet. It never re-sorts: the output is a subsequence of the input
//! in the input's order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;

/// Facet value that disables the facet constraint.
pub const ALL_FACETS: &str = "All";

/// Ephemeral list filter for one screen session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub free_text: String,
    #[serde(default)]
    pub date_from: Option<Date>,
    #[serde(default)]
    pub date_to: Option<Date>,
    #[serde(default)]
    pub facet: Option<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = text.into();
        self
    }

    pub fn from_date(mut self, date: Date) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn to_date(mut self, date: Date) -> Self {
        self.date_to = Some(date);
        self
    }

    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facet = Some(facet.into());
        self
    }

    /// The facet value to match, or `None` when the facet is unset, empty
    /// or the `"All"` sentinel.
    pub fn active_facet(&self) -> Option<&str> {
        self.facet
            .as_deref()
            .filter(|f| !f.is_empty() && *f != ALL_FACETS)
    }

    /// Whether these criteria let every record through.
    pub fn is_empty(&self) -> bool {
        self.free_text.trim().is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.active_facet().is_none()
    }
}

/// A record the filter engine can match.
pub trait Filterable {
    fn record_date(&self) -> Option<Date>;
    fn search_fields(&self) -> Vec<&str>;
    fn facet_value(&self) -> Option<&str>;
}

/// A record the summary engine can fold into totals.
pub trait Summarize {
    type Totals: Default;

    fn accumulate(&self, totals: &mut Self::Totals);
}

fn matches_text<T: Filterable + ?Sized>(record: &T, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return true;
    }
    let needle = needle.to_lowercase();
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn matches_dates<T: Filterable + ?Sized>(record: &T, criteria: &FilterCriteria) -> bool {
    if criteria.date_from.is_none() && criteria.date_to.is_none() {
        return true;
    }
    let Some(date) = record.record_date() else {
        return false;
    };
    criteria.date_from.map_or(true, |from| date >= from)
        && criteria.date_to.map_or(true, |to| date <= to)
}

fn matches_facet<T: Filterable + ?Sized>(record: &T, criteria: &FilterCriteria) -> bool {
    match criteria.active_facet() {
        None => true,
        Some(wanted) => record.facet_value() == Some(wanted),
    }
}

/// Whether a single record passes all three constraints.
pub fn matches<T: Filterable + ?Sized>(record: &T, criteria: &FilterCriteria) -> bool {
    matches_text(record, &criteria.free_text)
        && matches_dates(record, criteria)
        && matches_facet(record, criteria)
}

/// The records passing `criteria`, in their original order.
pub fn filter<'a, T: Filterable>(records: &'a [T], criteria: &FilterCriteria) -> Vec<&'a T> {
    records.iter().filter(|r| matches(*r, criteria)).collect()
}

/// Fold records into totals in a single pass.
pub fn summarize<'a, T, I>(records: I) -> T::Totals
where
    T: Summarize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut totals = T::Totals::default();
    for record in records {
        record.accumulate(&mut totals);
    }
    totals
}

/// A calendar month used to bucket monthly summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u8,
}

impl MonthKey {
    pub fn of(date: Date) -> Self {
        MonthKey {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Totals per calendar month, oldest month first. Undated records are skipped.
pub fn summarize_by_month<'a, T, I>(records: I) -> BTreeMap<MonthKey, T::Totals>
where
    T: Summarize + Filterable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut months: BTreeMap<MonthKey, T::Totals> = BTreeMap::new();
    for record in records {
        if let Some(date) = record.record_date() {
            record.accumulate(months.entry(MonthKey::of(date)).or_default());
        }
    }
    months
}
