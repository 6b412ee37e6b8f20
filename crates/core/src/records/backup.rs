use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use super::{choice, date, filled, numeric, text, unknown_field};
use crate::error::FieldAccessError;
use crate::numeric::{add_saturating, NumericInput};
use crate::record::{DeriveContext, FieldValue, RecordKind, RecordSchema};

/// Derived fields of a kind that has none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoDerived {}

/// A log entry for an exported backup of another record kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordBackup {
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default)]
    pub record_kind: Option<RecordKind>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub record_count: NumericInput,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackupTotals {
    pub backups: usize,
    pub records: Decimal,
}

impl RecordSchema for RecordBackup {
    type Derived = NoDerived;
    type Totals = BackupTotals;

    const KIND: RecordKind = RecordKind::RecordBackup;
    const REQUIRED: &'static [&'static str] = &["date", "record_kind", "file_name"];
    const DERIVED: &'static [&'static str] = &[];
    const DEPENDENCIES: &'static [(&'static str, &'static [&'static str])] = &[];

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldAccessError> {
        match name {
            "date" => self.date = date(name, value)?,
            "record_kind" => {
                self.record_kind = choice(name, value, |s| s.parse::<RecordKind>().ok())?
            }
            "file_name" => self.file_name = text(name, value)?,
            "record_count" => self.record_count = numeric(name, value)?,
            "remarks" => self.remarks = text(name, value)?,
            _ => return Err(unknown_field(Self::KIND, name)),
        }
        Ok(())
    }

    fn has_value(&self, name: &str) -> bool {
        match name {
            "date" => self.date.is_some(),
            "record_kind" => self.record_kind.is_some(),
            "file_name" => filled(&self.file_name),
            "record_count" => !self.record_count.is_blank(),
            "remarks" => filled(&self.remarks),
            _ => false,
        }
    }

    fn derive(&self, _field: &str, _derived: &mut NoDerived, _ctx: &DeriveContext<'_>) {}

    fn date(&self) -> Option<Date> {
        self.date
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.file_name.as_str(), self.remarks.as_str()]
    }

    fn facet<'a>(&'a self, _derived: &'a NoDerived) -> Option<&'a str> {
        self.record_kind.map(|k| k.endpoint())
    }

    fn accumulate(&self, _derived: &NoDerived, totals: &mut BackupTotals) {
        totals.backups += 1;
        totals.records = add_saturating(totals.records, self.record_count.or_zero());
    }
}
