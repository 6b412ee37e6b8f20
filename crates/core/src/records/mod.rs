//! Concrete record kinds.
//!
//! Each module defines a kind's input struct, its derived struct and its
//! totals, and implements [`RecordSchema`](crate::record::RecordSchema) with
//! the kind's dependency table.

mod attendance;
mod backup;
mod feed_stock;
mod hygiene;
mod milk_yield;
mod purchase;

pub use attendance::{Attendance, AttendanceDerived, AttendanceTotals, LeaveType};
pub use backup::{BackupTotals, NoDerived, RecordBackup};
pub use feed_stock::{FeedStock, FeedStockDerived, FeedStockTotals};
pub use hygiene::{HygieneDerived, HygieneTotals, MilkingHygiene, Shift};
pub use milk_yield::{MilkYield, MilkYieldDerived, MilkYieldTotals};
pub use purchase::{ApprovalStatus, PurchaseDerived, PurchaseRequest, PurchaseTotals};

use time::{Date, Time};

use crate::error::FieldAccessError;
use crate::numeric::NumericInput;
use crate::record::{FieldValue, RecordKind};

// `[hour]:[minute]` wire format for times of day.
time::serde::format_description!(pub(crate) hour_minute, Time, "[hour]:[minute]");

fn wrong_type(field: &str, expected: &'static str, got: &FieldValue) -> FieldAccessError {
    FieldAccessError::WrongType {
        field: field.to_string(),
        expected,
        got: got.type_name(),
    }
}

fn unknown_field(kind: RecordKind, field: &str) -> FieldAccessError {
    FieldAccessError::UnknownField {
        kind,
        field: field.to_string(),
    }
}

fn text(field: &str, value: FieldValue) -> Result<String, FieldAccessError> {
    match value {
        FieldValue::Text(s) => Ok(s),
        FieldValue::Empty => Ok(String::new()),
        other => Err(wrong_type(field, "Text", &other)),
    }
}

fn numeric(field: &str, value: FieldValue) -> Result<NumericInput, FieldAccessError> {
    text(field, value).map(NumericInput::from)
}

fn date(field: &str, value: FieldValue) -> Result<Option<Date>, FieldAccessError> {
    match value {
        FieldValue::Date(d) => Ok(Some(d)),
        FieldValue::Empty => Ok(None),
        FieldValue::Text(s) if s.trim().is_empty() => Ok(None),
        FieldValue::Text(s) => {
            let format = time::macros::format_description!("[year]-[month]-[day]");
            Date::parse(s.trim(), &format)
                .map(Some)
                .map_err(|e| FieldAccessError::InvalidValue {
                    field: field.to_string(),
                    message: e.to_string(),
                })
        }
        other => Err(wrong_type(field, "Date", &other)),
    }
}

fn time_of_day(field: &str, value: FieldValue) -> Result<Option<Time>, FieldAccessError> {
    match value {
        FieldValue::Time(t) => Ok(Some(t)),
        FieldValue::Empty => Ok(None),
        FieldValue::Text(s) if s.trim().is_empty() => Ok(None),
        FieldValue::Text(s) => {
            let format = time::macros::format_description!("[hour]:[minute]");
            Time::parse(s.trim(), &format)
                .map(Some)
                .map_err(|e| FieldAccessError::InvalidValue {
                    field: field.to_string(),
                    message: e.to_string(),
                })
        }
        other => Err(wrong_type(field, "Time", &other)),
    }
}

fn flag(field: &str, value: FieldValue) -> Result<bool, FieldAccessError> {
    match value {
        FieldValue::Flag(b) => Ok(b),
        FieldValue::Empty => Ok(false),
        other => Err(wrong_type(field, "Flag", &other)),
    }
}

fn selection(field: &str, value: FieldValue) -> Result<Vec<String>, FieldAccessError> {
    match value {
        FieldValue::Selection(ids) => Ok(ids),
        FieldValue::Empty => Ok(Vec::new()),
        other => Err(wrong_type(field, "Selection", &other)),
    }
}

/// Parse a labelled choice (`"Approved"`, `"Sick"`, ...) from a text value.
fn choice<T>(
    field: &str,
    value: FieldValue,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, FieldAccessError> {
    let raw = text(field, value)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse(raw.trim())
        .map(Some)
        .ok_or_else(|| FieldAccessError::InvalidValue {
            field: field.to_string(),
            message: format!("'{}' is not a valid choice", raw),
        })
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}
