use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, Time};

use super::{choice, date, filled, text, time_of_day, unknown_field};
use crate::error::{FieldAccessError, ValidationError};
use crate::metrics;
use crate::numeric::add_saturating;
use crate::record::{DeriveContext, FieldValue, RecordKind, RecordSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveType {
    Present,
    Sick,
    Casual,
    Annual,
    Unpaid,
}

impl LeaveType {
    pub const ALL: [LeaveType; 5] = [
        LeaveType::Present,
        LeaveType::Sick,
        LeaveType::Casual,
        LeaveType::Annual,
        LeaveType::Unpaid,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LeaveType::Present => "Present",
            LeaveType::Sick => "Sick",
            LeaveType::Casual => "Casual",
            LeaveType::Annual => "Annual",
            LeaveType::Unpaid => "Unpaid",
        }
    }

    fn parse(label: &str) -> Option<Self> {
        LeaveType::ALL
            .into_iter()
            .find(|l| l.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One employee's attendance for a day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default)]
    pub employee_id: String,
    #[serde(default, with = "super::hour_minute::option")]
    pub check_in: Option<Time>,
    #[serde(default, with = "super::hour_minute::option")]
    pub check_out: Option<Time>,
    #[serde(default)]
    pub leave_type: Option<LeaveType>,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceDerived {
    #[serde(default)]
    pub hours_worked: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttendanceTotals {
    pub records: usize,
    pub hours_worked: Decimal,
    pub present: usize,
    pub on_leave: usize,
}

impl RecordSchema for Attendance {
    type Derived = AttendanceDerived;
    type Totals = AttendanceTotals;

    const KIND: RecordKind = RecordKind::Attendance;
    const REQUIRED: &'static [&'static str] = &["date", "employee_id", "leave_type"];
    const DERIVED: &'static [&'static str] = &["hours_worked"];
    const DEPENDENCIES: &'static [(&'static str, &'static [&'static str])] = &[
        ("check_in", &["hours_worked"]),
        ("check_out", &["hours_worked"]),
    ];

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldAccessError> {
        match name {
            "date" => self.date = date(name, value)?,
            "employee_id" => self.employee_id = text(name, value)?,
            "check_in" => self.check_in = time_of_day(name, value)?,
            "check_out" => self.check_out = time_of_day(name, value)?,
            "leave_type" => self.leave_type = choice(name, value, LeaveType::parse)?,
            "remarks" => self.remarks = text(name, value)?,
            _ => return Err(unknown_field(Self::KIND, name)),
        }
        Ok(())
    }

    fn has_value(&self, name: &str) -> bool {
        match name {
            "date" => self.date.is_some(),
            "employee_id" => filled(&self.employee_id),
            "check_in" => self.check_in.is_some(),
            "check_out" => self.check_out.is_some(),
            "leave_type" => self.leave_type.is_some(),
            "remarks" => filled(&self.remarks),
            _ => false,
        }
    }

    fn derive(&self, field: &str, derived: &mut AttendanceDerived, _ctx: &DeriveContext<'_>) {
        if field == "hours_worked" {
            derived.hours_worked = metrics::hours_worked(self.check_in, self.check_out);
        }
    }

    fn date(&self) -> Option<Date> {
        self.date
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.employee_id.as_str(), self.remarks.as_str()]
    }

    fn facet<'a>(&'a self, _derived: &'a AttendanceDerived) -> Option<&'a str> {
        self.leave_type.map(|l| l.label())
    }

    fn accumulate(&self, derived: &AttendanceDerived, totals: &mut AttendanceTotals) {
        totals.records += 1;
        totals.hours_worked = add_saturating(totals.hours_worked, derived.hours_worked);
        match self.leave_type {
            Some(LeaveType::Present) => totals.present += 1,
            Some(_) => totals.on_leave += 1,
            None => {}
        }
    }

    fn cross_check(&self) -> Result<(), ValidationError> {
        if let (Some(start), Some(end)) = (self.check_in, self.check_out) {
            if end <= start {
                return Err(ValidationError::Invalid {
                    field: "check_out".to_string(),
                    message: "Check-out must be after check-in".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::derive_all;
    use time::macros::time;

    #[test]
    fn hours_follow_check_times() {
        let inputs = Attendance {
            check_in: Some(time!(7:30)),
            check_out: Some(time!(16:00)),
            leave_type: Some(LeaveType::Present),
            ..Attendance::default()
        };
        let derived = derive_all(&inputs, &DeriveContext::empty());
        assert_eq!(derived.hours_worked, Decimal::new(85, 1));
    }

    #[test]
    fn check_out_before_check_in_fails_cross_check() {
        let inputs = Attendance {
            check_in: Some(time!(16:00)),
            check_out: Some(time!(7:30)),
            ..Attendance::default()
        };
        let err = inputs.cross_check().unwrap_err();
        assert_eq!(err.field(), Some("check_out"));
    }

    #[test]
    fn leave_days_are_counted_separately() {
        let mut totals = AttendanceTotals::default();
        for leave in [LeaveType::Present, LeaveType::Sick, LeaveType::Annual] {
            let inputs = Attendance {
                leave_type: Some(leave),
                ..Attendance::default()
            };
            inputs.accumulate(&AttendanceDerived::default(), &mut totals);
        }
        assert_eq!(totals.present, 1);
        assert_eq!(totals.on_leave, 2);
    }
}
