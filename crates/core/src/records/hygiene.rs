use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, Time};

use super::{choice, date, filled, flag, text, time_of_day, unknown_field};
use crate::error::FieldAccessError;
use crate::metrics;
use crate::record::{DeriveContext, FieldValue, RecordKind, RecordSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    Morning,
    Evening,
}

impl Shift {
    pub fn label(&self) -> &'static str {
        match self {
            Shift::Morning => "Morning",
            Shift::Evening => "Evening",
        }
    }

    fn parse(label: &str) -> Option<Self> {
        [Shift::Morning, Shift::Evening]
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A milking-parlour hygiene checklist for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilkingHygiene {
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default, with = "super::hour_minute::option")]
    pub time: Option<Time>,
    #[serde(default)]
    pub shift: Option<Shift>,
    #[serde(default)]
    pub udder_cleaned: bool,
    #[serde(default)]
    pub teats_dipped: bool,
    #[serde(default)]
    pub equipment_sanitized: bool,
    #[serde(default)]
    pub handler: String,
    #[serde(default)]
    pub remarks: String,
}

impl MilkingHygiene {
    fn checks(&self) -> [bool; 3] {
        [self.udder_cleaned, self.teats_dipped, self.equipment_sanitized]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HygieneDerived {
    #[serde(default)]
    pub checks_passed: u32,
    #[serde(default)]
    pub compliant: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HygieneTotals {
    pub records: usize,
    pub compliant: usize,
    pub checks_passed: u64,
}

const CHECK_DEPENDENTS: &[&str] = &["checks_passed", "compliant"];

impl RecordSchema for MilkingHygiene {
    type Derived = HygieneDerived;
    type Totals = HygieneTotals;

    const KIND: RecordKind = RecordKind::MilkingHygiene;
    const REQUIRED: &'static [&'static str] = &["date", "time", "shift", "handler"];
    const DERIVED: &'static [&'static str] = &["checks_passed", "compliant"];
    const DEPENDENCIES: &'static [(&'static str, &'static [&'static str])] = &[
        ("udder_cleaned", CHECK_DEPENDENTS),
        ("teats_dipped", CHECK_DEPENDENTS),
        ("equipment_sanitized", CHECK_DEPENDENTS),
    ];

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldAccessError> {
        match name {
            "date" => self.date = date(name, value)?,
            "time" => self.time = time_of_day(name, value)?,
            "shift" => self.shift = choice(name, value, Shift::parse)?,
            "udder_cleaned" => self.udder_cleaned = flag(name, value)?,
            "teats_dipped" => self.teats_dipped = flag(name, value)?,
            "equipment_sanitized" => self.equipment_sanitized = flag(name, value)?,
            "handler" => self.handler = text(name, value)?,
            "remarks" => self.remarks = text(name, value)?,
            _ => return Err(unknown_field(Self::KIND, name)),
        }
        Ok(())
    }

    fn has_value(&self, name: &str) -> bool {
        match name {
            "date" => self.date.is_some(),
            "time" => self.time.is_some(),
            "shift" => self.shift.is_some(),
            "udder_cleaned" | "teats_dipped" | "equipment_sanitized" => true,
            "handler" => filled(&self.handler),
            "remarks" => filled(&self.remarks),
            _ => false,
        }
    }

    fn derive(&self, field: &str, derived: &mut HygieneDerived, _ctx: &DeriveContext<'_>) {
        let (passed, compliant) = metrics::hygiene_checks(&self.checks());
        match field {
            "checks_passed" => derived.checks_passed = passed,
            "compliant" => derived.compliant = compliant,
            _ => {}
        }
    }

    fn date(&self) -> Option<Date> {
        self.date
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.handler.as_str(), self.remarks.as_str()]
    }

    fn facet<'a>(&'a self, _derived: &'a HygieneDerived) -> Option<&'a str> {
        self.shift.map(|s| s.label())
    }

    fn accumulate(&self, derived: &HygieneDerived, totals: &mut HygieneTotals) {
        totals.records += 1;
        totals.checks_passed += u64::from(derived.checks_passed);
        if derived.compliant {
            totals.compliant += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::derive_all;
    use time::macros::time;

    #[test]
    fn all_checks_make_a_compliant_session() {
        let mut inputs = MilkingHygiene::default();
        for field in ["udder_cleaned", "teats_dipped", "equipment_sanitized"] {
            inputs.set_field(field, true.into()).unwrap();
        }
        let derived = derive_all(&inputs, &DeriveContext::empty());
        assert_eq!(derived.checks_passed, 3);
        assert!(derived.compliant);
    }

    #[test]
    fn time_uses_hour_minute_wire_format() {
        let inputs = MilkingHygiene {
            time: Some(time!(5:45)),
            shift: Some(Shift::Morning),
            ..MilkingHygiene::default()
        };
        let json = serde_json::to_value(&inputs).unwrap();
        assert_eq!(json["time"], "05:45");
        assert_eq!(json["shift"], "Morning");
        let back: MilkingHygiene = serde_json::from_value(json).unwrap();
        assert_eq!(back.time, Some(time!(5:45)));
    }

    #[test]
    fn time_parses_from_text() {
        let mut inputs = MilkingHygiene::default();
        inputs.set_field("time", "17:05".into()).unwrap();
        assert_eq!(inputs.time, Some(time!(17:05)));
        assert!(matches!(
            inputs.set_field("time", "5pm".into()),
            Err(FieldAccessError::InvalidValue { .. })
        ));
    }
}
