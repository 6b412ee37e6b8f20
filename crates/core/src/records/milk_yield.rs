use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use super::{date, filled, numeric, selection, text, unknown_field};
use crate::error::FieldAccessError;
use crate::metrics::{self, Performance};
use crate::numeric::{add_saturating, NumericInput};
use crate::record::{DeriveContext, FieldValue, RecordKind, RecordSchema};

/// A day's milking for a group of animals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilkYield {
    #[serde(default)]
    pub date: Option<Date>,
    /// Animals milked, resolved against the animal catalog for targets.
    #[serde(default)]
    pub animal_ids: Vec<String>,
    #[serde(default)]
    pub morning_yield: NumericInput,
    #[serde(default)]
    pub evening_yield: NumericInput,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MilkYieldDerived {
    #[serde(default)]
    pub total_yield: Decimal,
    #[serde(default)]
    pub targeted_yield: Decimal,
    #[serde(default)]
    pub performance: Option<Performance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MilkYieldTotals {
    pub records: usize,
    pub total_yield: Decimal,
    pub targeted_yield: Decimal,
    pub high: usize,
    pub on_target: usize,
    pub low: usize,
}

impl RecordSchema for MilkYield {
    type Derived = MilkYieldDerived;
    type Totals = MilkYieldTotals;

    const KIND: RecordKind = RecordKind::MilkYield;
    const REQUIRED: &'static [&'static str] =
        &["date", "animal_ids", "morning_yield", "evening_yield"];
    const DERIVED: &'static [&'static str] = &["total_yield", "targeted_yield", "performance"];
    const DEPENDENCIES: &'static [(&'static str, &'static [&'static str])] = &[
        ("morning_yield", &["total_yield", "performance"]),
        ("evening_yield", &["total_yield", "performance"]),
        ("animal_ids", &["targeted_yield", "performance"]),
    ];

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldAccessError> {
        match name {
            "date" => self.date = date(name, value)?,
            "animal_ids" => self.animal_ids = selection(name, value)?,
            "morning_yield" => self.morning_yield = numeric(name, value)?,
            "evening_yield" => self.evening_yield = numeric(name, value)?,
            "remarks" => self.remarks = text(name, value)?,
            _ => return Err(unknown_field(Self::KIND, name)),
        }
        Ok(())
    }

    fn has_value(&self, name: &str) -> bool {
        match name {
            "date" => self.date.is_some(),
            "animal_ids" => !self.animal_ids.is_empty(),
            "morning_yield" => !self.morning_yield.is_blank(),
            "evening_yield" => !self.evening_yield.is_blank(),
            "remarks" => filled(&self.remarks),
            _ => false,
        }
    }

    fn derive(&self, field: &str, derived: &mut MilkYieldDerived, ctx: &DeriveContext<'_>) {
        match field {
            "total_yield" => {
                derived.total_yield = metrics::total_yield(
                    self.morning_yield.as_str(),
                    self.evening_yield.as_str(),
                )
            }
            "targeted_yield" => {
                derived.targeted_yield = metrics::targeted_yield(&self.animal_ids, ctx.catalog)
            }
            "performance" => {
                derived.performance =
                    metrics::performance(derived.total_yield, Some(derived.targeted_yield))
            }
            _ => {}
        }
    }

    fn date(&self) -> Option<Date> {
        self.date
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.remarks.as_str()];
        fields.extend(self.animal_ids.iter().map(String::as_str));
        fields
    }

    fn facet<'a>(&'a self, derived: &'a MilkYieldDerived) -> Option<&'a str> {
        derived.performance.map(|p| p.label())
    }

    fn accumulate(&self, derived: &MilkYieldDerived, totals: &mut MilkYieldTotals) {
        totals.records += 1;
        totals.total_yield = add_saturating(totals.total_yield, derived.total_yield);
        totals.targeted_yield = add_saturating(totals.targeted_yield, derived.targeted_yield);
        match derived.performance {
            Some(Performance::High) => totals.high += 1,
            Some(Performance::OnTarget) => totals.on_target += 1,
            Some(Performance::Low) => totals.low += 1,
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{derive_all, Entity, Record};

    fn catalog() -> Vec<Entity> {
        vec![
            Entity {
                id: "cow-1".into(),
                name: "Daisy".into(),
                target_metric: Some(Decimal::from(10)),
            },
            Entity {
                id: "cow-2".into(),
                name: "Bella".into(),
                target_metric: Some(Decimal::from(9)),
            },
        ]
    }

    #[test]
    fn scenario_twenty_litres_against_nineteen_is_high() {
        let inputs = MilkYield {
            animal_ids: vec!["cow-1".into(), "cow-2".into()],
            morning_yield: "12".into(),
            evening_yield: "8".into(),
            ..MilkYield::default()
        };
        let catalog = catalog();
        let derived = derive_all(&inputs, &DeriveContext::new(&catalog));
        assert_eq!(derived.total_yield, Decimal::from(20));
        assert_eq!(derived.targeted_yield, Decimal::from(19));
        assert_eq!(derived.performance, Some(Performance::High));
    }

    #[test]
    fn no_animals_leaves_performance_unset() {
        let inputs = MilkYield {
            morning_yield: "5".into(),
            ..MilkYield::default()
        };
        let derived = derive_all(&inputs, &DeriveContext::empty());
        assert_eq!(derived.total_yield, Decimal::from(5));
        assert_eq!(derived.performance, None);
    }

    #[test]
    fn set_field_rejects_wrong_types_and_unknown_names() {
        let mut inputs = MilkYield::default();
        assert!(matches!(
            inputs.set_field("animal_ids", FieldValue::Text("cow-1".into())),
            Err(FieldAccessError::WrongType { .. })
        ));
        assert!(matches!(
            inputs.set_field("total_yield", FieldValue::Text("3".into())),
            Err(FieldAccessError::UnknownField { .. })
        ));
        inputs.set_field("date", "2024-03-01".into()).unwrap();
        assert_eq!(inputs.date, Some(time::macros::date!(2024 - 03 - 01)));
    }

    #[test]
    fn wire_format_round_trips_backend_numbers() {
        let json = serde_json::json!({
            "id": "42",
            "owner_ref": "7",
            "date": "2024-01-10",
            "animal_ids": ["cow-1"],
            "morning_yield": 6.5,
            "evening_yield": "4",
            "remarks": "",
            "total_yield": "10.5",
            "targeted_yield": "10",
            "performance": "On Target",
            "created_at": "2024-01-10T06:00:00Z"
        });
        let record: Record<MilkYield> = serde_json::from_value(json).unwrap();
        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.inputs.morning_yield.value(), Some(Decimal::new(65, 1)));
        assert_eq!(record.derived.performance, Some(Performance::OnTarget));
        assert_eq!(record.derived.total_yield, Decimal::new(105, 1));
    }
}
