use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use super::{date, filled, numeric, text, unknown_field};
use crate::error::FieldAccessError;
use crate::metrics;
use crate::numeric::{add_saturating, NumericInput};
use crate::record::{DeriveContext, FieldValue, RecordKind, RecordSchema};

/// A feed delivery or stock count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedStock {
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default)]
    pub feed_type: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub quantity: NumericInput,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub cost_per_unit: NumericInput,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedStockDerived {
    #[serde(default)]
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedStockTotals {
    pub records: usize,
    pub quantity: Decimal,
    pub total_cost: Decimal,
}

impl RecordSchema for FeedStock {
    type Derived = FeedStockDerived;
    type Totals = FeedStockTotals;

    const KIND: RecordKind = RecordKind::FeedStock;
    const REQUIRED: &'static [&'static str] = &["date", "feed_type", "quantity", "cost_per_unit"];
    const DERIVED: &'static [&'static str] = &["total_cost"];
    const DEPENDENCIES: &'static [(&'static str, &'static [&'static str])] = &[
        ("quantity", &["total_cost"]),
        ("cost_per_unit", &["total_cost"]),
    ];

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldAccessError> {
        match name {
            "date" => self.date = date(name, value)?,
            "feed_type" => self.feed_type = text(name, value)?,
            "supplier" => self.supplier = text(name, value)?,
            "quantity" => self.quantity = numeric(name, value)?,
            "unit" => self.unit = text(name, value)?,
            "cost_per_unit" => self.cost_per_unit = numeric(name, value)?,
            "remarks" => self.remarks = text(name, value)?,
            _ => return Err(unknown_field(Self::KIND, name)),
        }
        Ok(())
    }

    fn has_value(&self, name: &str) -> bool {
        match name {
            "date" => self.date.is_some(),
            "feed_type" => filled(&self.feed_type),
            "supplier" => filled(&self.supplier),
            "quantity" => !self.quantity.is_blank(),
            "unit" => filled(&self.unit),
            "cost_per_unit" => !self.cost_per_unit.is_blank(),
            "remarks" => filled(&self.remarks),
            _ => false,
        }
    }

    fn derive(&self, field: &str, derived: &mut FeedStockDerived, _ctx: &DeriveContext<'_>) {
        if field == "total_cost" {
            derived.total_cost =
                metrics::total_cost(self.cost_per_unit.as_str(), self.quantity.as_str());
        }
    }

    fn date(&self) -> Option<Date> {
        self.date
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.feed_type.as_str(),
            self.supplier.as_str(),
            self.remarks.as_str(),
        ]
    }

    fn facet<'a>(&'a self, _derived: &'a FeedStockDerived) -> Option<&'a str> {
        Some(self.feed_type.as_str()).filter(|f| !f.is_empty())
    }

    fn accumulate(&self, derived: &FeedStockDerived, totals: &mut FeedStockTotals) {
        totals.records += 1;
        totals.quantity = add_saturating(totals.quantity, self.quantity.or_zero());
        totals.total_cost = add_saturating(totals.total_cost, derived.total_cost);
    }
}
