use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use super::{choice, date, filled, numeric, text, unknown_field};
use crate::error::FieldAccessError;
use crate::metrics;
use crate::numeric::{add_saturating, NumericInput};
use crate::record::{DeriveContext, FieldValue, RecordKind, RecordSchema};

/// Approval state of a purchase request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "Pending",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }

    fn parse(label: &str) -> Option<Self> {
        [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Rejected,
        ]
        .into_iter()
        .find(|s| s.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A purchase order awaiting or past approval.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub date: Option<Date>,
    #[serde(default)]
    pub po_number: String,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub quantity: NumericInput,
    #[serde(default)]
    pub cost_per_unit: NumericInput,
    #[serde(default)]
    pub status: ApprovalStatus,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDerived {
    #[serde(default)]
    pub total_cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PurchaseTotals {
    pub records: usize,
    pub total_cost: Decimal,
    pub approved_cost: Decimal,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl RecordSchema for PurchaseRequest {
    type Derived = PurchaseDerived;
    type Totals = PurchaseTotals;

    const KIND: RecordKind = RecordKind::PurchaseRequest;
    const REQUIRED: &'static [&'static str] =
        &["date", "po_number", "item", "quantity", "cost_per_unit"];
    const DERIVED: &'static [&'static str] = &["total_cost"];
    const DEPENDENCIES: &'static [(&'static str, &'static [&'static str])] = &[
        ("quantity", &["total_cost"]),
        ("cost_per_unit", &["total_cost"]),
    ];

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldAccessError> {
        match name {
            "date" => self.date = date(name, value)?,
            "po_number" => self.po_number = text(name, value)?,
            "item" => self.item = text(name, value)?,
            "vendor" => self.vendor = text(name, value)?,
            "quantity" => self.quantity = numeric(name, value)?,
            "cost_per_unit" => self.cost_per_unit = numeric(name, value)?,
            "status" => {
                self.status = choice(name, value, ApprovalStatus::parse)?.unwrap_or_default()
            }
            "remarks" => self.remarks = text(name, value)?,
            _ => return Err(unknown_field(Self::KIND, name)),
        }
        Ok(())
    }

    fn has_value(&self, name: &str) -> bool {
        match name {
            "date" => self.date.is_some(),
            "po_number" => filled(&self.po_number),
            "item" => filled(&self.item),
            "vendor" => filled(&self.vendor),
            "quantity" => !self.quantity.is_blank(),
            "cost_per_unit" => !self.cost_per_unit.is_blank(),
            "status" => true,
            "remarks" => filled(&self.remarks),
            _ => false,
        }
    }

    fn derive(&self, field: &str, derived: &mut PurchaseDerived, _ctx: &DeriveContext<'_>) {
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
            self.po_number.as_str(),
            self.item.as_str(),
            self.vendor.as_str(),
            self.remarks.as_str(),
        ]
    }

    fn facet<'a>(&'a self, _derived: &'a PurchaseDerived) -> Option<&'a str> {
        Some(self.status.label())
    }

    fn accumulate(&self, derived: &PurchaseDerived, totals: &mut PurchaseTotals) {
        totals.records += 1;
        totals.total_cost = add_saturating(totals.total_cost, derived.total_cost);
        match self.status {
            ApprovalStatus::Pending => totals.pending += 1,
            ApprovalStatus::Approved => {
                totals.approved += 1;
                totals.approved_cost = add_saturating(totals.approved_cost, derived.total_cost);
            }
            ApprovalStatus::Rejected => totals.rejected += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{filter, summarize, FilterCriteria};
    use crate::record::{DeriveContext, Record};

    fn request(po: &str, status: ApprovalStatus, qty: &str, rate: &str) -> Record<PurchaseRequest> {
        Record::draft(
            PurchaseRequest {
                date: Some(time::macros::date!(2024 - 02 - 10)),
                po_number: po.into(),
                item: "Teat dip".into(),
                quantity: qty.into(),
                cost_per_unit: rate.into(),
                status,
                ..PurchaseRequest::default()
            },
            &DeriveContext::empty(),
        )
    }

    #[test]
    fn status_parses_labels_case_insensitively() {
        let mut inputs = PurchaseRequest::default();
        inputs.set_field("status", "approved".into()).unwrap();
        assert_eq!(inputs.status, ApprovalStatus::Approved);
        assert!(inputs.set_field("status", "maybe".into()).is_err());
    }

    #[test]
    fn facet_filters_by_status_and_totals_split_costs() {
        let records = vec![
            request("PO-1", ApprovalStatus::Approved, "2", "50"),
            request("PO-2", ApprovalStatus::Pending, "1", "30"),
            request("PO-3", ApprovalStatus::Approved, "x", "30"),
        ];
        let approved = filter(&records, &FilterCriteria::new().with_facet("Approved"));
        assert_eq!(approved.len(), 2);

        let totals = summarize(&records);
        assert_eq!(totals.records, 3);
        assert_eq!(totals.total_cost, Decimal::from(130));
        assert_eq!(totals.approved_cost, Decimal::from(100));
        assert_eq!(totals.approved, 2);
        assert_eq!(totals.pending, 1);
    }

    #[test]
    fn po_number_is_searchable() {
        let records = vec![
            request("PO-17", ApprovalStatus::Pending, "1", "1"),
            request("PO-18", ApprovalStatus::Pending, "1", "1"),
        ];
        let hits = filter(&records, &FilterCriteria::new().with_text("po-18"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].inputs.po_number, "PO-18");
    }
}
