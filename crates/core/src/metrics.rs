//! Derived-field computation.
//!
//! Every function here is pure: same inputs, same output, no I/O. Inputs
//! that are blank or non-numeric count as zero so a half-typed draft never
//! fails to derive.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Time;

use crate::numeric::{add_saturating, or_zero, round_money};
use crate::record::Entity;

/// Dead-band around the target inside which a yield counts as on target.
///
/// The literal 0.1 is applied regardless of the metric's unit.
pub const PERFORMANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 1);

/// Yield performance against the herd's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Performance {
    High,
    #[serde(rename = "On Target")]
    OnTarget,
    Low,
}

impl Performance {
    pub fn label(&self) -> &'static str {
        match self {
            Performance::High => "High",
            Performance::OnTarget => "On Target",
            Performance::Low => "Low",
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Morning plus evening yield.
pub fn total_yield(morning: &str, evening: &str) -> Decimal {
    add_saturating(or_zero(morning), or_zero(evening))
}

/// Sum of the target yields of the selected animals.
///
/// Ids missing from the catalog, and catalog entries without a target,
/// contribute nothing.
pub fn targeted_yield(selected: &[String], catalog: &[Entity]) -> Decimal {
    selected
        .iter()
        .filter_map(|id| catalog.iter().find(|e| &e.id == id))
        .filter_map(|e| e.target_metric)
        .fold(Decimal::ZERO, add_saturating)
}

/// Classify `actual` against `target` with a symmetric dead-band of
/// [`PERFORMANCE_TOLERANCE`]. A zero or absent target leaves the
/// classification unset.
pub fn performance(actual: Decimal, target: Option<Decimal>) -> Option<Performance> {
    let target = target.filter(|t| !t.is_zero())?;
    let Some(delta) = actual.checked_sub(target) else {
        // Out of range: the gap dwarfs the tolerance.
        return Some(if actual > target {
            Performance::High
        } else {
            Performance::Low
        });
    };
    Some(if delta > PERFORMANCE_TOLERANCE {
        Performance::High
    } else if delta < -PERFORMANCE_TOLERANCE {
        Performance::Low
    } else {
        Performance::OnTarget
    })
}

/// Rate times quantity, or zero if either operand is not a number.
pub fn total_cost(rate_per_unit: &str, quantity: &str) -> Decimal {
    match (
        crate::numeric::parse_lenient(rate_per_unit),
        crate::numeric::parse_lenient(quantity),
    ) {
        (Some(rate), Some(qty)) => rate.checked_mul(qty).map(round_money).unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}

/// Hours between check-in and check-out, to two decimal places.
///
/// Zero when either time is missing or check-out is not after check-in.
pub fn hours_worked(check_in: Option<Time>, check_out: Option<Time>) -> Decimal {
    let (Some(start), Some(end)) = (check_in, check_out) else {
        return Decimal::ZERO;
    };
    if end <= start {
        return Decimal::ZERO;
    }
    let minutes = (end - start).whole_minutes();
    round_money(Decimal::from(minutes) / Decimal::from(60))
}

/// Number of hygiene checks passed and whether all of them passed.
pub fn hygiene_checks(checks: &[bool]) -> (u32, bool) {
    let passed = checks.iter().filter(|c| **c).count() as u32;
    (passed, !checks.is_empty() && passed as usize == checks.len())
}
