//! End-to-end scenarios over the public core API: derivation for a milk
//! yield draft, the password policy, and filtering a month of feed records.

use dairyops_core::filter::{filter, summarize, FilterCriteria};
use dairyops_core::metrics::{self, Performance};
use dairyops_core::records::{FeedStock, MilkYield};
use dairyops_core::{
    derive_all, validate_password, DeriveContext, Entity, Record, RecordSchema, RuleViolation,
};
use rust_decimal::Decimal;
use time::macros::date;
use time::{Date, Duration};

fn herd() -> Vec<Entity> {
    vec![
        Entity {
            id: "A-101".into(),
            name: "Clover".into(),
            target_metric: Some(Decimal::from(10)),
        },
        Entity {
            id: "A-102".into(),
            name: "Buttercup".into(),
            target_metric: Some(Decimal::from(9)),
        },
    ]
}

#[test]
fn yield_draft_derives_total_target_and_performance() {
    let catalog = herd();
    let ctx = DeriveContext::new(&catalog);
    let mut inputs = MilkYield::default();
    inputs.set_field("morning_yield", "12".into()).unwrap();
    inputs.set_field("evening_yield", "8".into()).unwrap();
    inputs
        .set_field("animal_ids", vec!["A-101", "A-102"].into())
        .unwrap();

    let derived = derive_all(&inputs, &ctx);
    assert_eq!(derived.total_yield, Decimal::from(20));
    assert_eq!(derived.targeted_yield, Decimal::from(19));
    assert_eq!(derived.performance, Some(Performance::High));

    // Derivation is idempotent.
    assert_eq!(derive_all(&inputs, &ctx), derived);
}

#[test]
fn password_scenarios() {
    assert_eq!(
        validate_password("abc12345"),
        vec![RuleViolation::MissingUppercase, RuleViolation::MissingSpecial]
    );
    assert!(validate_password("Abc123!@").is_empty());
}

#[test]
fn metric_properties() {
    assert_eq!(metrics::total_yield("abc", "5"), Decimal::from(5));
    assert_eq!(
        metrics::performance(Decimal::from(10), Some(Decimal::from(10))),
        Some(Performance::OnTarget)
    );
    assert_eq!(metrics::total_cost("2.5", "4"), Decimal::from(10));
    assert_eq!(metrics::total_cost("", "4"), Decimal::ZERO);
}

fn feed_record(day: Date, feed_type: &str, quantity: u32, rate: &str) -> Record<FeedStock> {
    Record::draft(
        FeedStock {
            date: Some(day),
            feed_type: feed_type.to_string(),
            supplier: "Valley Co-op".to_string(),
            quantity: quantity.to_string().into(),
            unit: "kg".to_string(),
            cost_per_unit: rate.into(),
            remarks: String::new(),
        },
        &DeriveContext::empty(),
    )
}

/// Fifty records from 2023-12-17 through 2024-02-04, alternating feeds.
fn fifty_feed_records() -> Vec<Record<FeedStock>> {
    let feeds = ["Maize silage", "Hay", "Dairy meal", "MAIZE germ", "Lucerne"];
    let start = date!(2023 - 12 - 17);
    (0..50)
        .map(|i| {
            let day = start + Duration::days(i);
            feed_record(day, feeds[i as usize % feeds.len()], 100 + i as u32, "0.5")
        })
        .collect()
}

#[test]
fn january_maize_records_and_their_totals() {
    let records = fifty_feed_records();
    let criteria = FilterCriteria::new()
        .with_text("maize")
        .from_date(date!(2024 - 01 - 01))
        .to_date(date!(2024 - 01 - 31));

    let january = filter(&records, &criteria);
    assert!(!january.is_empty());
    for record in &january {
        let day = record.inputs.date.unwrap();
        assert!(day >= date!(2024 - 01 - 01) && day <= date!(2024 - 01 - 31));
        assert!(record.inputs.feed_type.to_lowercase().contains("maize"));
    }

    // Independently count the expected subset.
    let expected: Vec<&Record<FeedStock>> = records
        .iter()
        .filter(|r| {
            let d = r.inputs.date.unwrap();
            d.year() == 2024
                && d.month() == time::Month::January
                && r.inputs.feed_type.to_lowercase().contains("maize")
        })
        .collect();
    assert_eq!(january.len(), expected.len());

    let totals = summarize(january.iter().copied());
    let expected_quantity: Decimal = expected.iter().map(|r| r.inputs.quantity.or_zero()).sum();
    assert_eq!(totals.records, expected.len());
    assert_eq!(totals.quantity, expected_quantity);
    assert_eq!(totals.total_cost, expected_quantity * Decimal::new(5, 1));
}

#[test]
fn empty_criteria_keeps_every_record_in_order() {
    let records = fifty_feed_records();
    let kept = filter(&records, &FilterCriteria::new());
    assert_eq!(kept.len(), records.len());
    assert!(kept.iter().zip(records.iter()).all(|(a, b)| std::ptr::eq(*a, b)));
}

#[test]
fn filtered_records_are_a_subset() {
    let records = fifty_feed_records();
    let criteria = FilterCriteria::new().with_text("hay");
    for kept in filter(&records, &criteria) {
        assert!(records.iter().any(|r| std::ptr::eq(r, kept)));
    }
}

#[test]
fn oversized_quantities_summarize_without_panicking() {
    let huge = |day: Date| {
        Record::draft(
            FeedStock {
                date: Some(day),
                feed_type: "Hay".to_string(),
                quantity: Decimal::MAX.to_string().into(),
                cost_per_unit: "1".into(),
                ..FeedStock::default()
            },
            &DeriveContext::empty(),
        )
    };
    let records = vec![huge(date!(2024 - 01 - 02)), huge(date!(2024 - 01 - 03))];

    let totals = summarize(records.iter());
    assert_eq!(totals.records, 2);
    assert_eq!(totals.quantity, Decimal::MAX);
    assert_eq!(totals.total_cost, Decimal::MAX);
}

#[test]
fn oversized_yield_derives_a_saturated_total() {
    let mut inputs = MilkYield::default();
    inputs
        .set_field("morning_yield", Decimal::MAX.to_string().into())
        .unwrap();
    inputs.set_field("evening_yield", "1".into()).unwrap();

    let derived = derive_all(&inputs, &DeriveContext::empty());
    assert_eq!(derived.total_yield, Decimal::MAX);
    assert_eq!(derived.performance, None);
}
