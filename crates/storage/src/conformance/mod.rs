//! Conformance test suite for `RecordStore` implementations.
//!
//! A backend-agnostic suite that any record store can run to check that it
//! behaves the way the controllers expect. The suite exercises the feed-stock
//! kind, whose payload has no catalog-dependent derived values. It covers:
//!
//! - **CRUD**: server-assigned ids and timestamps, updates in place, deletes
//! - **Ordering**: newest first by date, then by creation time
//! - **Errors**: `NotFound` for vanished ids, field-keyed rejections
//! - **Auth**: unknown credentials are `Unauthenticated` and change nothing
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that creates
//! a fresh, empty store accepting the given token:
//!
//! ```ignore
//! use dairyops_storage::conformance::run_conformance_suite;
//! use dairyops_storage::MemoryRecordStore;
//!
//! #[tokio::test]
//! async fn memory_conformance() {
//!     let report = run_conformance_suite(|token| async move {
//!         MemoryRecordStore::<FeedStock>::new(&token)
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod auth;
mod crud;

use std::fmt;
use std::future::Future;

use dairyops_core::records::FeedStock;
use dairyops_core::{DeriveContext, NumericInput, Record};
use time::Date;

use crate::auth::BearerToken;
use crate::RecordStore;

/// Token handed to the factory. Stores must accept it.
pub const CONFORMANCE_TOKEN: &str = "conformance-token";

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "crud", "auth").
    pub category: String,
    /// Test name (e.g. "create_assigns_id").
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a record store.
///
/// The `factory` is called once per test with [`CONFORMANCE_TOKEN`] and must
/// return a fresh, empty store that accepts it.
pub async fn run_conformance_suite<T, F, Fut>(factory: F) -> ConformanceReport
where
    T: RecordStore<FeedStock>,
    F: Fn(BearerToken) -> Fut,
    Fut: Future<Output = T>,
{
    let mut results = Vec::new();

    results.extend(crud::run_crud_tests(&factory).await);
    results.extend(auth::run_auth_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn token() -> BearerToken {
    BearerToken::new(CONFORMANCE_TOKEN)
}

fn make_feed(date: Option<Date>, feed_type: &str, quantity: &str) -> Record<FeedStock> {
    Record::draft(
        FeedStock {
            date,
            feed_type: feed_type.to_string(),
            supplier: "Valley Co-op".to_string(),
            quantity: NumericInput::from(quantity),
            unit: "kg".to_string(),
            cost_per_unit: NumericInput::from("2.5"),
            remarks: String::new(),
        },
        &DeriveContext::empty(),
    )
}
