//! Pulse Test Utilities
//!
//! Shared test infrastructure for the Pulse workspace:
//! - Scripted upstream doubles (`ScriptedDataSource`, `ScriptedRateProvider`)
//! - Proptest generators for upstream rows
//! - Fixtures for common scenarios
//! - Assertions for ranking invariants

// Re-export core types for convenience
pub use pulse_core::{
    DataCategory, DataSource, ExchangeRateProvider, ExportRow, FetchError, RankingEntry,
    RawRecord, Region, Snapshot,
};

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

// ============================================================================
// SCRIPTED RESPONSES
// ============================================================================

/// Queue of canned responses. The last response repeats forever.
#[derive(Debug)]
struct Script<T> {
    responses: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new() -> Self {
        Self {
            responses: VecDeque::new(),
        }
    }

    fn push(&mut self, response: T) {
        self.responses.push_back(response);
    }

    fn next(&mut self) -> Option<T> {
        if self.responses.len() > 1 {
            self.responses.pop_front()
        } else {
            self.responses.front().cloned()
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

type RawScript = Script<Result<Vec<RawRecord>, FetchError>>;
type ExportScript = Script<Result<Vec<ExportRow>, FetchError>>;

// ============================================================================
// MOCK DATA SOURCE
// ============================================================================

/// Data source replaying scripted responses per region.
///
/// Responses are consumed in order; once one remains it is returned for every
/// later call. A region with nothing scripted fails with a connection error.
#[derive(Debug)]
pub struct ScriptedDataSource {
    category: DataCategory,
    name: String,
    delay: Option<Duration>,
    raw: Mutex<HashMap<Region, RawScript>>,
    export: Mutex<HashMap<Region, ExportScript>>,
    raw_calls: AtomicUsize,
    export_calls: AtomicUsize,
}

impl ScriptedDataSource {
    pub fn new(category: DataCategory) -> Self {
        Self {
            category,
            name: format!("scripted:{}", category.key_prefix()),
            delay: None,
            raw: Mutex::new(HashMap::new()),
            export: Mutex::new(HashMap::new()),
            raw_calls: AtomicUsize::new(0),
            export_calls: AtomicUsize::new(0),
        }
    }

    /// Every fetch for every region succeeds with no rows.
    pub fn healthy(category: DataCategory) -> Self {
        let source = Self::new(category);
        for region in Region::ALL {
            source.push_raw(region, Ok(Vec::new()));
            source.push_export(region, Ok(Vec::new()));
        }
        source
    }

    /// Every fetch for every region fails with `error`.
    pub fn failing(category: DataCategory, error: FetchError) -> Self {
        let source = Self::new(category);
        for region in Region::ALL {
            source.push_raw(region, Err(error.clone()));
            source.push_export(region, Err(error.clone()));
        }
        source
    }

    /// Sleep this long before answering each fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_raw(&self, region: Region, response: Result<Vec<RawRecord>, FetchError>) {
        lock(&self.raw)
            .entry(region)
            .or_insert_with(Script::new)
            .push(response);
    }

    pub fn push_export(&self, region: Region, response: Result<Vec<ExportRow>, FetchError>) {
        lock(&self.export)
            .entry(region)
            .or_insert_with(Script::new)
            .push(response);
    }

    /// Script the same outcome for raw and export fetches of both regions.
    pub fn push_all(&self, raw: Result<Vec<RawRecord>, FetchError>) {
        for region in Region::ALL {
            self.push_raw(region, raw.clone());
            self.push_export(region, raw.clone().map(|_| Vec::new()));
        }
    }

    pub fn raw_calls(&self) -> usize {
        self.raw_calls.load(Ordering::SeqCst)
    }

    pub fn export_calls(&self) -> usize {
        self.export_calls.load(Ordering::SeqCst)
    }

    /// Total fetches of either kind.
    pub fn calls(&self) -> usize {
        self.raw_calls() + self.export_calls()
    }

    fn unscripted(&self, region: Region) -> FetchError {
        FetchError::Connection {
            source_name: format!("{}/{}", self.name, region.key_suffix()),
            reason: "no scripted response".to_string(),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl DataSource for ScriptedDataSource {
    fn category(&self) -> DataCategory {
        self.category
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_raw(&self, region: Region) -> Result<Vec<RawRecord>, FetchError> {
        self.raw_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let next = lock(&self.raw).get_mut(&region).and_then(Script::next);
        next.unwrap_or_else(|| Err(self.unscripted(region)))
    }

    async fn fetch_export(&self, region: Region) -> Result<Vec<ExportRow>, FetchError> {
        self.export_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let next = lock(&self.export).get_mut(&region).and_then(Script::next);
        next.unwrap_or_else(|| Err(self.unscripted(region)))
    }
}

// ============================================================================
// MOCK RATE PROVIDER
// ============================================================================

/// Rate provider replaying scripted quotes.
#[derive(Debug)]
pub struct ScriptedRateProvider {
    name: String,
    delay: Option<Duration>,
    quotes: Mutex<Script<Result<f64, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedRateProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay: None,
            quotes: Mutex::new(Script::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always quotes `rate`, plausible or not.
    pub fn returning(name: impl Into<String>, rate: f64) -> Self {
        let provider = Self::new(name);
        provider.push(Ok(rate));
        provider
    }

    /// Always fails with a connection error.
    pub fn failing(name: impl Into<String>) -> Self {
        let provider = Self::new(name);
        let error = FetchError::Connection {
            source_name: provider.name.clone(),
            reason: "connection refused".to_string(),
        };
        provider.push(Err(error));
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, quote: Result<f64, FetchError>) {
        lock(&self.quotes).push(quote);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeRateProvider for ScriptedRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rate(&self) -> Result<f64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = lock(&self.quotes).next();
        next.unwrap_or_else(|| {
            Err(FetchError::Connection {
                source_name: self.name.clone(),
                reason: "no scripted quote".to_string(),
            })
        })
    }
}

// ============================================================================
// RECORD BUILDER
// ============================================================================

/// Fluent builder for [`RawRecord`].
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    record: RawRecord,
}

impl RecordBuilder {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            record: RawRecord {
                order_id: Some(order_id.into()),
                ..Default::default()
            },
        }
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.record.quantity = Some(quantity);
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.record.amount = Some(amount);
        self
    }

    pub fn territory(mut self, code: impl Into<String>) -> Self {
        self.record.territory_code = Some(code.into());
        self
    }

    pub fn customer_territory(mut self, code: impl Into<String>) -> Self {
        self.record.customer_territory = Some(code.into());
        self
    }

    pub fn customer(mut self, customer_id: impl Into<String>) -> Self {
        self.record.customer_id = Some(customer_id.into());
        self
    }

    pub fn product_line(mut self, product_line: impl Into<String>) -> Self {
        self.record.product_line = Some(product_line.into());
        self
    }

    pub fn discount(mut self, pct: f64) -> Self {
        self.record.discount_pct = Some(pct);
        self
    }

    pub fn salesperson(mut self, salesperson: impl Into<String>) -> Self {
        self.record.salesperson = Some(salesperson.into());
        self
    }

    pub fn build(self) -> RawRecord {
        self.record
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_category() -> impl Strategy<Value = DataCategory> {
        prop_oneof![Just(DataCategory::Bookings), Just(DataCategory::OpenOrders)]
    }

    pub fn arb_region() -> impl Strategy<Value = Region> {
        prop_oneof![Just(Region::Us), Just(Region::Ca)]
    }

    /// Territory codes biased towards mapped, override and padded values.
    pub fn arb_territory_code() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("900".to_string())),
            Just(Some("312".to_string())),
            Just(Some("211".to_string())),
            Just(Some("502".to_string())),
            Just(Some(" 114 ".to_string())),
            "[0-9]{3}".prop_map(Some),
        ]
    }

    /// Customer ids including excluded ones in odd case and padding.
    pub fn arb_customer() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("misc".to_string())),
            Just(Some(" W1TOR ".to_string())),
            Just(Some("TEST123".to_string())),
            "[A-Z]{3,6}".prop_map(Some),
        ]
    }

    pub fn arb_product_line() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some("TAX".to_string())),
            Just(Some(" tax".to_string())),
            "[A-Z]{3,5}".prop_map(Some),
        ]
    }

    /// Records with every field optional; amounts are whole cents.
    pub fn arb_raw_record() -> impl Strategy<Value = RawRecord> {
        (
            prop::option::of(1u32..50),
            prop::option::of(0i64..500),
            prop::option::of(0u32..1_000_000),
            arb_territory_code(),
            arb_territory_code(),
            arb_customer(),
            arb_product_line(),
            prop::option::of(0u32..100),
            prop::option::of("[A-Z0-9 ]{0,4}"),
        )
            .prop_map(
                |(order, qty, cents, terr, cust_terr, cust, plin, disc, salesperson)| RawRecord {
                    order_id: order.map(|o| o.to_string()),
                    quantity: qty,
                    amount: cents.map(|c| c as f64 / 100.0),
                    territory_code: terr,
                    customer_territory: cust_terr,
                    customer_id: cust,
                    product_line: plin,
                    discount_pct: disc.map(f64::from),
                    salesperson,
                },
            )
    }

    pub fn arb_records(max: usize) -> impl Strategy<Value = Vec<RawRecord>> {
        prop::collection::vec(arb_raw_record(), 0..max)
    }

    /// Quotes on both sides of the plausibility window.
    pub fn arb_quote() -> impl Strategy<Value = f64> {
        prop_oneof![0.0f64..0.5, 0.5f64..=1.0, 1.0f64..2.0]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::Value;

    /// Date used by deterministic aggregation tests.
    pub fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap_or_default()
    }

    /// One billing-override line and one tax line for the US.
    ///
    /// Aggregated, only the first line survives: total 1000, 10 units, one
    /// order, one territory ranked "Central Billing".
    pub fn billing_and_tax_records() -> Vec<RawRecord> {
        vec![
            RecordBuilder::new("1")
                .quantity(10)
                .amount(1000.0)
                .territory("900")
                .customer("ABC")
                .product_line("WHEEL")
                .build(),
            RecordBuilder::new("2")
                .quantity(5)
                .amount(500.0)
                .territory("312")
                .customer("XYZ")
                .product_line("TAX")
                .build(),
        ]
    }

    /// Three Atlanta lines across two orders, plus an excluded customer.
    pub fn atlanta_records() -> Vec<RawRecord> {
        vec![
            RecordBuilder::new("10")
                .quantity(1)
                .amount(100.25)
                .territory("312")
                .customer("ACME")
                .build(),
            RecordBuilder::new("10")
                .quantity(2)
                .amount(200.50)
                .territory("312")
                .customer("ACME")
                .build(),
            RecordBuilder::new("11")
                .quantity(3)
                .amount(50.0)
                .territory("211")
                .customer("BOLT")
                .build(),
            RecordBuilder::new("12")
                .quantity(9)
                .amount(999.0)
                .territory("312")
                .customer("MISC")
                .build(),
        ]
    }

    /// Export row from `(column, value)` pairs.
    pub fn export_row(columns: &[(&str, Value)]) -> ExportRow {
        let mut row = ExportRow::new();
        for (column, value) in columns {
            row.insert(*column, value.clone());
        }
        row
    }

    pub fn connection_refused(source_name: &str) -> FetchError {
        FetchError::Connection {
            source_name: source_name.to_string(),
            reason: "connection refused".to_string(),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

/// Assert ranks are exactly 1..N with non-increasing totals.
pub fn assert_ranking_invariants(ranking: &[RankingEntry]) {
    for (position, entry) in ranking.iter().enumerate() {
        assert_eq!(
            entry.rank as usize,
            position + 1,
            "rank gap at position {} ({})",
            position,
            entry.name
        );
    }
    for pair in ranking.windows(2) {
        assert!(
            pair[0].total >= pair[1].total,
            "{} ({}) ranked above {} ({})",
            pair[0].name,
            pair[0].total,
            pair[1].name,
            pair[1].total
        );
    }
}
