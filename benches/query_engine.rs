//! Benchmark suite for the query engine
//!
//! Measures filtering, sorting and summarizing over generated contract
//! collections using the divan benchmarking framework.
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Amounts are localized strings (`"€12.345"`), so every numeric comparison
//! pays for currency parsing, as it does on real exports.

use deposit_dashboard::core::{summarize, EntityKind, QueryEngine};
use deposit_dashboard::{FilterSpec, Predicate, Record, SortSpec};
use divan::Bencher;
use rust_decimal::Decimal;

const SIZES: [usize; 3] = [100, 1_000, 10_000];
const STATUSES: [&str; 4] = ["active", "pending", "cancelled", "finished"];

fn main() {
    divan::main();
}

fn contracts(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let euros = (i * 7_919) % 250_000;
            Record::new()
                .with("id", i as i64)
                .with("client_name", format!("Client {}", i))
                .with("amount", format!("€{}.{:03}", euros / 1000, euros % 1000))
                .with("status", STATUSES[i % STATUSES.len()])
                .with("start_date", format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1))
        })
        .collect()
}

/// Search plus a status and amount filter
#[divan::bench(args = SIZES)]
fn filter(bencher: Bencher, count: usize) {
    let records = contracts(count);
    let engine = QueryEngine::for_entity(EntityKind::Contracts);
    let filters = FilterSpec::new()
        .with_search("client 1")
        .with("status", Predicate::Exact("active".to_string()))
        .with(
            "amount",
            Predicate::Range {
                min: Some(Decimal::from(50_000)),
                max: None,
            },
        );

    bencher.bench(|| engine.query(&records, &filters, None));
}

/// Sort by a currency field
#[divan::bench(args = SIZES)]
fn sort_by_amount(bencher: Bencher, count: usize) {
    let records = contracts(count);
    let engine = QueryEngine::for_entity(EntityKind::Contracts);
    let sort = SortSpec::desc("amount");

    bencher.bench(|| engine.query(&records, &FilterSpec::new(), Some(&sort)));
}

/// Sort by a date field
#[divan::bench(args = SIZES)]
fn sort_by_date(bencher: Bencher, count: usize) {
    let records = contracts(count);
    let engine = QueryEngine::for_entity(EntityKind::Contracts);
    let sort = SortSpec::asc("start_date");

    bencher.bench(|| engine.query(&records, &FilterSpec::new(), Some(&sort)));
}

/// Status distribution
#[divan::bench(args = SIZES)]
fn summarize_status(bencher: Bencher, count: usize) {
    let records = contracts(count);

    bencher.bench(|| summarize(&records, "status"));
}
