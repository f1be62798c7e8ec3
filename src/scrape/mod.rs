//! Scrape pipeline: adapters, sink, orchestration, and retries
//!
//! This module contains the ingestion half of a run:
//! - Source adapters for the two retrieval patterns
//! - The shared collection sink
//! - The orchestrator (parallel HTML fan-out, paced sequential API path)
//! - The retry coordinator for transiently failed fetches
//!
//! `run_scan` ties a whole run together: scrape, retry, reconcile,
//! persist.

mod adapter;
mod api;
mod fetcher;
mod html;
mod orchestrator;
mod retry;
mod sink;

pub use adapter::{PageFetch, SourceAdapter};
pub use api::ApiAdapter;
pub use fetcher::{build_http_client, fetch_text, FetchError};
pub use html::HtmlAdapter;
pub use orchestrator::{build_adapters, Orchestrator, ScrapeStats};
pub use retry::{drain_failures, FailedFetch, FailureSet, RetryOutcome};
pub use sink::RecordSink;

use crate::config::Config;
use crate::reconcile::{reconcile_and_persist, Dataset};
use crate::report::RunReport;
use crate::storage::SqliteStore;
use crate::Result;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Runs one complete scan: scrape all stores, retry failures, build the
/// dataset, and persist it when prices changed
///
/// Persistence is skipped entirely when no record differs from its most
/// recent history entry.
pub async fn run_scan(config: Config, cancel: CancellationToken) -> Result<RunReport> {
    let start = Instant::now();
    let config = Arc::new(config);

    let sink = RecordSink::new();
    let orchestrator = Orchestrator::new(Arc::clone(&config), sink.clone(), cancel.clone())?;

    tracing::info!("scraping {} stores", config.stores.len());
    let (stats, failures) = orchestrator.run().await?;

    let retry = drain_failures(
        orchestrator.client(),
        orchestrator.adapters(),
        &sink,
        failures,
        config.retry.max_rounds,
        &cancel,
    )
    .await;

    let skipped_products = sink.total_skips();
    let skips_by_store = sink.skips_by_store();
    let raw = sink.drain_all();
    let raw_records = raw.len();
    let dataset = Dataset::from_records(raw);

    tracing::info!(
        "dataset built: {} unique records from {} scraped",
        dataset.len(),
        raw_records
    );

    // A cancelled run holds an incomplete dataset; replacing the snapshot
    // with it would discard rows from the previous full run.
    if cancel.is_cancelled() {
        tracing::warn!("run cancelled, skipping persistence");
        return Ok(RunReport {
            raw_records,
            unique_records: dataset.len(),
            skipped_products,
            skips_by_store,
            pages_fetched: stats.pages_fetched,
            failed_fetches: stats.failed_fetches,
            retry_rounds: retry.rounds,
            recovered_fetches: retry.recovered,
            unresolved_failures: retry.unresolved.len(),
            changes_detected: 0,
            persisted: false,
            duration: start.elapsed(),
        });
    }

    let mut store = SqliteStore::new(Path::new(&config.output.database_path))?;
    let scan_date = Utc::now().format("%Y-%m-%d").to_string();
    let outcome = reconcile_and_persist(&mut store, &dataset, &scan_date)?;

    if outcome.persisted {
        tracing::info!(
            "{} price changes detected, snapshot and history written",
            outcome.changes
        );
    } else {
        tracing::info!("no price changes detected, skipping persistence");
    }

    Ok(RunReport {
        raw_records,
        unique_records: dataset.len(),
        skipped_products,
        skips_by_store,
        pages_fetched: stats.pages_fetched,
        failed_fetches: stats.failed_fetches,
        retry_rounds: retry.rounds,
        recovered_fetches: retry.recovered,
        unresolved_failures: retry.unresolved.len(),
        changes_detected: outcome.changes,
        persisted: outcome.persisted,
        duration: start.elapsed(),
    })
}
