//! Dataset reconciliation and price-change detection
//!
//! After all producers finish, the sink drains into one sorted,
//! deduplicated `Dataset`. The dataset is then compared against the most
//! recent history rows for its codes: only runs with at least one change
//! are persisted at all.

mod dataset;

pub use dataset::Dataset;

use crate::model::ProductRecord;
use crate::storage::{PriceStore, StorageResult};
use std::collections::HashMap;

/// Most recent prior `starting_price` per product code, as read from the
/// history table
pub type HistorySnapshot = HashMap<String, f64>;

/// Finds the records whose price changed since the last recorded scan
///
/// A record counts as changed when its code has no history at all, or
/// when the most recent recorded `starting_price` differs from the
/// current one. Changes to the final or per-unit price alone are
/// deliberately not tracked.
pub fn detect_changes<'a>(dataset: &'a Dataset, history: &HistorySnapshot) -> Vec<&'a ProductRecord> {
    dataset
        .records()
        .iter()
        .filter(|record| match history.get(&record.code) {
            Some(prior) => *prior != record.starting_price,
            None => true,
        })
        .collect()
}

/// What the reconciler decided for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Records flagged as price changes
    pub changes: usize,

    /// Whether the snapshot and history were written
    pub persisted: bool,
}

/// Compares the dataset against stored history and persists only when at
/// least one record changed
///
/// With zero changes the store's write methods are never invoked.
pub fn reconcile_and_persist(
    store: &mut dyn PriceStore,
    dataset: &Dataset,
    scan_date: &str,
) -> StorageResult<ReconcileOutcome> {
    let history = store.load_history(&dataset.codes())?;
    let changes = detect_changes(dataset, &history).len();

    if changes == 0 {
        return Ok(ReconcileOutcome {
            changes: 0,
            persisted: false,
        });
    }

    store.write_run(dataset, scan_date)?;
    Ok(ReconcileOutcome {
        changes,
        persisted: true,
    })
}
