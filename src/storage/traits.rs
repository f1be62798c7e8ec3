//! Persistence gateway trait and error types

use crate::model::ProductRecord;
use crate::reconcile::{Dataset, HistorySnapshot};
use thiserror::Error;

/// Errors from the persistence gateway
///
/// Storage errors are fatal: the run aborts with a diagnostic rather
/// than leave a half-applied snapshot behind.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence gateway: current snapshot plus append-only history
///
/// `write_run` must replace the snapshot and append to history atomically
/// for a run; callers invoke it at most once per run, and only when the
/// reconciler found at least one price change.
pub trait PriceStore {
    /// Most recent recorded `starting_price` per code, for the given codes
    fn load_history(&self, codes: &[String]) -> StorageResult<HistorySnapshot>;

    /// Replaces the `products` snapshot and appends every dataset record
    /// to `products_history` under the given scan date, in one transaction
    fn write_run(&mut self, dataset: &Dataset, scan_date: &str) -> StorageResult<()>;

    /// Replaces the `correlations` key-value side table
    fn replace_correlations(&mut self, entries: &[(String, String)]) -> StorageResult<()>;

    /// Reads the current snapshot back (dataset order is not preserved)
    fn load_snapshot(&self) -> StorageResult<Vec<ProductRecord>>;

    /// Total rows in the history table
    fn history_count(&self) -> StorageResult<u64>;
}
