//! Collection sink - the shared accumulation queue for scraped records
//!
//! Many workers put records concurrently; the reconciler drains exactly
//! once after every producer has been joined. Records become immutable on
//! enqueue and are never consumed anywhere else.

use crate::model::ProductRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Thread-safe, unbounded sink for product records
///
/// Cloning produces another handle to the same queue. `put` never blocks
/// on capacity and never drops a record. `drain_all` is only meaningful
/// after all producers have been joined; it is not a consistent snapshot
/// while puts are in flight.
#[derive(Debug, Clone, Default)]
pub struct RecordSink {
    records: Arc<Mutex<Vec<ProductRecord>>>,
    skips: Arc<Mutex<HashMap<String, u64>>>,
}

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues one record
    pub fn put(&self, record: ProductRecord) {
        self.records.lock().unwrap().push(record);
    }

    /// Counts a product that was skipped during extraction
    pub fn record_skip(&self, store: &str, reason: &str) {
        tracing::debug!("skipping product from {}: {}", store, reason);
        *self.skips.lock().unwrap().entry(store.to_string()).or_insert(0) += 1;
    }

    /// Counts several skips at once (per-page totals from adapters)
    pub fn add_skips(&self, store: &str, count: u64) {
        if count > 0 {
            *self.skips.lock().unwrap().entry(store.to_string()).or_insert(0) += count;
        }
    }

    /// Number of records currently enqueued
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total skipped-product count across all stores
    pub fn total_skips(&self) -> u64 {
        self.skips.lock().unwrap().values().sum()
    }

    /// Skip counts per store
    pub fn skips_by_store(&self) -> HashMap<String, u64> {
        self.skips.lock().unwrap().clone()
    }

    /// Removes and returns every record currently enqueued
    ///
    /// Called once, after the producers' join barrier.
    pub fn drain_all(&self) -> Vec<ProductRecord> {
        std::mem::take(&mut *self.records.lock().unwrap())
    }
}
