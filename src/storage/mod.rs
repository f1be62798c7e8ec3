//! Persistence gateway: snapshot, history, and correlations tables
//!
//! Two tables carry the core data: `products` (current snapshot, fully
//! replaced each run) and `products_history` (append-only, one row per
//! persisted record per run, stamped with the scan date). A `correlations`
//! key-value side table is supported as a pass-through write.

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{PriceStore, StorageError, StorageResult};
