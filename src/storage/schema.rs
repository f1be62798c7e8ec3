//! Database schema definitions
//!
//! Only the append-only history table is part of the persistent schema;
//! the `products` snapshot and the `correlations` side table are dropped
//! and recreated on every write.

/// Persistent schema, applied at every open (idempotent)
pub const SCHEMA_SQL: &str = r#"
-- Append-only record of price changes over time
CREATE TABLE IF NOT EXISTS products_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL,
    store TEXT NOT NULL,
    link TEXT NOT NULL,
    product_name TEXT NOT NULL,
    starting_price REAL NOT NULL,
    final_price REAL NOT NULL,
    price_per_unit REAL NOT NULL,
    metric_unit TEXT NOT NULL,
    discounted INTEGER NOT NULL,
    scan_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_history_code ON products_history(code);
"#;

/// Snapshot table, fully replaced each run
pub const PRODUCTS_TABLE_SQL: &str = r#"
CREATE TABLE products (
    code TEXT NOT NULL,
    store TEXT NOT NULL,
    link TEXT NOT NULL,
    product_name TEXT NOT NULL,
    starting_price REAL NOT NULL,
    final_price REAL NOT NULL,
    price_per_unit REAL NOT NULL,
    metric_unit TEXT NOT NULL,
    discounted INTEGER NOT NULL
)
"#;

/// Key-value side table, fully replaced each write
pub const CORRELATIONS_TABLE_SQL: &str = r#"
CREATE TABLE correlations (
    key TEXT NOT NULL,
    value TEXT NOT NULL
)
"#;

/// Initializes the persistent schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
