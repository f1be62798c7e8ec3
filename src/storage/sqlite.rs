//! SQLite implementation of the persistence gateway

use crate::model::ProductRecord;
use crate::reconcile::{Dataset, HistorySnapshot};
use crate::storage::schema::{
    initialize_schema, CORRELATIONS_TABLE_SQL, PRODUCTS_TABLE_SQL,
};
use crate::storage::traits::{PriceStore, StorageError, StorageResult};
use rusqlite::{params, params_from_iter, Connection};

/// SQLite-backed price store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database and applies the persistent schema
    pub fn new(path: &std::path::Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl PriceStore for SqliteStore {
    fn load_history(&self, codes: &[String]) -> StorageResult<HistorySnapshot> {
        let mut history = HistorySnapshot::new();
        if codes.is_empty() {
            return Ok(history);
        }

        // Latest row per code wins; id order follows insertion order
        let placeholders = vec!["?"; codes.len()].join(", ");
        let query = format!(
            "SELECT h.code, h.starting_price
             FROM products_history h
             JOIN (SELECT code, MAX(id) AS latest_id
                   FROM products_history GROUP BY code) latest
               ON h.id = latest.latest_id
             WHERE h.code IN ({})",
            placeholders
        );

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(codes.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        for row in rows {
            let (code, starting_price) = row?;
            history.insert(code, starting_price);
        }

        Ok(history)
    }

    fn write_run(&mut self, dataset: &Dataset, scan_date: &str) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DROP TABLE IF EXISTS products", [])?;
        tx.execute(PRODUCTS_TABLE_SQL, [])?;

        {
            let mut insert_snapshot = tx.prepare(
                "INSERT INTO products
                 (code, store, link, product_name, starting_price, final_price,
                  price_per_unit, metric_unit, discounted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            let mut insert_history = tx.prepare(
                "INSERT INTO products_history
                 (code, store, link, product_name, starting_price, final_price,
                  price_per_unit, metric_unit, discounted, scan_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;

            for record in dataset.records() {
                insert_snapshot.execute(params![
                    record.code,
                    record.store,
                    record.link,
                    record.product_name,
                    record.starting_price,
                    record.final_price,
                    record.price_per_unit,
                    record.metric_unit,
                    record.discounted as i64,
                ])?;
                insert_history.execute(params![
                    record.code,
                    record.store,
                    record.link,
                    record.product_name,
                    record.starting_price,
                    record.final_price,
                    record.price_per_unit,
                    record.metric_unit,
                    record.discounted as i64,
                    scan_date,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn replace_correlations(&mut self, entries: &[(String, String)]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        tx.execute("DROP TABLE IF EXISTS correlations", [])?;
        tx.execute(CORRELATIONS_TABLE_SQL, [])?;

        {
            let mut insert =
                tx.prepare("INSERT INTO correlations (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                insert.execute(params![key, value])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn load_snapshot(&self) -> StorageResult<Vec<ProductRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT code, store, link, product_name, starting_price, final_price,
                    price_per_unit, metric_unit, discounted
             FROM products",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(ProductRecord {
                code: row.get(0)?,
                store: row.get(1)?,
                link: row.get(2)?,
                product_name: row.get(3)?,
                starting_price: row.get(4)?,
                final_price: row.get(5)?,
                price_per_unit: row.get(6)?,
                metric_unit: row.get(7)?,
                discounted: row.get::<_, i64>(8)? != 0,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(StorageError::from)
    }

    fn history_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products_history", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, starting: f64, unit_price: f64) -> ProductRecord {
        ProductRecord::new(
            Some(code.to_string()),
            "Alpha",
            format!("https://alpha.example/{}", code),
            code,
            starting,
            starting,
            Some(unit_price),
            Some("kg".to_string()),
        )
    }

    fn dataset(records: Vec<ProductRecord>) -> Dataset {
        Dataset::from_records(records)
    }

    #[test]
    fn test_write_run_populates_both_tables() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let data = dataset(vec![record("a", 1.0, 1.0), record("b", 2.0, 2.0)]);

        store.write_run(&data, "2024-03-01").unwrap();

        assert_eq!(store.load_snapshot().unwrap().len(), 2);
        assert_eq!(store.history_count().unwrap(), 2);
    }

    #[test]
    fn test_snapshot_is_replaced_history_appends() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .write_run(&dataset(vec![record("a", 1.0, 1.0)]), "2024-03-01")
            .unwrap();
        store
            .write_run(
                &dataset(vec![record("a", 1.5, 1.5), record("b", 2.0, 2.0)]),
                "2024-03-02",
            )
            .unwrap();

        // Snapshot holds only the latest run
        assert_eq!(store.load_snapshot().unwrap().len(), 2);
        // History kept every row
        assert_eq!(store.history_count().unwrap(), 3);
    }

    #[test]
    fn test_load_history_returns_latest_per_code() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .write_run(&dataset(vec![record("a", 1.0, 1.0)]), "2024-03-01")
            .unwrap();
        store
            .write_run(&dataset(vec![record("a", 1.5, 1.5)]), "2024-03-02")
            .unwrap();

        let history = store.load_history(&["a".to_string()]).unwrap();
        assert_eq!(history.get("a"), Some(&1.5));
    }

    #[test]
    fn test_load_history_ignores_other_codes() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        store
            .write_run(
                &dataset(vec![record("a", 1.0, 1.0), record("b", 2.0, 2.0)]),
                "2024-03-01",
            )
            .unwrap();

        let history = store.load_history(&["a".to_string()]).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_load_history_empty_codes() {
        let store = SqliteStore::new_in_memory().unwrap();
        assert!(store.load_history(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let mut store = SqliteStore::new_in_memory().unwrap();
        let original = ProductRecord::new(
            Some("feta-400".to_string()),
            "Beta Foods",
            "https://beta.example/products/feta-400".to_string(),
            "Φέτα ΠΟΠ 400g",
            4.99,
            3.99,
            Some(9.98),
            Some("κιλό".to_string()),
        );

        store
            .write_run(&dataset(vec![original.clone()]), "2024-03-01")
            .unwrap();

        let loaded = store.load_snapshot().unwrap();
        assert_eq!(loaded[0], original);
    }

    #[test]
    fn test_correlations_are_replaced() {
        let mut store = SqliteStore::new_in_memory().unwrap();

        store
            .replace_correlations(&[("alpha".to_string(), "beta".to_string())])
            .unwrap();
        store
            .replace_correlations(&[
                ("gamma".to_string(), "delta".to_string()),
                ("epsilon".to_string(), "zeta".to_string()),
            ])
            .unwrap();

        let count: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM correlations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
