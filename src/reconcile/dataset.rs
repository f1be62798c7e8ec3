//! Dataset construction: sort and deduplicate the drained sink

use crate::model::ProductRecord;
use std::cmp::Ordering;
use std::collections::HashSet;

/// The full, deduplicated, unit-price-sorted record collection for one run
///
/// Built once after all producers (including retries) have finished, then
/// immutable.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ProductRecord>,
}

impl Dataset {
    /// Sorts ascending by unit price (stable: ties keep enqueue order)
    /// and drops full-record duplicates, keeping the first occurrence
    pub fn from_records(mut raw: Vec<ProductRecord>) -> Self {
        raw.sort_by(|a, b| {
            a.price_per_unit
                .partial_cmp(&b.price_per_unit)
                .unwrap_or(Ordering::Equal)
        });

        let mut seen = HashSet::new();
        raw.retain(|record| seen.insert(dedup_key(record)));

        Self { records: raw }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct product codes, in dataset order
    pub fn codes(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.code.as_str()))
            .map(|r| r.code.clone())
            .collect()
    }
}

/// Hashable identity over every field; records differing in any field
/// (including the link) stay distinct
fn dedup_key(record: &ProductRecord) -> (String, String, String, String, u64, u64, u64, String, bool) {
    (
        record.code.clone(),
        record.store.clone(),
        record.link.clone(),
        record.product_name.clone(),
        record.starting_price.to_bits(),
        record.final_price.to_bits(),
        record.price_per_unit.to_bits(),
        record.metric_unit.clone(),
        record.discounted,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, unit_price: f64) -> ProductRecord {
        ProductRecord::new(
            None,
            "Alpha",
            format!("https://alpha.example/{}", name),
            name,
            1.0,
            1.0,
            Some(unit_price),
            Some("kg".to_string()),
        )
    }

    #[test]
    fn test_sorted_ascending_by_unit_price() {
        let dataset =
            Dataset::from_records(vec![record("c", 3.0), record("a", 1.0), record("b", 2.0)]);

        let prices: Vec<f64> = dataset.records().iter().map(|r| r.price_per_unit).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);

        for pair in dataset.records().windows(2) {
            assert!(pair[0].price_per_unit <= pair[1].price_per_unit);
        }
    }

    #[test]
    fn test_ties_keep_enqueue_order() {
        let dataset =
            Dataset::from_records(vec![record("first", 2.0), record("second", 2.0)]);

        assert_eq!(dataset.records()[0].product_name, "FIRST");
        assert_eq!(dataset.records()[1].product_name, "SECOND");
    }

    #[test]
    fn test_full_duplicates_collapse() {
        let dataset = Dataset::from_records(vec![
            record("milk", 1.5),
            record("milk", 1.5),
            record("milk", 1.5),
        ]);
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_any_field_difference_keeps_both() {
        let a = record("milk", 1.5);
        let mut b = record("milk", 1.5);
        b.link = "https://alpha.example/milk-alt".to_string();

        let dataset = Dataset::from_records(vec![a, b]);
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let raw = vec![
            record("c", 3.0),
            record("a", 1.0),
            record("a", 1.0),
            record("b", 2.0),
        ];

        let once = Dataset::from_records(raw);
        let twice = Dataset::from_records(once.records().to_vec());

        assert_eq!(once.records(), twice.records());
    }

    #[test]
    fn test_codes_are_distinct() {
        let dataset = Dataset::from_records(vec![
            record("milk", 1.0),
            record("milk", 1.0),
            record("bread", 2.0),
        ]);
        assert_eq!(dataset.codes().len(), 2);
    }
}
