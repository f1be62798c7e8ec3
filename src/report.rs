//! Run summary reporting

use std::collections::HashMap;
use std::time::Duration;

/// Everything a finished run reports back
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Records scraped before deduplication
    pub raw_records: usize,

    /// Records in the final dataset
    pub unique_records: usize,

    /// Products skipped during extraction
    pub skipped_products: u64,

    /// Skips broken down by store
    pub skips_by_store: HashMap<String, u64>,

    /// Pages fetched successfully (before retries)
    pub pages_fetched: u64,

    /// Page fetches that failed transiently
    pub failed_fetches: u64,

    /// Retry rounds executed
    pub retry_rounds: u32,

    /// Failed fetches that succeeded on retry
    pub recovered_fetches: u64,

    /// Fetches still failing when the retry coordinator stopped
    pub unresolved_failures: usize,

    /// Records flagged as price changes
    pub changes_detected: usize,

    /// Whether the snapshot and history were written
    pub persisted: bool,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

/// Renders the run summary as a JSON object
pub fn report_to_json(report: &RunReport) -> serde_json::Value {
    serde_json::json!({
        "records": {
            "scraped": report.raw_records,
            "unique": report.unique_records,
            "skipped": report.skipped_products,
            "skipped_by_store": report.skips_by_store,
        },
        "fetches": {
            "pages": report.pages_fetched,
            "failed": report.failed_fetches,
            "recovered": report.recovered_fetches,
            "retry_rounds": report.retry_rounds,
            "unresolved": report.unresolved_failures,
        },
        "changes_detected": report.changes_detected,
        "persisted": report.persisted,
        "runtime_seconds": report.duration.as_secs_f64(),
    })
}

/// Prints the run summary to standard output
pub fn print_report(report: &RunReport) {
    println!("=== Scan Summary ===");
    println!(
        "Records: {} scraped, {} unique",
        report.raw_records, report.unique_records
    );
    println!("Pages fetched: {}", report.pages_fetched);

    if report.skipped_products > 0 {
        println!("Skipped products: {}", report.skipped_products);
        let mut stores: Vec<_> = report.skips_by_store.iter().collect();
        stores.sort();
        for (store, count) in stores {
            println!("  - {}: {}", store, count);
        }
    }

    if report.failed_fetches > 0 {
        println!(
            "Failed fetches: {} ({} recovered in {} retry rounds, {} unresolved)",
            report.failed_fetches,
            report.recovered_fetches,
            report.retry_rounds,
            report.unresolved_failures
        );
    }

    if report.persisted {
        println!("Price changes: {} (snapshot and history written)", report.changes_detected);
    } else {
        println!("Price changes: none (persistence skipped)");
    }

    println!("Total runtime: {:.2} seconds", report.duration.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        RunReport {
            raw_records: 120,
            unique_records: 110,
            skipped_products: 3,
            skips_by_store: HashMap::from([("Alpha".to_string(), 3)]),
            pages_fetched: 40,
            failed_fetches: 2,
            retry_rounds: 1,
            recovered_fetches: 2,
            unresolved_failures: 0,
            changes_detected: 15,
            persisted: true,
            duration: Duration::from_secs(12),
        }
    }

    #[test]
    fn test_report_prints_without_panicking() {
        print_report(&sample_report());
    }

    #[test]
    fn test_json_report_fields() {
        let json = report_to_json(&sample_report());
        assert_eq!(json["records"]["unique"], 110);
        assert_eq!(json["fetches"]["retry_rounds"], 1);
        assert_eq!(json["persisted"], true);
        assert_eq!(json["runtime_seconds"], 12.0);
    }
}
