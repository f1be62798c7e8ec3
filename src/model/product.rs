//! Product record value object and field normalization
//!
//! A `ProductRecord` is one observed product at one point in time. Records
//! are created by the source adapters, enqueued once into the sink, and
//! never mutated afterwards.

use sha2::{Digest, Sha256};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Metric unit used when a source provides no per-unit price
pub const FALLBACK_METRIC_UNIT: &str = "item";

/// One observed product at one point in time
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    /// Store-assigned identifier, or synthesized from the link
    pub code: String,

    /// Retailer this product was observed at
    pub store: String,

    /// Absolute product URL
    pub link: String,

    /// Normalized name: NFD-decomposed, uppercased, diacritics stripped
    pub product_name: String,

    /// Pre-discount list price
    pub starting_price: f64,

    /// Current (possibly discounted) price
    pub final_price: f64,

    /// Price per metric unit; falls back to `final_price`
    pub price_per_unit: f64,

    /// Unit the per-unit price refers to ("kg", "L", ...)
    pub metric_unit: String,

    /// Whether `final_price` is below `starting_price`
    pub discounted: bool,
}

impl ProductRecord {
    /// Builds a record, normalizing fields and repairing the price invariant
    ///
    /// The name is normalized, a missing code is synthesized from the link,
    /// and a starting price below the final price is raised to it so that
    /// `discounted` implies `final_price <= starting_price`.
    pub fn new(
        code: Option<String>,
        store: &str,
        link: String,
        raw_name: &str,
        starting_price: f64,
        final_price: f64,
        price_per_unit: Option<f64>,
        metric_unit: Option<String>,
    ) -> Self {
        let starting_price = starting_price.max(final_price);
        let code = code.unwrap_or_else(|| synthesize_code(&link));

        Self {
            code,
            store: store.to_string(),
            product_name: normalize_name(raw_name),
            starting_price,
            final_price,
            price_per_unit: price_per_unit.unwrap_or(final_price),
            metric_unit: metric_unit.unwrap_or_else(|| FALLBACK_METRIC_UNIT.to_string()),
            discounted: final_price < starting_price,
            link,
        }
    }
}

/// Normalizes a product name: canonical decomposition, combining marks
/// stripped, uppercased
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
}

/// Derives a stable product code from the product link
///
/// HTML retailers assign no code; hashing the link keeps change detection
/// working across runs.
pub fn synthesize_code(link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}

/// Parses a European-formatted price string ("1,23 €", "1.234,56 €")
///
/// Text after a `/` (a unit suffix) is ignored. Returns `None` when no
/// numeric content is found.
pub fn parse_price(raw: &str) -> Option<f64> {
    let numeric_part = raw.split('/').next().unwrap_or(raw);
    let filtered: String = numeric_part
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if filtered.is_empty() {
        return None;
    }

    // With both separators present the dot is a thousands separator;
    // a lone comma is the decimal separator.
    let normalized = if filtered.contains(',') {
        filtered.replace('.', "").replace(',', ".")
    } else {
        filtered
    };

    normalized.parse::<f64>().ok()
}

/// Parses a unit-price string, returning the price and the metric unit
/// after the `/` when present ("2,99 €/κιλό" -> (2.99, Some("κιλό")))
pub fn parse_unit_price(raw: &str) -> Option<(f64, Option<String>)> {
    let price = parse_price(raw)?;
    let unit = raw.split('/').nth(1).map(|part| {
        part.trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_string()
    });
    Some((price, unit.filter(|u| !u.is_empty())))
}
