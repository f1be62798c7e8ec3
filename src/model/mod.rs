//! Core data model: product records and category descriptors

mod category;
mod product;

pub use category::CategoryDescriptor;
pub use product::{
    normalize_name, parse_price, parse_unit_price, synthesize_code, ProductRecord,
    FALLBACK_METRIC_UNIT,
};
