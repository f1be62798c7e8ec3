//! Configuration loading and validation
//!
//! Agora is configured through a TOML file: crawl behavior, pacing for the
//! sequential API path, retry bounds, output database, and one `[[stores]]`
//! entry per retailer.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    ApiStoreConfig, Config, CrawlerConfig, HtmlSelectors, HtmlStoreConfig, OutputConfig,
    PacingConfig, RetryConfig, StoreConfig,
};
pub use validation::validate;
