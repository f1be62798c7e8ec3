//! Agora: a concurrent grocery price scanner
//!
//! This crate crawls configured grocery retailers (paginated HTML listing
//! pages and a JSON category-search API), normalizes products into a common
//! schema, ranks them by unit price, and records price changes over time
//! in SQLite.

pub mod config;
pub mod model;
pub mod reconcile;
pub mod report;
pub mod scrape;
pub mod storage;

use thiserror::Error;

/// Main error type for Agora operations
#[derive(Debug, Error)]
pub enum AgoraError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Category discovery failed for {store}: {message}")]
    Discovery { store: String, message: String },

    #[error("No store named {0} in configuration")]
    UnknownStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Agora operations
pub type Result<T> = std::result::Result<T, AgoraError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{CategoryDescriptor, ProductRecord};
pub use reconcile::Dataset;
pub use scrape::RecordSink;
pub use storage::{PriceStore, SqliteStore};
