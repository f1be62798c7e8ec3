use crate::config::types::{Config, StoreConfig};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates a parsed configuration
///
/// Checks value ranges, URL syntax, template placeholders, and store name
/// uniqueness. Returns the first violation found.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.stores.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[stores]] entry is required".to_string(),
        ));
    }

    if config.crawler.max_workers == 0 {
        return Err(ConfigError::Validation(
            "crawler.max-workers must be at least 1".to_string(),
        ));
    }

    if config.crawler.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawler.request-timeout-secs must be at least 1".to_string(),
        ));
    }

    if config.pacing.min_millis > config.pacing.max_millis {
        return Err(ConfigError::Validation(format!(
            "pacing.min-millis ({}) exceeds pacing.max-millis ({})",
            config.pacing.min_millis, config.pacing.max_millis
        )));
    }

    if config.retry.max_rounds == 0 {
        return Err(ConfigError::Validation(
            "retry.max-rounds must be at least 1".to_string(),
        ));
    }

    if config.output.database_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.database-path must not be empty".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for store in &config.stores {
        if !names.insert(store.name().to_string()) {
            return Err(ConfigError::Validation(format!(
                "duplicate store name: {}",
                store.name()
            )));
        }
        validate_store(store)?;
    }

    Ok(())
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    match store {
        StoreConfig::Html(cfg) => {
            check_url(&cfg.landing_url)?;
            check_url(&cfg.categories_url)?;
            if cfg.page_param.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "store {}: page-param must not be empty",
                    cfg.name
                )));
            }
        }
        StoreConfig::Api(cfg) => {
            check_url(&cfg.landing_url)?;
            check_url(&cfg.navigation_url)?;
            if cfg.page_size == 0 {
                return Err(ConfigError::Validation(format!(
                    "store {}: page-size must be at least 1",
                    cfg.name
                )));
            }
            for placeholder in ["{category}", "{page}"] {
                if !cfg.search_url.contains(placeholder) {
                    return Err(ConfigError::Validation(format!(
                        "store {}: search-url is missing the {} placeholder",
                        cfg.name, placeholder
                    )));
                }
            }
        }
    }
    Ok(())
}

fn check_url(raw: &str) -> Result<(), ConfigError> {
    match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        _ => Err(ConfigError::InvalidUrl(raw.to_string())),
    }
}
