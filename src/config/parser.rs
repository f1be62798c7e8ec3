use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be correlated with the exact
/// configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_CONFIG: &str = r#"
[crawler]

[pacing]
min-millis = 10
max-millis = 20

[retry]
max-rounds = 3

[output]
database-path = "./prices.db"

[[stores]]
kind = "html"
name = "Alpha Market"
landing-url = "https://alpha.example/"
categories-url = "https://alpha.example/categories/"
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_minimal_config() {
        let file = write_config(MINIMAL_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.stores.len(), 1);
        assert_eq!(config.stores[0].name(), "Alpha Market");
        assert_eq!(config.pacing.min_millis, 10);
        assert_eq!(config.retry.max_rounds, 3);
        // Defaults applied
        assert_eq!(config.crawler.max_workers, 8);
        assert_eq!(config.crawler.request_timeout_secs, 30);
    }

    #[test]
    fn test_api_store_config() {
        let content = r#"
[crawler]

[pacing]

[retry]

[output]
database-path = "./prices.db"

[[stores]]
kind = "api"
name = "Beta Foods"
landing-url = "https://beta.example"
navigation-url = "https://api.beta.example/nav"
search-url = "https://api.beta.example/search?category={category}&page={page}"
blocklist = ["New Products", "Offers"]
"#;
        let file = write_config(content);
        let config = load_config(file.path()).unwrap();

        match &config.stores[0] {
            crate::config::StoreConfig::Api(api) => {
                assert_eq!(api.page_size, 50);
                assert_eq!(api.blocklist.len(), 2);
            }
            other => panic!("expected api store, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_toml_fails() {
        let file = write_config("this is not toml [");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_config_hash_is_stable() {
        let file = write_config(MINIMAL_CONFIG);
        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_missing_file_fails() {
        let result = load_config(Path::new("/nonexistent/agora.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
