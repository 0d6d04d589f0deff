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
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Crawl mode: {}", config.crawler.mode);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Parses configuration text without validating it
///
/// CLI overrides are applied between parsing and validation.
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged once per run so stored records can be traced to the settings that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&content)))
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
    use crate::config::types::{CrawlMode, LoginMode};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
platform = "zhihu"

[crawler]
mode = "search"
keywords = ["python", "rust"]
max-items = 40
max-concurrency = 4

[login]
mode = "cookie"
cookies = "d_c0=abc; z_c0=xyz"

[zhihu]
zst-81 = "token"

[output]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.platform, "zhihu");
        assert_eq!(config.crawler.mode, CrawlMode::Search);
        assert_eq!(config.crawler.keywords, vec!["python", "rust"]);
        assert_eq!(config.crawler.max_items, 40);
        assert_eq!(config.crawler.max_concurrency, 4);
        assert_eq!(config.login.mode, LoginMode::Cookie);
        assert_eq!(config.zhihu.zst_81, "token");
    }

    #[test]
    fn test_defaults_are_applied() {
        let config_content = r#"
[crawler]
mode = "question"

[zhihu]
question-url = "https://www.zhihu.com/question/42"

[output]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.platform, "zhihu");
        assert_eq!(config.crawler.start_page, 1);
        assert_eq!(config.crawler.max_concurrency, 1);
        assert!(config.crawler.enable_comments);
        assert_eq!(config.crawler.crawl_interval_ms, 1000);
        assert_eq!(config.login.mode, LoginMode::QrCode);
        assert_eq!(config.login.timeout_secs, 120);
        assert!(config.browser.save_login_state);
        assert!(!config.proxy.enabled);
        assert_eq!(config.zhihu.creator_content, vec!["answer"]);
        assert_eq!(config.zhihu.main_base_url, "https://www.zhihu.com");
    }

    #[test]
    fn test_proxy_endpoints_table() {
        let config_content = r#"
[crawler]
mode = "search"
keywords = ["python"]

[proxy]
enabled = true
pool-size = 1

[[proxy.endpoints]]
host = "10.0.0.1"
port = 3128
username = "u"
password = "p"

[output]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.proxy.endpoints.len(), 1);
        assert_eq!(config.proxy.endpoints[0].protocol, "http");
        assert_eq!(config.proxy.endpoints[0].port, 3128);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvest.toml"));
        assert!(matches!(result.unwrap_err(), ConfigError::Io(_)));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_mode_is_parse_error() {
        let config_content = r#"
[crawler]
mode = "timeline"

[output]
database-path = "./test.db"
"#;
        let file = create_temp_config(config_content);
        assert!(matches!(
            load_config(file.path()).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
mode = "search"
keywords = ["python"]
max-concurrency = 0

[output]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
