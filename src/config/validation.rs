use crate::config::types::{
    Config, CrawlMode, CrawlerConfig, LoginConfig, LoginMode, OutputConfig, ProxyConfig,
    ZhihuConfig,
};
use crate::ConfigError;
use url::Url;

const CREATOR_CONTENT_KINDS: &[&str] = &["answer", "article", "video"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.platform.trim().is_empty() {
        return Err(ConfigError::Validation(
            "platform cannot be empty".to_string(),
        ));
    }

    validate_crawler_config(&config.crawler)?;
    validate_mode_inputs(&config.crawler, &config.zhihu)?;
    validate_login_config(&config.login)?;
    validate_proxy_config(&config.proxy)?;
    validate_zhihu_config(&config.zhihu)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and 100, got {}",
            config.max_concurrency
        )));
    }

    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start_page must be >= 1, got {}",
            config.start_page
        )));
    }

    if config.max_items < 1 {
        return Err(ConfigError::Validation(format!(
            "max_items must be >= 1, got {}",
            config.max_items
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Each crawl mode needs its own input list
fn validate_mode_inputs(crawler: &CrawlerConfig, zhihu: &ZhihuConfig) -> Result<(), ConfigError> {
    let missing = match crawler.mode {
        CrawlMode::Search => crawler
            .keywords
            .iter()
            .all(|k| k.trim().is_empty())
            .then_some("keywords"),
        CrawlMode::Detail => zhihu.specified_urls.is_empty().then_some("specified-urls"),
        CrawlMode::Creator => zhihu.creator_urls.is_empty().then_some("creator-urls"),
        CrawlMode::Question => zhihu
            .question_url
            .trim()
            .is_empty()
            .then_some("question-url"),
    };

    match missing {
        Some(field) => Err(ConfigError::Validation(format!(
            "{} mode requires a non-empty {}",
            crawler.mode, field
        ))),
        None => Ok(()),
    }
}

/// Validates login configuration
fn validate_login_config(config: &LoginConfig) -> Result<(), ConfigError> {
    if config.mode == LoginMode::Cookie && config.cookies.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cookie login requires a non-empty cookies string".to_string(),
        ));
    }

    if config.mode == LoginMode::Phone && config.phone.trim().is_empty() {
        return Err(ConfigError::Validation(
            "phone login requires a phone number".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "login timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.pool_size < 1 {
        return Err(ConfigError::Validation(format!(
            "proxy pool_size must be >= 1, got {}",
            config.pool_size
        )));
    }

    if config.endpoints.is_empty() {
        return Err(ConfigError::Validation(
            "proxy is enabled but no endpoints are configured".to_string(),
        ));
    }

    for endpoint in &config.endpoints {
        if endpoint.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "proxy endpoint host cannot be empty".to_string(),
            ));
        }

        if !matches!(
            endpoint.protocol.as_str(),
            "http" | "https" | "socks5" | "socks5h"
        ) {
            return Err(ConfigError::Validation(format!(
                "unsupported proxy protocol '{}'",
                endpoint.protocol
            )));
        }
    }

    Ok(())
}

/// Validates Zhihu-specific configuration
fn validate_zhihu_config(config: &ZhihuConfig) -> Result<(), ConfigError> {
    for base in [&config.main_base_url, &config.zhuanlan_base_url] {
        Url::parse(base)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base URL '{}': {}", base, e)))?;
    }

    for kind in &config.creator_content {
        if !CREATOR_CONTENT_KINDS.contains(&kind.as_str()) {
            return Err(ConfigError::Validation(format!(
                "creator-content entries must be one of {:?}, got '{}'",
                CREATOR_CONTENT_KINDS, kind
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
