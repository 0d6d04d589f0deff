//! Configuration module for Sumi-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling {} in {} mode", config.platform, config.crawler.mode);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    BrowserConfig, Config, CrawlMode, CrawlerConfig, LoginConfig, LoginMode, OutputConfig,
    ProxyConfig, ProxyEntry, ZhihuConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

/// Re-validates a configuration after CLI overrides were applied
pub use validation::validate as validate_config;
