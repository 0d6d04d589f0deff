//! Sumi-Harvest: a signed-API crawler for social media platforms
//!
//! This crate bootstraps an authenticated browser session, hands its cookies to a
//! signing HTTP client, and drives search, detail, creator and question crawls
//! (with nested comment trees) into a record sink.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod platform;
pub mod proxy;
pub mod session;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Sumi-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Login was never confirmed, or the post-login probe failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The session carries no signing fingerprint
    #[error("Cannot sign request: {0}")]
    Signing(String),

    /// HTTP 403, treated as a ban signal
    #[error("Forbidden by remote service: {0}")]
    Forbidden(String),

    /// Non-200 response, undecodable body, embedded application error or transport failure
    #[error("Data fetch failed: {0}")]
    DataFetch(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Proxy error: {0}")]
    Proxy(String),

    #[error("Unknown platform '{0}'")]
    UnknownPlatform(String),

    #[error("Sink error: {0}")]
    Sink(#[from] storage::SinkError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if the API client may retry the call that produced this error
    ///
    /// Bans (403) and signing failures are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DataFetch(_))
    }

    /// Returns true if the error only aborts the current pagination loop
    ///
    /// Everything else terminates the whole run.
    pub fn is_loop_local(&self) -> bool {
        matches!(self, Self::DataFetch(_))
    }
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

/// Result type alias for Sumi-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlContext};
pub use model::{Comment, Content, ContentKind, Creator};
pub use state::{Cursor, Page, PaginationState};
