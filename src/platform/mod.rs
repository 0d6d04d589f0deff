//! Platform dispatch
//!
//! Each supported platform implements [`Platform`] and registers a constructor
//! under its key in [`PLATFORMS`].

pub mod zhihu;

use crate::config::Config;
use crate::output::CrawlStatistics;
use crate::storage::Sink;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// One crawlable platform
#[async_trait]
pub trait Platform: Send {
    /// Authenticates and runs the configured crawl mode to completion
    async fn start(&mut self) -> Result<CrawlStatistics>;

    /// Releases the browser; safe to call after a failed or cancelled start
    async fn close(&mut self) -> Result<()>;
}

/// Constructor registered for a platform key
pub type PlatformFactory = fn(Config, Arc<dyn Sink>) -> Box<dyn Platform>;

/// Supported platforms by key
pub static PLATFORMS: &[(&str, PlatformFactory)] =
    &[(zhihu::constants::PLATFORM_KEY, zhihu::ZhihuPlatform::boxed)];

/// Creates the platform named by `config.platform`
///
/// # Returns
///
/// * `Ok(Box<dyn Platform>)` - The platform, not yet started
/// * `Err(HarvestError::UnknownPlatform)` - No platform is registered under the key
pub fn create_platform(config: Config, sink: Arc<dyn Sink>) -> Result<Box<dyn Platform>> {
    let key = config.platform.clone();
    PLATFORMS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, factory)| factory(config, sink))
        .ok_or(HarvestError::UnknownPlatform(key))
}

/// Keys of every registered platform
pub fn supported_platforms() -> Vec<&'static str> {
    PLATFORMS.iter().map(|(name, _)| *name).collect()
}
