//! Zhihu platform
//!
//! Startup sequence:
//! 1. Acquire a proxy when the pool is enabled
//! 2. Launch the browser on the index page
//! 3. Probe the API with the browser's cookies; log in when the probe fails
//! 4. Visit a search page so the jar picks up search cookies
//! 5. Hand the final cookie snapshot to the API client and run the coordinator

mod client;
pub mod constants;
pub mod extractor;
mod links;
mod signer;

pub use client::{build_route, Endpoints, RetryPolicy, ZhihuClient};
pub use links::{classify_content_url, creator_url_token, question_id};
pub use signer::{SignedHeaders, Signer};

use crate::config::Config;
use crate::crawler::{ContentSource, Coordinator, CrawlSettings};
use crate::output::CrawlStatistics;
use crate::platform::Platform;
use crate::proxy::{ProxyEndpoint, ProxyPool, StaticProxyPool};
use crate::session::{Bootstrapper, BrowserSession, LoginSelectors, LoginSurface, Session};
use crate::storage::Sink;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use constants::*;
use std::sync::Arc;
use std::time::Duration;

/// Time given to the search page to settle its cookies
const WARMUP_DELAY: Duration = Duration::from_secs(5);

/// Zhihu crawl driven by one browser session and one signed API client
pub struct ZhihuPlatform {
    config: Config,
    sink: Arc<dyn Sink>,
    browser: Option<BrowserSession>,
}

impl ZhihuPlatform {
    pub fn new(config: Config, sink: Arc<dyn Sink>) -> Self {
        Self {
            config,
            sink,
            browser: None,
        }
    }

    /// Registry constructor
    pub fn boxed(config: Config, sink: Arc<dyn Sink>) -> Box<dyn Platform> {
        Box::new(Self::new(config, sink))
    }
}

/// Builds an API client from a cookie jar snapshot
fn client_from(session: &Session, config: &Config, proxy: Option<&ProxyEndpoint>) -> Result<ZhihuClient> {
    let endpoints = Endpoints {
        main: config.zhihu.main_base_url.clone(),
        zhuanlan: config.zhihu.zhuanlan_base_url.clone(),
    };
    ZhihuClient::new(
        session.snapshot(),
        Signer::new(config.zhihu.zst_81.clone()),
        endpoints,
        Duration::from_secs(config.crawler.request_timeout_secs),
        proxy,
    )
}

fn login_selectors() -> LoginSelectors {
    LoginSelectors {
        qr_code: QR_CODE_SELECTOR.to_string(),
        phone_input: PHONE_INPUT_SELECTOR.to_string(),
        send_code_button: SEND_CODE_SELECTOR.to_string(),
    }
}

#[async_trait]
impl Platform for ZhihuPlatform {
    async fn start(&mut self) -> Result<CrawlStatistics> {
        let config = &self.config;

        let proxy = if config.proxy.enabled {
            let endpoint = StaticProxyPool::from_config(&config.proxy).acquire().await?;
            tracing::info!(host = %endpoint.host, port = endpoint.port, "Using proxy");
            Some(endpoint)
        } else {
            None
        };
        let browser_proxy = proxy.as_ref().map(ProxyEndpoint::browser_proxy);

        let browser = BrowserSession::launch(
            &config.browser,
            browser_proxy.as_ref(),
            USER_AGENT,
            &format!("{}/", ZHIHU_URL),
        )
        .await?;
        let browser = &*self.browser.insert(browser);

        let mut client = client_from(&browser.cookies().await?, config, proxy.as_ref())?;
        if !client.pong().await {
            let bootstrapper = Bootstrapper::new(
                &config.login,
                &config.browser,
                LOGIN_URL,
                COOKIE_DOMAIN,
                AUTH_COOKIE,
                login_selectors(),
            );
            let session = bootstrapper.login(browser).await?;
            client = client_from(&session, config, proxy.as_ref())?;

            if !client.pong().await {
                return Err(HarvestError::Authentication(
                    "login completed but the session is not accepted".to_string(),
                ));
            }
        }

        tracing::info!("Warming up search cookies");
        browser
            .goto(&format!("{}{}", ZHIHU_URL, SEARCH_WARMUP_PATH))
            .await?;
        tokio::time::sleep(WARMUP_DELAY).await;
        let client = client_from(&browser.cookies().await?, config, proxy.as_ref())?;

        let source: Arc<dyn ContentSource> = Arc::new(client);
        let coordinator = Coordinator::new(
            source,
            self.sink.clone(),
            CrawlSettings::from_config(config),
        );
        coordinator.run().await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(browser) = self.browser.take() {
            browser.close().await?;
        }
        Ok(())
    }
}
