//! Chromium-backed browsing context used for login and cookie capture

use crate::config::BrowserConfig as BrowserSettings;
use crate::proxy::BrowserProxy;
use crate::session::{LoginSurface, Session};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use chromiumoxide::auth::Credentials;
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Init script hiding the most common automation fingerprints
pub const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['zh-CN', 'zh', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
window.chrome = window.chrome || { runtime: {} };
const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
if (originalQuery) {
    window.navigator.permissions.query = (parameters) =>
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters);
}
"#;

fn browser_error(context: &str, e: impl Display) -> HarvestError {
    HarvestError::Browser(format!("{}: {}", context, e))
}

/// Credentials for an authenticated proxy, `None` when the username is empty
fn proxy_credentials(proxy: &BrowserProxy) -> Option<Credentials> {
    if proxy.username.is_empty() {
        return None;
    }
    Some(Credentials {
        username: proxy.username.clone(),
        password: proxy.password.clone(),
    })
}

/// A launched browser with one open page
pub struct BrowserSession {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Launches the browser and opens `start_url` with the stealth script installed
    ///
    /// # Arguments
    ///
    /// * `settings` - Headless flag and persistent profile directory
    /// * `proxy` - Optional egress proxy; credentials answer the proxy's auth challenge
    /// * `user_agent` - Desktop user agent applied to the page
    /// * `start_url` - First page to open (the platform index)
    pub async fn launch(
        settings: &BrowserSettings,
        proxy: Option<&BrowserProxy>,
        user_agent: &str,
        start_url: &str,
    ) -> Result<Self> {
        tracing::info!(headless = settings.headless, "Launching browser");

        let mut builder = BrowserConfig::builder()
            .window_size(1920, 1080)
            .request_timeout(Duration::from_secs(30))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");

        if !settings.headless {
            builder = builder.with_head();
        }

        if let Some(proxy) = proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy.server));
        }

        if settings.save_login_state {
            std::fs::create_dir_all(&settings.user_data_dir)?;
            builder = builder.user_data_dir(&settings.user_data_dir);
        }

        let config = builder
            .build()
            .map_err(|e| browser_error("invalid browser config", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| browser_error("failed to launch browser", e))?;

        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| browser_error("failed to open page", e))?;

        if let Some(credentials) = proxy.and_then(proxy_credentials) {
            page.authenticate(credentials)
                .await
                .map_err(|e| browser_error("failed to set proxy credentials", e))?;
        }

        page.set_user_agent(user_agent)
            .await
            .map_err(|e| browser_error("failed to set user agent", e))?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(|e| browser_error("failed to install stealth script", e))?;

        let session = Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler,
        };
        session.goto(start_url).await?;

        Ok(session)
    }

    /// Closes the browser and stops the event handler
    ///
    /// Safe to call more than once.
    pub async fn close(&self) -> Result<()> {
        if let Some(mut browser) = self.browser.lock().await.take() {
            browser
                .close()
                .await
                .map_err(|e| browser_error("failed to close browser", e))?;
            match browser.wait().await {
                Ok(status) => tracing::debug!(?status, "Browser process exited"),
                Err(e) => tracing::debug!(error = %e, "Failed to reap browser process"),
            }
            tracing::info!("Browser closed");
        }
        self.handler.abort();
        Ok(())
    }
}

#[async_trait]
impl LoginSurface for BrowserSession {
    async fn cookies(&self) -> Result<Session> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| browser_error("failed to read cookies", e))?;
        Ok(Session::from_pairs(
            cookies.into_iter().map(|c| (c.name, c.value)),
        ))
    }

    async fn inject_cookies(&self, session: &Session, domain: &str) -> Result<()> {
        for (name, value) in session.pairs() {
            let param = CookieParam::builder()
                .name(name)
                .value(value)
                .domain(domain)
                .path("/")
                .build()
                .map_err(|e| browser_error("invalid cookie", e))?;

            if let Err(e) = self.page.set_cookie(param).await {
                tracing::warn!(cookie = name, error = %e, "Failed to set cookie");
            }
        }
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| browser_error("navigation failed", e))?;
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.page
            .reload()
            .await
            .map_err(|e| browser_error("reload failed", e))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| browser_error(selector, e))?;
        element
            .click()
            .await
            .map_err(|e| browser_error(selector, e))?
            .type_str(text)
            .await
            .map_err(|e| browser_error(selector, e))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| browser_error(selector, e))?
            .click()
            .await
            .map_err(|e| browser_error(selector, e))?;
        Ok(())
    }

    async fn capture_element_png(&self, selector: &str) -> Result<Vec<u8>> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| browser_error(selector, e))?
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| browser_error(selector, e))
    }
}
