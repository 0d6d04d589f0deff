//! Login flows driven against a browsing surface
//!
//! The bootstrapper only needs a handful of page operations, captured by
//! [`LoginSurface`]. The chromiumoxide-backed [`BrowserSession`](super::BrowserSession)
//! implements it for real runs.

use crate::config::{BrowserConfig, LoginConfig, LoginMode};
use crate::session::Session;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Page operations the login flows rely on
#[async_trait]
pub trait LoginSurface: Send + Sync {
    /// Current cookie jar of the browsing context
    async fn cookies(&self) -> Result<Session>;

    /// Sets every cookie of `session` on `domain`
    async fn inject_cookies(&self, session: &Session, domain: &str) -> Result<()>;

    async fn goto(&self, url: &str) -> Result<()>;

    async fn reload(&self) -> Result<()>;

    /// Types `text` into the element matching `selector`
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    async fn click(&self, selector: &str) -> Result<()>;

    /// PNG screenshot of the element matching `selector`
    async fn capture_element_png(&self, selector: &str) -> Result<Vec<u8>>;
}

/// CSS selectors of the platform's sign-in page
#[derive(Debug, Clone)]
pub struct LoginSelectors {
    pub qr_code: String,
    pub phone_input: String,
    pub send_code_button: String,
}

/// Drives one login method until the auth cookie shows up
#[derive(Debug, Clone)]
pub struct Bootstrapper {
    mode: LoginMode,
    raw_cookies: String,
    phone: String,
    qr_code_path: PathBuf,
    timeout: Duration,
    poll_interval: Duration,
    login_url: String,
    cookie_domain: String,
    auth_cookie: String,
    selectors: LoginSelectors,
}

impl Bootstrapper {
    /// Creates a bootstrapper from the login and browser settings
    ///
    /// # Arguments
    ///
    /// * `login` - Login mode, raw cookies, phone number and timeout
    /// * `browser` - Supplies the QR code output path
    /// * `login_url` - Sign-in page of the platform
    /// * `cookie_domain` - Domain injected cookies are scoped to
    /// * `auth_cookie` - Cookie whose presence confirms a logged-in session
    /// * `selectors` - Sign-in page selectors
    pub fn new(
        login: &LoginConfig,
        browser: &BrowserConfig,
        login_url: impl Into<String>,
        cookie_domain: impl Into<String>,
        auth_cookie: impl Into<String>,
        selectors: LoginSelectors,
    ) -> Self {
        Self {
            mode: login.mode,
            raw_cookies: login.cookies.clone(),
            phone: login.phone.clone(),
            qr_code_path: PathBuf::from(&browser.qr_code_path),
            timeout: Duration::from_secs(login.timeout_secs),
            poll_interval: Duration::from_secs(1),
            login_url: login_url.into(),
            cookie_domain: cookie_domain.into(),
            auth_cookie: auth_cookie.into(),
            selectors,
        }
    }

    /// Overrides the confirmation timeout and polling interval
    pub fn with_timing(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    /// Runs the configured login method and returns the confirmed cookie state
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - Cookies captured after the auth cookie appeared
    /// * `Err(HarvestError::Authentication)` - Login not confirmed within the timeout
    pub async fn login(&self, surface: &dyn LoginSurface) -> Result<Session> {
        tracing::info!(mode = %self.mode, "Starting login");

        match self.mode {
            LoginMode::QrCode => self.login_by_qrcode(surface).await?,
            LoginMode::Phone => self.login_by_phone(surface).await?,
            LoginMode::Cookie => self.login_by_cookies(surface).await?,
        }

        let session = self.wait_for_login(surface).await?;
        tracing::info!(cookies = session.len(), "Login confirmed");
        Ok(session)
    }

    async fn login_by_qrcode(&self, surface: &dyn LoginSurface) -> Result<()> {
        surface.goto(&self.login_url).await?;
        let png = surface.capture_element_png(&self.selectors.qr_code).await?;

        if let Some(parent) = self.qr_code_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.qr_code_path, &png).await?;

        tracing::info!(
            path = %self.qr_code_path.display(),
            "QR code saved, scan it with the mobile app to log in"
        );
        Ok(())
    }

    async fn login_by_phone(&self, surface: &dyn LoginSurface) -> Result<()> {
        surface.goto(&self.login_url).await?;
        surface
            .fill(&self.selectors.phone_input, &self.phone)
            .await?;
        surface.click(&self.selectors.send_code_button).await?;

        tracing::info!("Verification code requested, finish the login in the browser window");
        Ok(())
    }

    async fn login_by_cookies(&self, surface: &dyn LoginSurface) -> Result<()> {
        let session = Session::parse(&self.raw_cookies);
        if session.is_empty() {
            return Err(HarvestError::Authentication(
                "cookie login requires at least one name=value pair".to_string(),
            ));
        }

        surface.inject_cookies(&session, &self.cookie_domain).await?;
        surface.reload().await?;
        tracing::debug!(cookies = session.len(), "Injected cookies");
        Ok(())
    }

    /// Polls the cookie jar until the auth cookie carries a value
    async fn wait_for_login(&self, surface: &dyn LoginSurface) -> Result<Session> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let session = surface.cookies().await?;
            if session
                .get(&self.auth_cookie)
                .is_some_and(|value| !value.is_empty())
            {
                return Ok(session);
            }

            if Instant::now() >= deadline {
                return Err(HarvestError::Authentication(format!(
                    "{} cookie not present after {}s",
                    self.auth_cookie,
                    self.timeout.as_secs()
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
