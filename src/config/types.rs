use serde::Deserialize;
use std::fmt;

/// Main configuration structure for Sumi-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Platform registry key (e.g. "zhihu")
    #[serde(default = "default_platform")]
    pub platform: String,
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub login: LoginConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub zhihu: ZhihuConfig,
    pub output: OutputConfig,
}

/// Which crawl the orchestrator runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    Search,
    Detail,
    Creator,
    Question,
}

impl CrawlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Detail => "detail",
            Self::Creator => "creator",
            Self::Question => "question",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "search" => Some(Self::Search),
            "detail" => Some(Self::Detail),
            "creator" => Some(Self::Creator),
            "question" => Some(Self::Question),
            _ => None,
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the session bootstrapper authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginMode {
    #[default]
    QrCode,
    Phone,
    Cookie,
}

impl LoginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QrCode => "qrcode",
            Self::Phone => "phone",
            Self::Cookie => "cookie",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "qrcode" => Some(Self::QrCode),
            "phone" => Some(Self::Phone),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Crawl mode for this run
    pub mode: CrawlMode,

    /// Search keywords (search mode)
    #[serde(default)]
    pub keywords: Vec<String>,

    /// First search result page to fetch
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Maximum number of items per keyword
    #[serde(rename = "max-items", default = "default_max_items")]
    pub max_items: u32,

    /// Maximum number of simultaneous comment-tree traversals
    #[serde(rename = "max-concurrency", default = "default_max_concurrency")]
    pub max_concurrency: u32,

    /// Whether comment trees are crawled at all
    #[serde(rename = "enable-comments", default = "default_true")]
    pub enable_comments: bool,

    /// Whether child comments are expanded under each root comment
    #[serde(rename = "enable-sub-comments", default = "default_true")]
    pub enable_sub_comments: bool,

    /// Delay between consecutive pagination calls (milliseconds)
    #[serde(rename = "crawl-interval-ms", default = "default_crawl_interval_ms")]
    pub crawl_interval_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Login configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoginConfig {
    #[serde(default)]
    pub mode: LoginMode,

    /// Raw cookie header string used in cookie mode
    #[serde(default)]
    pub cookies: String,

    /// Phone number used in phone mode
    #[serde(default)]
    pub phone: String,

    /// How long to wait for login confirmation (seconds)
    #[serde(rename = "timeout-secs", default = "default_login_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            mode: LoginMode::default(),
            cookies: String::new(),
            phone: String::new(),
            timeout_secs: default_login_timeout_secs(),
        }
    }
}

/// Browser launch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub headless: bool,

    /// Keep the browser profile on disk so later runs skip interactive login
    #[serde(rename = "save-login-state", default = "default_true")]
    pub save_login_state: bool,

    /// Profile directory used when `save_login_state` is on
    #[serde(rename = "user-data-dir", default = "default_user_data_dir")]
    pub user_data_dir: String,

    /// Where the login QR code image is written
    #[serde(rename = "qr-code-path", default = "default_qr_code_path")]
    pub qr_code_path: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            save_login_state: true,
            user_data_dir: default_user_data_dir(),
            qr_code_path: default_qr_code_path(),
        }
    }
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Number of endpoints the pool draws from
    #[serde(rename = "pool-size", default = "default_pool_size")]
    pub pool_size: u32,

    #[serde(default)]
    pub endpoints: Vec<ProxyEntry>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            pool_size: default_pool_size(),
            endpoints: Vec::new(),
        }
    }
}

/// One proxy endpoint as written in the config file
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyEntry {
    #[serde(default = "default_proxy_protocol")]
    pub protocol: String,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Zhihu-specific configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ZhihuConfig {
    /// Answer, article or video URLs (detail mode)
    #[serde(rename = "specified-urls", default)]
    pub specified_urls: Vec<String>,

    /// Creator profile URLs (creator mode)
    #[serde(rename = "creator-urls", default)]
    pub creator_urls: Vec<String>,

    /// Question URL or bare question id (question mode)
    #[serde(rename = "question-url", default)]
    pub question_url: String,

    /// Authored content kinds crawled per creator: "answer", "article", "video"
    #[serde(rename = "creator-content", default = "default_creator_content")]
    pub creator_content: Vec<String>,

    #[serde(rename = "main-base-url", default = "default_main_base_url")]
    pub main_base_url: String,

    #[serde(rename = "zhuanlan-base-url", default = "default_zhuanlan_base_url")]
    pub zhuanlan_base_url: String,

    /// Static x-zst-81 token sent alongside the computed signature
    #[serde(rename = "zst-81", default)]
    pub zst_81: String,
}

impl Default for ZhihuConfig {
    fn default() -> Self {
        Self {
            specified_urls: Vec::new(),
            creator_urls: Vec::new(),
            question_url: String::new(),
            creator_content: default_creator_content(),
            main_base_url: default_main_base_url(),
            zhuanlan_base_url: default_zhuanlan_base_url(),
            zst_81: String::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_platform() -> String {
    "zhihu".to_string()
}

fn default_start_page() -> u32 {
    1
}

fn default_max_items() -> u32 {
    200
}

fn default_max_concurrency() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_crawl_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_login_timeout_secs() -> u64 {
    120
}

fn default_user_data_dir() -> String {
    "browser_data/zhihu_user_data_dir".to_string()
}

fn default_qr_code_path() -> String {
    "zhihu_login_qrcode.png".to_string()
}

fn default_pool_size() -> u32 {
    2
}

fn default_proxy_protocol() -> String {
    "http".to_string()
}

fn default_creator_content() -> Vec<String> {
    vec!["answer".to_string()]
}

fn default_main_base_url() -> String {
    "https://www.zhihu.com".to_string()
}

fn default_zhuanlan_base_url() -> String {
    "https://zhuanlan.zhihu.com".to_string()
}
