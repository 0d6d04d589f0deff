//! Signed API client
//!
//! This module issues every request the Zhihu crawl makes:
//! - Building the HTTP client with default headers, timeout and optional proxy
//! - Signing each route with the session fingerprint
//! - Classifying responses (403 ban, 404 empty, other failures)
//! - Retrying transient failures with a fixed delay
//! - Decoding JSON payloads and raw server-rendered pages

use crate::crawler::{ContentRef, ContentSource, CrawlContext};
use crate::model::{Comment, Content, ContentKind, Creator};
use crate::platform::zhihu::constants::*;
use crate::platform::zhihu::signer::Signer;
use crate::platform::zhihu::{extractor, links};
use crate::proxy::ProxyEndpoint;
use crate::session::SessionSnapshot;
use crate::state::{Cursor, Page};
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Base URLs requests are routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub main: String,
    pub zhuanlan: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            main: ZHIHU_URL.to_string(),
            zhuanlan: ZHIHU_ZHUANLAN_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Article routes (`/p/...`) live on the column host
    pub fn base_for(&self, path: &str) -> &str {
        let base = if path.contains("/p/") {
            &self.zhuanlan
        } else {
            &self.main
        };
        base.trim_end_matches('/')
    }
}

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

/// Outcome of one HTTP exchange before decoding
#[derive(Debug)]
enum FetchOutcome {
    /// 200 with its body
    Body(String),

    /// 404: treated as an empty result
    NotFound,
}

/// Result offset of a 1-based search page
fn search_offset(page: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(SEARCH_PAGE_SIZE)
}

/// Appends `params` to `path` as an encoded query string
pub fn build_route(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{}?{}", path, query)
}

/// Signed Zhihu API client
///
/// Holds an immutable session snapshot; re-authentication builds a new client.
#[derive(Debug, Clone)]
pub struct ZhihuClient {
    http: Client,
    snapshot: SessionSnapshot,
    signer: Signer,
    endpoints: Endpoints,
    retry: RetryPolicy,
}

impl ZhihuClient {
    /// Creates a client from a captured session
    ///
    /// # Arguments
    ///
    /// * `snapshot` - Cookie state captured from the browser
    /// * `signer` - Request signer (carries the static `x-zst-81` token)
    /// * `endpoints` - Main and article base URLs
    /// * `timeout` - Per-request timeout
    /// * `proxy` - Optional egress proxy
    pub fn new(
        snapshot: SessionSnapshot,
        signer: Signer,
        endpoints: Endpoints,
        timeout: Duration,
        proxy: Option<&ProxyEndpoint>,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true);

        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        Ok(Self {
            http: builder.build()?,
            snapshot,
            signer,
            endpoints,
            retry: RetryPolicy::default(),
        })
    }

    /// Replaces the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn snapshot(&self) -> &SessionSnapshot {
        &self.snapshot
    }

    /// Default headers plus the signature for `route`
    fn headers_for(&self, route: &str) -> Result<HeaderMap> {
        let signed = self.signer.sign(route, &self.snapshot)?;

        let mut headers = HeaderMap::new();
        let mut insert = |name: &'static str, value: &str| -> Result<()> {
            let value = HeaderValue::from_str(value)
                .map_err(|e| HarvestError::Signing(format!("invalid {} header: {}", name, e)))?;
            headers.insert(HeaderName::from_static(name), value);
            Ok(())
        };

        insert("accept", "*/*")?;
        insert("accept-language", "zh-CN,zh;q=0.9")?;
        insert("cookie", &self.snapshot.cookie_header)?;
        insert("priority", "u=1, i")?;
        insert("referer", &format!("{}/", ZHIHU_URL))?;
        insert("user-agent", USER_AGENT)?;
        insert("x-api-version", API_VERSION)?;
        insert("x-app-za", "OS=Web")?;
        insert("x-requested-with", "fetch")?;
        insert("x-zse-93", ZSE_93)?;
        insert("x-zse-96", &signed.x_zse_96)?;
        if !signed.x_zst_81.is_empty() {
            insert("x-zst-81", &signed.x_zst_81)?;
        }

        Ok(headers)
    }

    /// Issues one signed GET and classifies the response
    async fn fetch_once(&self, route: &str) -> Result<FetchOutcome> {
        let headers = self.headers_for(route)?;
        let url = format!("{}{}", self.endpoints.base_for(route), route);

        let response = self
            .http
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| HarvestError::DataFetch(format!("request to {} failed: {}", route, e)))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| HarvestError::DataFetch(format!("reading {} failed: {}", route, e)))?;

        tracing::debug!(
            route,
            status = status.as_u16(),
            content_type = %content_type,
            size = body.len(),
            "Response received"
        );

        match status {
            StatusCode::OK => Ok(FetchOutcome::Body(body)),
            StatusCode::NOT_FOUND => {
                tracing::debug!(route, "Not found, treating as empty");
                Ok(FetchOutcome::NotFound)
            }
            StatusCode::FORBIDDEN => {
                tracing::error!(route, "Forbidden by remote service");
                Err(HarvestError::Forbidden(body))
            }
            _ => {
                tracing::error!(route, status = status.as_u16(), "Request failed");
                Err(HarvestError::DataFetch(format!(
                    "HTTP {} for {}: {}",
                    status.as_u16(),
                    route,
                    body
                )))
            }
        }
    }

    /// Runs `op` under the retry policy; only retryable errors are retried
    async fn retrying<T, F, Fut>(&self, route: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(route, attempt, error = %e, "Retrying request");
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Signed GET decoded as JSON
    ///
    /// A 404 yields an empty object. A body carrying an `error` field is a
    /// `DataFetch` error with the embedded message.
    pub async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let route = build_route(path, params);
        let route = route.as_str();
        self.retrying(route, move || async move {
            match self.fetch_once(route).await? {
                FetchOutcome::NotFound => Ok(Value::Object(serde_json::Map::new())),
                FetchOutcome::Body(body) => decode_json(route, &body),
            }
        })
        .await
    }

    /// Signed GET returning the raw body (server-rendered pages)
    ///
    /// A 404 yields an empty string.
    pub async fn get_text(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let route = build_route(path, params);
        let route = route.as_str();
        let body = self
            .retrying(route, move || async move {
                match self.fetch_once(route).await? {
                    FetchOutcome::NotFound => Ok(String::new()),
                    FetchOutcome::Body(body) => Ok(body),
                }
            })
            .await?;

        if body.contains(CAPTCHA_MARKER) {
            tracing::warn!(route, "Captcha page detected");
        }
        Ok(body)
    }

    /// Checks whether the session is logged in
    ///
    /// Any failure counts as "not logged in".
    pub async fn pong(&self) -> bool {
        tracing::info!("Checking login state");
        match self
            .get_json("/api/v4/me", &[("include", ME_INCLUDE.to_string())])
            .await
        {
            Ok(me) => {
                let uid = me
                    .get("uid")
                    .is_some_and(|v| !v.is_null() && v.as_str() != Some(""));
                let name = me
                    .get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| !n.is_empty());
                if uid && name {
                    tracing::info!("Login state is valid");
                    true
                } else {
                    tracing::warn!("Login probe returned no user");
                    false
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login probe failed");
                false
            }
        }
    }

    /// One page of keyword search results
    pub async fn search_page(&self, keyword: &str, page: u32) -> Result<Page<Content>> {
        let offset = search_offset(page).to_string();
        let params = [
            ("gk_version", "gz-gaokao".to_string()),
            ("t", "general".to_string()),
            ("q", keyword.to_string()),
            ("correction", "1".to_string()),
            ("offset", offset.clone()),
            ("limit", SEARCH_PAGE_SIZE.to_string()),
            ("filter_fields", String::new()),
            ("lc_idx", offset),
            ("show_all_topics", "0".to_string()),
            ("search_source", "Filter".to_string()),
            ("time_interval", String::new()),
            ("sort", String::new()),
            ("vertical", String::new()),
        ];
        let json = self.get_json("/api/v4/search_v3", &params).await?;
        Ok(extractor::extract_search_page(&json, keyword, page))
    }

    pub async fn root_comment_page(&self, content: &Content, cursor: &Cursor) -> Result<Page<Comment>> {
        let path = format!(
            "/api/v4/comment_v5/{}s/{}/root_comment",
            content.content_type.as_str(),
            content.content_id
        );
        let params = [
            ("order", "score".to_string()),
            ("offset", cursor.next.clone()),
            ("limit", COMMENT_PAGE_SIZE.to_string()),
        ];
        let json = self.get_json(&path, &params).await?;
        Ok(extractor::extract_comment_page(&json, content, None))
    }

    pub async fn child_comment_page(
        &self,
        content: &Content,
        root: &Comment,
        cursor: &Cursor,
    ) -> Result<Page<Comment>> {
        let path = format!("/api/v4/comment_v5/comment/{}/child_comment", root.comment_id);
        let params = [
            ("order", "sort".to_string()),
            ("offset", cursor.next.clone()),
            ("limit", COMMENT_PAGE_SIZE.to_string()),
        ];
        let json = self.get_json(&path, &params).await?;
        Ok(extractor::extract_comment_page(&json, content, Some(root)))
    }

    pub async fn creator_info(&self, url_token: &str) -> Result<Option<Creator>> {
        let html = self.get_text(&format!("/people/{}", url_token), &[]).await?;
        Ok(extractor::extract_creator_from_html(&html, url_token))
    }

    /// One page of a creator's answers, articles or videos
    pub async fn creator_content_page(
        &self,
        url_token: &str,
        kind: ContentKind,
        offset: u64,
    ) -> Result<Page<Content>> {
        let (path, mut params) = match kind {
            ContentKind::Answer => (
                format!("/api/v4/members/{}/answers", url_token),
                vec![("include", CREATOR_ANSWERS_INCLUDE.to_string())],
            ),
            ContentKind::Article => (
                format!("/api/v4/members/{}/articles", url_token),
                vec![("include", CREATOR_ARTICLES_INCLUDE.to_string())],
            ),
            ContentKind::Video => (
                format!("/api/v4/members/{}/zvideos", url_token),
                vec![("include", CREATOR_VIDEOS_INCLUDE.to_string())],
            ),
        };
        params.push(("offset", offset.to_string()));
        params.push(("limit", CREATOR_PAGE_SIZE.to_string()));
        match kind {
            ContentKind::Video => params.push(("similar_aggregation", "true".to_string())),
            _ => params.push(("order_by", "created".to_string())),
        }

        let json = self.get_json(&path, &params).await?;
        Ok(extractor::extract_creator_page(&json, kind, offset, CREATOR_PAGE_SIZE))
    }

    pub async fn answer_info(&self, question_id: &str, answer_id: &str) -> Result<Option<Content>> {
        let html = self
            .get_text(&format!("/question/{}/answer/{}", question_id, answer_id), &[])
            .await?;
        Ok(extractor::extract_answer_from_html(&html, answer_id))
    }

    pub async fn article_info(&self, article_id: &str) -> Result<Option<Content>> {
        let html = self.get_text(&format!("/p/{}", article_id), &[]).await?;
        Ok(extractor::extract_article_from_html(&html, article_id))
    }

    pub async fn video_info(&self, video_id: &str) -> Result<Option<Content>> {
        let html = self.get_text(&format!("/zvideo/{}", video_id), &[]).await?;
        Ok(extractor::extract_video_from_html(&html, video_id))
    }

    /// First page of a question's answers
    pub async fn question_answer_refs(&self, question_id: &str) -> Result<Vec<ContentRef>> {
        let params = [
            ("include", QUESTION_ANSWERS_INCLUDE.to_string()),
            ("offset", "0".to_string()),
            ("limit", QUESTION_PAGE_SIZE.to_string()),
            ("order_by", "created".to_string()),
        ];
        let json = self
            .get_json(&format!("/api/v4/questions/{}/answers", question_id), &params)
            .await?;
        Ok(extractor::extract_question_answer_refs(&json, question_id))
    }
}

/// Decodes a JSON body, surfacing embedded application errors
fn decode_json(route: &str, body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        if body.trim_start().starts_with("<!DOCTYPE html>") || body.contains(CAPTCHA_MARKER) {
            tracing::warn!(route, "Received an HTML page instead of an API response");
        }
        HarvestError::DataFetch(format!("undecodable response for {}: {}", route, e))
    })?;

    match value.get("error") {
        Some(error) if !error.is_null() && error != &Value::Bool(false) => {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            tracing::error!(route, message = %message, "API returned an error");
            Err(HarvestError::DataFetch(message))
        }
        _ => Ok(value),
    }
}

#[async_trait]
impl ContentSource for ZhihuClient {
    async fn search(&self, ctx: &CrawlContext, page: u32) -> Result<Page<Content>> {
        self.search_page(&ctx.source_keyword, page).await
    }

    fn classify_url(&self, url: &str) -> Option<ContentRef> {
        links::classify_content_url(url)
    }

    async fn content_detail(
        &self,
        ctx: &CrawlContext,
        target: &ContentRef,
    ) -> Result<Option<Content>> {
        let content = match target {
            ContentRef::Answer {
                question_id,
                answer_id,
            } => self.answer_info(question_id, answer_id).await?,
            ContentRef::Article { id } => self.article_info(id).await?,
            ContentRef::Video { id } => self.video_info(id).await?,
        };
        Ok(content.map(|mut c| {
            c.source_keyword = ctx.source_keyword.clone();
            c
        }))
    }

    fn creator_url_token(&self, url: &str) -> Option<String> {
        links::creator_url_token(url)
    }

    async fn creator_profile(&self, url_token: &str) -> Result<Option<Creator>> {
        self.creator_info(url_token).await
    }

    async fn creator_contents(
        &self,
        url_token: &str,
        kind: ContentKind,
        cursor: &Cursor,
    ) -> Result<Page<Content>> {
        self.creator_content_page(url_token, kind, cursor.offset())
            .await
    }

    fn question_id(&self, url: &str) -> Option<String> {
        links::question_id(url)
    }

    async fn question_answers(&self, question_id: &str) -> Result<Vec<ContentRef>> {
        self.question_answer_refs(question_id).await
    }

    async fn root_comments(&self, content: &Content, cursor: &Cursor) -> Result<Page<Comment>> {
        self.root_comment_page(content, cursor).await
    }

    async fn child_comments(
        &self,
        content: &Content,
        root: &Comment,
        cursor: &Cursor,
    ) -> Result<Page<Comment>> {
        self.child_comment_page(content, root, cursor).await
    }
}
