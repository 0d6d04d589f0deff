//! Crawler coordinator - crawl mode orchestration
//!
//! This module sequences the four crawl modes:
//! - search: page keyword results forward from the start page
//! - detail: fetch explicitly listed content items
//! - creator: fetch profiles and page each creator's authored content
//! - question: fetch one question's answer listing and each answer's detail
//!
//! Every record goes to the sink as soon as its page is extracted. Comment
//! trees are walked afterwards, concurrently across items.

use crate::config::{Config, CrawlMode};
use crate::crawler::comments::CommentWalker;
use crate::crawler::{ContentRef, ContentSource, CrawlContext};
use crate::model::{Content, ContentKind};
use crate::output::{CrawlCounters, CrawlStatistics};
use crate::state::PaginationState;
use crate::storage::Sink;
use crate::Result;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Run parameters resolved from the configuration
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub mode: CrawlMode,
    pub keywords: Vec<String>,
    pub start_page: u32,
    pub max_items: u32,
    pub max_concurrency: usize,
    pub enable_comments: bool,
    pub enable_sub_comments: bool,
    pub interval: Duration,
    pub specified_urls: Vec<String>,
    pub creator_urls: Vec<String>,
    pub question_url: String,
    pub creator_kinds: Vec<ContentKind>,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        let crawler = &config.crawler;
        let creator_kinds = config
            .zhihu
            .creator_content
            .iter()
            .filter_map(|kind| ContentKind::parse(kind))
            .collect();

        Self {
            mode: crawler.mode,
            keywords: crawler.keywords.clone(),
            start_page: crawler.start_page.max(1),
            max_items: crawler.max_items,
            max_concurrency: crawler.max_concurrency.max(1) as usize,
            enable_comments: crawler.enable_comments,
            enable_sub_comments: crawler.enable_sub_comments,
            interval: Duration::from_millis(crawler.crawl_interval_ms),
            specified_urls: config.zhihu.specified_urls.clone(),
            creator_urls: config.zhihu.creator_urls.clone(),
            question_url: config.zhihu.question_url.clone(),
            creator_kinds,
        }
    }
}

/// Main crawl orchestrator
pub struct Coordinator {
    source: Arc<dyn ContentSource>,
    sink: Arc<dyn Sink>,
    settings: CrawlSettings,
    counters: Arc<CrawlCounters>,
    walker: CommentWalker,
}

impl Coordinator {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `source` - Authenticated platform client
    /// * `sink` - Destination of every record
    /// * `settings` - Resolved run parameters
    pub fn new(source: Arc<dyn ContentSource>, sink: Arc<dyn Sink>, settings: CrawlSettings) -> Self {
        let counters = Arc::new(CrawlCounters::new());
        let semaphore = Arc::new(Semaphore::new(settings.max_concurrency.max(1)));
        let walker = CommentWalker::new(
            source.clone(),
            sink.clone(),
            semaphore,
            counters.clone(),
            settings.interval,
            settings.enable_sub_comments,
        );

        Self {
            source,
            sink,
            settings,
            counters,
            walker,
        }
    }

    /// Runs the configured crawl mode to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - What reached the sink
    /// * `Err(HarvestError)` - A fatal error (ban, signing, sink) ended the run
    pub async fn run(&self) -> Result<CrawlStatistics> {
        tracing::info!(mode = %self.settings.mode, "Starting crawl");

        match self.settings.mode {
            CrawlMode::Search => self.search().await?,
            CrawlMode::Detail => self.detail().await?,
            CrawlMode::Creator => self.creators().await?,
            CrawlMode::Question => self.question().await?,
        }

        Ok(self.counters.snapshot())
    }

    /// Current counters, also valid while a run is in flight
    pub fn statistics(&self) -> CrawlStatistics {
        self.counters.snapshot()
    }

    // ===== Search =====

    async fn search(&self) -> Result<()> {
        for keyword in &self.settings.keywords {
            let ctx = CrawlContext::for_keyword(keyword.clone());
            if let Err(e) = self.search_keyword(&ctx).await {
                if !e.is_loop_local() {
                    return Err(e);
                }
                tracing::error!(keyword = %keyword, error = %e, "Search aborted for keyword");
            }
        }
        Ok(())
    }

    async fn search_keyword(&self, ctx: &CrawlContext) -> Result<()> {
        let max_items = self.settings.max_items as usize;
        let mut page_number = self.settings.start_page;
        let mut state = PaginationState::start();
        let mut collected = 0usize;

        tracing::info!(keyword = %ctx.source_keyword, "Searching");

        while !state.is_end() && collected < max_items {
            let mut page = self.source.search(ctx, page_number).await?;
            state.advance(&page);

            if page.items.is_empty() {
                tracing::info!(keyword = %ctx.source_keyword, page = page_number, "No more results");
                break;
            }

            page.items.truncate(max_items - collected);
            collected += page.items.len();

            tracing::info!(
                keyword = %ctx.source_keyword,
                page = page_number,
                count = page.items.len(),
                total = collected,
                "Search page fetched"
            );

            self.store_contents(&page.items)?;
            if self.settings.enable_comments {
                self.walker.walk_all(&page.items).await?;
            }

            page_number += 1;
            if !state.is_end() && collected < max_items {
                tokio::time::sleep(self.settings.interval).await;
            }
        }

        Ok(())
    }

    // ===== Detail =====

    async fn detail(&self) -> Result<()> {
        let ctx = CrawlContext::new(CrawlMode::Detail);
        let mut targets = Vec::new();

        for raw in &self.settings.specified_urls {
            let url = raw.split('?').next().unwrap_or(raw);
            match self.source.classify_url(url) {
                Some(target) => targets.push(target),
                None => {
                    tracing::warn!(url = %raw, "Unrecognized content URL, skipping");
                    self.counters.add_skipped();
                }
            }
        }

        let fetched = self.fetch_details(&ctx, &targets).await?;
        self.store_contents(&fetched)?;

        if self.settings.enable_comments {
            self.walker.walk_all(&fetched).await?;
        }
        Ok(())
    }

    /// Fetches detail pages in order, at most `max_concurrency` in flight
    ///
    /// Loop-local failures and empty pages are logged and skipped.
    async fn fetch_details(&self, ctx: &CrawlContext, targets: &[ContentRef]) -> Result<Vec<Content>> {
        let pending: Vec<_> = targets
            .iter()
            .map(|target| self.fetch_one(ctx, target))
            .collect();
        let results: Vec<Result<Option<Content>>> = stream::iter(pending)
            .buffered(self.settings.max_concurrency)
            .collect()
            .await;

        let mut contents = Vec::with_capacity(results.len());
        for (target, result) in targets.iter().zip(results) {
            match result {
                Ok(Some(content)) => contents.push(content),
                Ok(None) => {
                    tracing::warn!(target = %target, "Detail page held no record");
                    self.counters.add_skipped();
                }
                Err(e) if e.is_loop_local() => {
                    tracing::error!(target = %target, error = %e, "Detail fetch failed, skipping");
                    self.counters.add_skipped();
                }
                Err(e) => return Err(e),
            }
        }
        Ok(contents)
    }

    async fn fetch_one(&self, ctx: &CrawlContext, target: &ContentRef) -> Result<Option<Content>> {
        self.source.content_detail(ctx, target).await
    }

    // ===== Creator =====

    async fn creators(&self) -> Result<()> {
        let mut authored = Vec::new();

        for url in &self.settings.creator_urls {
            let Some(url_token) = self.source.creator_url_token(url) else {
                tracing::warn!(url = %url, "Unrecognized creator URL, skipping");
                self.counters.add_skipped();
                continue;
            };

            match self.crawl_creator(&url_token).await {
                Ok(contents) => authored.extend(contents),
                Err(e) if e.is_loop_local() => {
                    tracing::error!(creator = %url_token, error = %e, "Creator crawl aborted");
                }
                Err(e) => return Err(e),
            }
        }

        if self.settings.enable_comments {
            self.walker.walk_all(&authored).await?;
        }
        Ok(())
    }

    async fn crawl_creator(&self, url_token: &str) -> Result<Vec<Content>> {
        let Some(creator) = self.source.creator_profile(url_token).await? else {
            tracing::warn!(creator = %url_token, "Creator profile not found");
            self.counters.add_skipped();
            return Ok(Vec::new());
        };

        self.sink.upsert_creator(&creator)?;
        self.counters.add_creator();
        tracing::info!(creator = %url_token, nickname = %creator.nickname, "Creator stored");

        let mut authored = Vec::new();
        for &kind in &self.settings.creator_kinds {
            match self.crawl_creator_kind(url_token, kind, &mut authored).await {
                Ok(()) => {}
                Err(e) if e.is_loop_local() => {
                    tracing::error!(creator = %url_token, kind = %kind, error = %e, "Listing aborted");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(authored)
    }

    /// Pages one kind of a creator's content until end-of-list, storing every page
    async fn crawl_creator_kind(
        &self,
        url_token: &str,
        kind: ContentKind,
        authored: &mut Vec<Content>,
    ) -> Result<()> {
        let mut state = PaginationState::start();

        while let Some(cursor) = state.cursor().cloned() {
            let page = self.source.creator_contents(url_token, kind, &cursor).await?;
            state.advance(&page);

            if page.items.is_empty() {
                break;
            }

            tracing::info!(
                creator = %url_token,
                kind = %kind,
                cursor = %cursor,
                count = page.items.len(),
                "Creator page fetched"
            );
            self.store_contents(&page.items)?;
            authored.extend(page.items);

            if !state.is_end() {
                tokio::time::sleep(self.settings.interval).await;
            }
        }
        Ok(())
    }

    // ===== Question =====

    async fn question(&self) -> Result<()> {
        let ctx = CrawlContext::new(CrawlMode::Question);
        let Some(question_id) = self.source.question_id(&self.settings.question_url) else {
            tracing::warn!(url = %self.settings.question_url, "No question id in URL");
            return Ok(());
        };

        tracing::info!(question = %question_id, "Fetching question answers");
        let refs: Vec<ContentRef> = self
            .source
            .question_answers(&question_id)
            .await?
            .into_iter()
            .filter(|r| !r.id().is_empty())
            .collect();

        let fetched = self.fetch_details(&ctx, &refs).await?;
        self.store_contents(&fetched)?;
        tracing::info!(question = %question_id, count = fetched.len(), "Question answers stored");
        Ok(())
    }

    fn store_contents(&self, contents: &[Content]) -> Result<()> {
        self.sink.upsert_contents(contents)?;
        self.counters.add_contents(contents.len());
        Ok(())
    }
}
