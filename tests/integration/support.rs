//! Shared fixtures: record builders, run settings and an instrumented stub source

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use sumi_harvest::config::CrawlMode;
use sumi_harvest::crawler::{ContentRef, ContentSource, CrawlContext, CrawlSettings};
use sumi_harvest::model::{CreatorRef, ContentKind};
use sumi_harvest::platform::zhihu::{classify_content_url, creator_url_token, question_id};
use sumi_harvest::{Comment, Content, Creator, Cursor, Page};
use sumi_harvest::HarvestError;

pub fn answer(id: &str) -> Content {
    Content {
        content_id: id.to_string(),
        content_type: ContentKind::Answer,
        title: format!("title {}", id),
        content_text: String::new(),
        desc: String::new(),
        question_id: Some("q1".to_string()),
        content_url: format!("https://www.zhihu.com/question/q1/answer/{}", id),
        created_time: 0,
        updated_time: 0,
        voteup_count: 0,
        comment_count: 0,
        source_keyword: String::new(),
        author: CreatorRef::default(),
    }
}

pub fn answers(prefix: &str, n: usize) -> Vec<Content> {
    (0..n).map(|i| answer(&format!("{}{}", prefix, i))).collect()
}

pub fn root(id: &str, sub_comment_count: i64) -> Comment {
    Comment {
        comment_id: id.to_string(),
        content_id: String::new(),
        content_type: ContentKind::Answer,
        parent_comment_id: None,
        content: format!("comment {}", id),
        publish_time: 0,
        sub_comment_count,
        like_count: 0,
        dislike_count: 0,
        ip_location: String::new(),
        author: CreatorRef::default(),
    }
}

pub fn child(id: &str, parent: &str) -> Comment {
    Comment {
        parent_comment_id: Some(parent.to_string()),
        ..root(id, 0)
    }
}

/// Splits items into pages whose cursors are page indexes; the last page ends the listing
pub fn paged<T>(pages: Vec<Vec<T>>) -> Vec<Page<T>> {
    let last = pages.len().saturating_sub(1);
    pages
        .into_iter()
        .enumerate()
        .map(|(i, items)| {
            let cursor = if i == last {
                Cursor::end()
            } else {
                Cursor::at_offset(i as u64 + 1)
            };
            Page::new(items, cursor)
        })
        .collect()
}

/// A page that does not report the end of the listing
pub fn open_page<T>(items: Vec<T>, next: u64) -> Page<T> {
    Page::new(items, Cursor::at_offset(next))
}

pub fn settings(mode: CrawlMode) -> CrawlSettings {
    CrawlSettings {
        mode,
        keywords: vec!["python".to_string()],
        start_page: 1,
        max_items: 200,
        max_concurrency: 1,
        enable_comments: true,
        enable_sub_comments: true,
        interval: Duration::ZERO,
        specified_urls: Vec::new(),
        creator_urls: Vec::new(),
        question_url: String::new(),
        creator_kinds: vec![ContentKind::Answer],
    }
}

/// Scripted `ContentSource` that records every call
#[derive(Default)]
pub struct StubSource {
    /// Search pages by page number minus one
    pub search_pages: Vec<Page<Content>>,
    /// Keywords whose search fails with a data fetch error
    pub failing_keywords: HashSet<String>,
    /// Root comment pages per content id
    pub roots: HashMap<String, Vec<Page<Comment>>>,
    /// Child comment pages per root comment id
    pub children: HashMap<String, Vec<Page<Comment>>>,
    /// Root comment calls answer 403
    pub forbidden_roots: bool,
    /// Time each root comment call takes
    pub root_delay: Duration,
    pub details: HashMap<String, Content>,
    pub question_refs: Vec<ContentRef>,
    pub creators: HashMap<String, Creator>,
    /// Authored content pages per creator url token
    pub authored: HashMap<String, Vec<Page<Content>>>,

    /// Content ids whose root comment calls fail with a data fetch error
    pub failing_roots: HashSet<String>,

    pub calls: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl StubSource {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose label starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn page_at<T: Clone>(pages: Option<&Vec<Page<T>>>, cursor: &Cursor) -> Page<T> {
        pages
            .and_then(|pages| pages.get(cursor.offset() as usize))
            .cloned()
            .unwrap_or_else(Page::empty)
    }
}

#[async_trait]
impl ContentSource for StubSource {
    async fn search(&self, ctx: &CrawlContext, page: u32) -> sumi_harvest::Result<Page<Content>> {
        self.record(format!("search:{}:{}", ctx.source_keyword, page));
        if self.failing_keywords.contains(&ctx.source_keyword) {
            return Err(HarvestError::DataFetch("search failed".to_string()));
        }

        let mut page = self
            .search_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_else(Page::empty);
        for item in &mut page.items {
            item.source_keyword = ctx.source_keyword.clone();
        }
        Ok(page)
    }

    fn classify_url(&self, url: &str) -> Option<ContentRef> {
        classify_content_url(url)
    }

    async fn content_detail(
        &self,
        ctx: &CrawlContext,
        target: &ContentRef,
    ) -> sumi_harvest::Result<Option<Content>> {
        self.record(format!("detail:{}", target.id()));
        Ok(self.details.get(target.id()).cloned().map(|mut c| {
            c.source_keyword = ctx.source_keyword.clone();
            c
        }))
    }

    fn creator_url_token(&self, url: &str) -> Option<String> {
        creator_url_token(url)
    }

    async fn creator_profile(&self, url_token: &str) -> sumi_harvest::Result<Option<Creator>> {
        self.record(format!("creator:{}", url_token));
        Ok(self.creators.get(url_token).cloned())
    }

    async fn creator_contents(
        &self,
        url_token: &str,
        kind: ContentKind,
        cursor: &Cursor,
    ) -> sumi_harvest::Result<Page<Content>> {
        self.record(format!("authored:{}:{}:{}", url_token, kind, cursor.offset()));
        Ok(Self::page_at(self.authored.get(url_token), cursor))
    }

    fn question_id(&self, url: &str) -> Option<String> {
        question_id(url)
    }

    async fn question_answers(&self, question_id: &str) -> sumi_harvest::Result<Vec<ContentRef>> {
        self.record(format!("answers:{}", question_id));
        Ok(self.question_refs.clone())
    }

    async fn root_comments(
        &self,
        content: &Content,
        cursor: &Cursor,
    ) -> sumi_harvest::Result<Page<Comment>> {
        self.record(format!("roots:{}:{}", content.content_id, cursor.offset()));

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.root_delay.is_zero() {
            tokio::time::sleep(self.root_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.forbidden_roots {
            return Err(HarvestError::Forbidden("banned".to_string()));
        }
        if self.failing_roots.contains(&content.content_id) {
            return Err(HarvestError::DataFetch("comments unavailable".to_string()));
        }
        Ok(Self::page_at(self.roots.get(&content.content_id), cursor))
    }

    async fn child_comments(
        &self,
        _content: &Content,
        root: &Comment,
        cursor: &Cursor,
    ) -> sumi_harvest::Result<Page<Comment>> {
        self.record(format!("children:{}:{}", root.comment_id, cursor.offset()));
        Ok(Self::page_at(self.children.get(&root.comment_id), cursor))
    }
}
