//! The seam between the orchestrator and a platform's API client

use crate::config::CrawlMode;
use crate::model::{Comment, Content, ContentKind, Creator};
use crate::state::{Cursor, Page};
use crate::Result;
use async_trait::async_trait;
use std::fmt;

/// Explicit per-call crawl context
///
/// Replaces process-wide "current mode / current keyword" state: every record
/// built under a context is stamped from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlContext {
    pub mode: CrawlMode,
    /// Keyword being searched; empty outside search mode
    pub source_keyword: String,
}

impl CrawlContext {
    pub fn new(mode: CrawlMode) -> Self {
        Self {
            mode,
            source_keyword: String::new(),
        }
    }

    /// Context for one search keyword
    pub fn for_keyword(keyword: impl Into<String>) -> Self {
        Self {
            mode: CrawlMode::Search,
            source_keyword: keyword.into(),
        }
    }
}

/// A content item addressed by the ids its detail page needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    Answer {
        question_id: String,
        answer_id: String,
    },
    Article {
        id: String,
    },
    Video {
        id: String,
    },
}

impl ContentRef {
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Answer { .. } => ContentKind::Answer,
            Self::Article { .. } => ContentKind::Article,
            Self::Video { .. } => ContentKind::Video,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Answer { answer_id, .. } => answer_id,
            Self::Article { id } | Self::Video { id } => id,
        }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Platform operations the orchestrator drives
///
/// Implementations must be shareable across concurrent comment traversals.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// One page of search results for `ctx.source_keyword`
    async fn search(&self, ctx: &CrawlContext, page: u32) -> Result<Page<Content>>;

    /// Classifies a user-supplied content URL
    fn classify_url(&self, url: &str) -> Option<ContentRef>;

    /// Fetches one content item; `Ok(None)` when the page holds no usable record
    async fn content_detail(&self, ctx: &CrawlContext, target: &ContentRef)
        -> Result<Option<Content>>;

    /// Url token from a creator profile link
    fn creator_url_token(&self, url: &str) -> Option<String>;

    async fn creator_profile(&self, url_token: &str) -> Result<Option<Creator>>;

    /// One page of a creator's authored content of `kind`
    async fn creator_contents(
        &self,
        url_token: &str,
        kind: ContentKind,
        cursor: &Cursor,
    ) -> Result<Page<Content>>;

    /// Question id from a question URL or bare id
    fn question_id(&self, url: &str) -> Option<String>;

    /// Answers listed under a question (one listing call)
    async fn question_answers(&self, question_id: &str) -> Result<Vec<ContentRef>>;

    async fn root_comments(&self, content: &Content, cursor: &Cursor) -> Result<Page<Comment>>;

    async fn child_comments(
        &self,
        content: &Content,
        root: &Comment,
        cursor: &Cursor,
    ) -> Result<Page<Comment>>;
}
