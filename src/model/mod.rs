//! Unified records produced by platform extractors
//!
//! Every platform maps its payloads onto these types before they reach a sink.

use serde::Serialize;
use std::fmt;

/// Kind of a crawled content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Answer,
    Article,
    Video,
}

impl ContentKind {
    /// Returns the string representation used in storage and comment routes
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Article => "article",
            Self::Video => "zvideo",
        }
    }

    /// Parses a platform type tag into a kind
    ///
    /// Accepts both the API tag (`zvideo`) and the config spelling (`video`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "answer" => Some(Self::Answer),
            "article" => Some(Self::Article),
            "zvideo" | "video" => Some(Self::Video),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author reference embedded in contents and comments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreatorRef {
    pub user_id: String,
    pub url_token: String,
    pub nickname: String,
    pub avatar: String,
    pub link: String,
}

/// An answer, article or video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub content_id: String,
    pub content_type: ContentKind,
    pub title: String,
    pub content_text: String,
    pub desc: String,
    /// Parent question, answers only
    pub question_id: Option<String>,
    pub content_url: String,
    pub created_time: i64,
    pub updated_time: i64,
    pub voteup_count: i64,
    pub comment_count: i64,
    /// Search keyword that surfaced this item, empty outside search mode
    pub source_keyword: String,
    pub author: CreatorRef,
}

impl Content {
    /// Storage key: content ids are only unique within a kind
    pub fn key(&self) -> (ContentKind, &str) {
        (self.content_type, &self.content_id)
    }
}

/// A root or child comment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub comment_id: String,
    pub content_id: String,
    pub content_type: ContentKind,
    /// `None` for root comments
    pub parent_comment_id: Option<String>,
    pub content: String,
    pub publish_time: i64,
    pub sub_comment_count: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    pub ip_location: String,
    pub author: CreatorRef,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

/// A creator profile with aggregate statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Creator {
    pub user_id: String,
    pub url_token: String,
    pub nickname: String,
    pub avatar: String,
    pub gender: String,
    pub ip_location: String,
    pub follows: i64,
    pub fans: i64,
    pub answer_count: i64,
    pub video_count: i64,
    pub question_count: i64,
    pub article_count: i64,
    pub column_count: i64,
    pub voteup_count: i64,
}
