//! Sink trait and error types
//!
//! The orchestrator forwards every extracted record through a [`Sink`]. Sinks
//! are synchronous and shared across concurrent comment traversals, so
//! implementations must be `Send + Sync`.

use crate::model::{Comment, Content, Creator};
use thiserror::Error;

/// Errors that can occur while persisting records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink lock poisoned")]
    Poisoned,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for crawled records
pub trait Sink: Send + Sync {
    /// Inserts or replaces a content item keyed by (type, id)
    fn upsert_content(&self, content: &Content) -> SinkResult<()>;

    /// Upserts every item of a page in order
    fn upsert_contents(&self, contents: &[Content]) -> SinkResult<()> {
        for content in contents {
            self.upsert_content(content)?;
        }
        Ok(())
    }

    /// Appends one batch of comments under a parent content id
    ///
    /// Batches are appended in the order they arrive; comments are never updated.
    fn append_comments(&self, content_id: &str, comments: &[Comment]) -> SinkResult<()>;

    /// Inserts or replaces a creator keyed by user id
    fn upsert_creator(&self, creator: &Creator) -> SinkResult<()>;
}
