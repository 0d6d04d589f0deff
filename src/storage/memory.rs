//! In-memory sink
//!
//! Keeps every call as an ordered event log, so callers can assert both what
//! was stored and in which order it arrived.

use crate::model::{Comment, Content, ContentKind, Creator};
use crate::storage::traits::{Sink, SinkError, SinkResult};
use std::sync::{Mutex, MutexGuard};

/// One recorded sink call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Content(Content),
    Comments {
        content_id: String,
        comments: Vec<Comment>,
    },
    Creator(Creator),
}

/// Sink that records every call in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<SinkEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn events(&self) -> SinkResult<MutexGuard<'_, Vec<SinkEvent>>> {
        self.events.lock().map_err(|_| SinkError::Poisoned)
    }

    /// Snapshot of every call so far, in arrival order
    pub fn log(&self) -> Vec<SinkEvent> {
        self.events().map(|e| e.clone()).unwrap_or_default()
    }

    /// Latest version of every content item, first-seen order
    pub fn contents(&self) -> Vec<Content> {
        let mut latest: Vec<Content> = Vec::new();
        for event in self.log() {
            if let SinkEvent::Content(content) = event {
                match latest.iter_mut().find(|c| c.key() == content.key()) {
                    Some(existing) => *existing = content,
                    None => latest.push(content),
                }
            }
        }
        latest
    }

    /// Every appended comment in append order
    pub fn comments(&self) -> Vec<Comment> {
        self.log()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Comments { comments, .. } => Some(comments),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Comment batches as (parent content id, comment ids)
    pub fn comment_batches(&self) -> Vec<(String, Vec<String>)> {
        self.log()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Comments {
                    content_id,
                    comments,
                } => Some((
                    content_id,
                    comments.into_iter().map(|c| c.comment_id).collect(),
                )),
                _ => None,
            })
            .collect()
    }

    /// Latest version of every creator, first-seen order
    pub fn creators(&self) -> Vec<Creator> {
        let mut latest: Vec<Creator> = Vec::new();
        for event in self.log() {
            if let SinkEvent::Creator(creator) = event {
                match latest.iter_mut().find(|c| c.user_id == creator.user_id) {
                    Some(existing) => *existing = creator,
                    None => latest.push(creator),
                }
            }
        }
        latest
    }

    pub fn content_count(&self, kind: ContentKind) -> usize {
        self.contents()
            .iter()
            .filter(|c| c.content_type == kind)
            .count()
    }
}

impl Sink for MemorySink {
    fn upsert_content(&self, content: &Content) -> SinkResult<()> {
        self.events()?.push(SinkEvent::Content(content.clone()));
        Ok(())
    }

    fn append_comments(&self, content_id: &str, comments: &[Comment]) -> SinkResult<()> {
        self.events()?.push(SinkEvent::Comments {
            content_id: content_id.to_string(),
            comments: comments.to_vec(),
        });
        Ok(())
    }

    fn upsert_creator(&self, creator: &Creator) -> SinkResult<()> {
        self.events()?.push(SinkEvent::Creator(creator.clone()));
        Ok(())
    }
}
