//! Comment-tree traversal
//!
//! Each content item's tree is walked sequentially: root pages in order, and
//! after each root page the child threads of its roots. Trees of different
//! items are walked concurrently, bounded by one semaphore shared by the run.

use crate::crawler::ContentSource;
use crate::model::{Comment, Content};
use crate::output::CrawlCounters;
use crate::state::{Page, PaginationState};
use crate::storage::Sink;
use crate::{HarvestError, Result};
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Walks comment trees and forwards every page to the sink
pub struct CommentWalker {
    source: Arc<dyn ContentSource>,
    sink: Arc<dyn Sink>,
    semaphore: Arc<Semaphore>,
    counters: Arc<CrawlCounters>,
    interval: Duration,
    expand_children: bool,
}

impl CommentWalker {
    /// Creates a walker
    ///
    /// # Arguments
    ///
    /// * `source` - Platform client
    /// * `sink` - Destination of comment batches
    /// * `semaphore` - Process-wide bound on concurrent traversals
    /// * `counters` - Run counters
    /// * `interval` - Delay between consecutive pagination calls
    /// * `expand_children` - Whether child threads are fetched
    pub fn new(
        source: Arc<dyn ContentSource>,
        sink: Arc<dyn Sink>,
        semaphore: Arc<Semaphore>,
        counters: Arc<CrawlCounters>,
        interval: Duration,
        expand_children: bool,
    ) -> Self {
        Self {
            source,
            sink,
            semaphore,
            counters,
            interval,
            expand_children,
        }
    }

    /// Walks the trees of every item under the shared traversal bound
    ///
    /// A data fetch failure only abandons the affected thread. Any other error
    /// cancels the remaining traversals and is returned.
    pub async fn walk_all(&self, contents: &[Content]) -> Result<()> {
        if contents.is_empty() {
            return Ok(());
        }

        tracing::info!(items = contents.len(), "Fetching comments");
        try_join_all(contents.iter().map(|content| self.walk_bounded(content))).await?;
        Ok(())
    }

    async fn walk_bounded(&self, content: &Content) -> Result<()> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| HarvestError::DataFetch(format!("traversal bound closed: {}", e)))?;
        self.walk(content).await
    }

    /// Walks one item's tree
    pub async fn walk(&self, content: &Content) -> Result<()> {
        let mut state = PaginationState::start();

        while let Some(cursor) = state.cursor().cloned() {
            let page = match self.source.root_comments(content, &cursor).await {
                Ok(page) => page,
                Err(e) => return contain(e, &content.content_id, "root comments"),
            };
            state.advance(&page);

            if page.items.is_empty() {
                break;
            }

            self.forward(content, &page)?;

            if self.expand_children {
                for root in page.items.iter().filter(|c| c.sub_comment_count > 0) {
                    self.walk_children(content, root).await?;
                }
            }

            if !state.is_end() {
                tokio::time::sleep(self.interval).await;
            }
        }

        Ok(())
    }

    async fn walk_children(&self, content: &Content, root: &Comment) -> Result<()> {
        let mut state = PaginationState::start();

        while let Some(cursor) = state.cursor().cloned() {
            tokio::time::sleep(self.interval).await;

            let page = match self.source.child_comments(content, root, &cursor).await {
                Ok(page) => page,
                Err(e) => return contain(e, &root.comment_id, "child comments"),
            };
            state.advance(&page);

            if page.items.is_empty() {
                break;
            }
            self.forward(content, &page)?;
        }

        Ok(())
    }

    fn forward(&self, content: &Content, page: &Page<Comment>) -> Result<()> {
        self.sink.append_comments(&content.content_id, &page.items)?;
        self.counters.add_comments(page.items.len());
        tracing::debug!(
            content_id = %content.content_id,
            count = page.items.len(),
            cursor = %page.cursor,
            "Stored comment page"
        );
        Ok(())
    }
}

/// Logs a loop-local failure and ends the loop; anything else propagates
fn contain(error: HarvestError, id: &str, what: &str) -> Result<()> {
    if error.is_loop_local() {
        tracing::error!(id, error = %error, "Failed to fetch {}, skipping thread", what);
        Ok(())
    } else {
        Err(error)
    }
}
