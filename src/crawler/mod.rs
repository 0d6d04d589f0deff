//! Crawler module for crawl orchestration
//!
//! This module contains the platform-independent crawling logic, including:
//! - The [`ContentSource`] seam a platform client implements
//! - Explicit per-call crawl context
//! - Comment-tree traversal under a shared concurrency bound
//! - Overall crawl coordination across the four crawl modes

mod comments;
mod coordinator;
mod source;

pub use comments::CommentWalker;
pub use coordinator::{Coordinator, CrawlSettings};
pub use source::{ContentRef, ContentSource, CrawlContext};
