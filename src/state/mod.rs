//! State module for tracking pagination progress
//!
//! Every listing the orchestrator walks (search pages, creator timelines,
//! comment threads) is driven by a [`PaginationState`] fed with extracted [`Page`]s.

mod pagination;

pub use pagination::{Cursor, Page, PaginationState};
