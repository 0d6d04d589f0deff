//! Storage module for persisting crawled records
//!
//! This module holds the record sinks the orchestrator writes to:
//! - the [`Sink`] trait and its error type
//! - a SQLite sink with run tracking and counters
//! - an in-memory sink that logs every call in order

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::{MemorySink, SinkEvent};
pub use sqlite::SqliteSink;
pub use traits::{Sink, SinkError, SinkResult};

use std::path::Path;

/// Opens the SQLite sink at `path`
pub fn open_sink(path: &Path) -> SinkResult<SqliteSink> {
    SqliteSink::new(path)
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub platform: String,
    pub crawl_mode: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
