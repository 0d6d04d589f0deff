//! Output module for run summaries
//!
//! This module handles:
//! - Live per-run counters shared by concurrent traversals
//! - Reading totals back from a harvest database
//! - Printing and logging summaries

pub mod stats;

pub use stats::{
    load_statistics, log_run_summary, print_statistics, CrawlCounters, CrawlStatistics,
    DatabaseStatistics,
};
