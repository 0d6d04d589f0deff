//! Run statistics
//!
//! Live counters are bumped by the coordinator while a crawl runs; database
//! statistics are read back from the SQLite sink for `--stats`.

use crate::model::ContentKind;
use crate::storage::{RunRecord, SinkResult, SqliteSink};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every traversal of one run
#[derive(Debug, Default)]
pub struct CrawlCounters {
    contents: AtomicU64,
    comments: AtomicU64,
    creators: AtomicU64,
    skipped: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contents(&self, n: usize) {
        self.contents.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_comments(&self, n: usize) {
        self.comments.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_creator(&self) {
        self.creators.fetch_add(1, Ordering::Relaxed);
    }

    /// An item that was dropped: unknown URL shape, empty detail page or a failed fetch
    pub fn add_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CrawlStatistics {
        CrawlStatistics {
            contents: self.contents.load(Ordering::Relaxed),
            comments: self.comments.load(Ordering::Relaxed),
            creators: self.creators.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

/// Summary of one crawl run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Content records forwarded to the sink
    pub contents: u64,

    /// Root and child comments forwarded to the sink
    pub comments: u64,

    /// Creator profiles forwarded to the sink
    pub creators: u64,

    pub skipped: u64,
}

/// Totals stored in a harvest database
#[derive(Debug, Clone)]
pub struct DatabaseStatistics {
    pub latest_run: Option<RunRecord>,
    pub answers: u64,
    pub articles: u64,
    pub videos: u64,
    pub root_comments: u64,
    pub child_comments: u64,
    pub creators: u64,
    /// Search keywords and the number of records each surfaced
    pub keywords: Vec<(String, u64)>,
}

/// Loads statistics from a SQLite sink
///
/// # Arguments
///
/// * `sink` - The sink to query
///
/// # Returns
///
/// * `Ok(DatabaseStatistics)` - Successfully loaded statistics
/// * `Err(SinkError)` - Failed to query the database
pub fn load_statistics(sink: &SqliteSink) -> SinkResult<DatabaseStatistics> {
    let (root_comments, child_comments) = sink.count_comments()?;

    Ok(DatabaseStatistics {
        latest_run: sink.latest_run()?,
        answers: sink.count_contents(ContentKind::Answer)?,
        articles: sink.count_contents(ContentKind::Article)?,
        videos: sink.count_contents(ContentKind::Video)?,
        root_comments,
        child_comments,
        creators: sink.count_creators()?,
        keywords: sink.keyword_summary()?,
    })
}

/// Prints database statistics to stdout
pub fn print_statistics(stats: &DatabaseStatistics) {
    println!("=== Harvest Statistics ===\n");

    if let Some(run) = &stats.latest_run {
        println!("Latest run:");
        println!("  Id: {}", run.id);
        println!("  Platform: {} ({})", run.platform, run.crawl_mode);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!();
    }

    println!("Contents:");
    println!("  Answers: {}", stats.answers);
    println!("  Articles: {}", stats.articles);
    println!("  Videos: {}", stats.videos);
    println!();

    let total_comments = stats.root_comments + stats.child_comments;
    println!("Comments: {}", total_comments);
    println!("  Root: {}", stats.root_comments);
    println!("  Replies: {}", stats.child_comments);
    println!();

    println!("Creators: {}", stats.creators);

    if !stats.keywords.is_empty() {
        println!();
        println!("Keywords:");
        for (keyword, count) in &stats.keywords {
            println!("  {}: {}", keyword, count);
        }
    }
}

/// Logs the summary of a finished run
pub fn log_run_summary(stats: &CrawlStatistics) {
    tracing::info!(
        contents = stats.contents,
        comments = stats.comments,
        creators = stats.creators,
        skipped = stats.skipped,
        "Crawl finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Content, CreatorRef};
    use crate::storage::Sink;

    #[test]
    fn test_counters_snapshot() {
        let counters = CrawlCounters::new();
        counters.add_contents(3);
        counters.add_comments(5);
        counters.add_comments(2);
        counters.add_creator();
        counters.add_skipped();

        assert_eq!(
            counters.snapshot(),
            CrawlStatistics {
                contents: 3,
                comments: 7,
                creators: 1,
                skipped: 1,
            }
        );
    }

    #[test]
    fn test_load_statistics_from_sink() {
        let sink = SqliteSink::new_in_memory().unwrap();
        sink.upsert_content(&Content {
            content_id: "1".to_string(),
            content_type: ContentKind::Article,
            title: "t".to_string(),
            content_text: String::new(),
            desc: String::new(),
            question_id: None,
            content_url: "https://zhuanlan.zhihu.com/p/1".to_string(),
            created_time: 0,
            updated_time: 0,
            voteup_count: 0,
            comment_count: 0,
            source_keyword: "rust".to_string(),
            author: CreatorRef::default(),
        })
        .unwrap();

        let stats = load_statistics(&sink).unwrap();
        assert_eq!(stats.articles, 1);
        assert_eq!(stats.answers, 0);
        assert_eq!(stats.keywords, vec![("rust".to_string(), 1)]);
        assert!(stats.latest_run.is_none());
    }
}
