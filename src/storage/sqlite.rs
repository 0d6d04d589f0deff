//! SQLite sink implementation
//!
//! This module provides a SQLite-backed implementation of the [`Sink`] trait
//! plus the run bookkeeping and counters used by `--stats`.

use crate::model::{Comment, Content, ContentKind, Creator};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Sink, SinkError, SinkResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite sink
///
/// The connection sits behind a mutex so one sink can be shared by every
/// concurrent comment traversal.
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(SinkError)` - Failed to open database
    pub fn new(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> SinkResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SinkError::Poisoned)
    }

    // ===== Run Management =====

    /// Records the start of a crawl run and returns its id
    pub fn begin_run(&self, config_hash: &str, platform: &str, crawl_mode: &str) -> SinkResult<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, platform, crawl_mode, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Utc::now().to_rfc3339(),
                config_hash,
                platform,
                crawl_mode,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Marks a run finished with the given status
    pub fn finish_run(&self, run_id: i64, status: RunStatus) -> SinkResult<()> {
        self.conn()?.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), Utc::now().to_rfc3339(), run_id],
        )?;
        Ok(())
    }

    /// Gets the most recent run
    pub fn latest_run(&self) -> SinkResult<Option<RunRecord>> {
        let conn = self.conn()?;
        let run = conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, platform, crawl_mode, status
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(RunRecord {
                        id: row.get(0)?,
                        started_at: row.get(1)?,
                        finished_at: row.get(2)?,
                        config_hash: row.get(3)?,
                        platform: row.get(4)?,
                        crawl_mode: row.get(5)?,
                        status: RunStatus::from_db_string(&row.get::<_, String>(6)?)
                            .unwrap_or(RunStatus::Failed),
                    })
                },
            )
            .optional()?;
        Ok(run)
    }

    // ===== Statistics =====

    pub fn count_contents(&self, kind: ContentKind) -> SinkResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM contents WHERE content_type = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Counts (root, child) comments
    pub fn count_comments(&self) -> SinkResult<(u64, u64)> {
        let (roots, children): (i64, i64) = self.conn()?.query_row(
            "SELECT
                COALESCE(SUM(CASE WHEN parent_comment_id IS NULL THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN parent_comment_id IS NULL THEN 0 ELSE 1 END), 0)
             FROM comments",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((roots as u64, children as u64))
    }

    pub fn count_creators(&self) -> SinkResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM creators", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Contents per source keyword, most productive first
    pub fn keyword_summary(&self) -> SinkResult<Vec<(String, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT source_keyword, COUNT(*) FROM contents
             WHERE source_keyword != ''
             GROUP BY source_keyword ORDER BY COUNT(*) DESC, source_keyword",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Comment ids for one content item in insertion order
    pub fn comment_ids_for(&self, content_id: &str) -> SinkResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT comment_id FROM comments WHERE content_id = ?1 ORDER BY seq")?;
        let ids = stmt
            .query_map(params![content_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }
}

impl Sink for SqliteSink {
    fn upsert_content(&self, content: &Content) -> SinkResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO contents (
                content_type, content_id, question_id, title, content_text, description,
                content_url, created_time, updated_time, voteup_count, comment_count,
                source_keyword, user_id, user_url_token, user_nickname, user_avatar,
                user_link, crawled_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                content.content_type.as_str(),
                content.content_id,
                content.question_id,
                content.title,
                content.content_text,
                content.desc,
                content.content_url,
                content.created_time,
                content.updated_time,
                content.voteup_count,
                content.comment_count,
                content.source_keyword,
                content.author.user_id,
                content.author.url_token,
                content.author.nickname,
                content.author.avatar,
                content.author.link,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn append_comments(&self, content_id: &str, comments: &[Comment]) -> SinkResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO comments (
                    comment_id, content_id, content_type, parent_comment_id, content,
                    publish_time, sub_comment_count, like_count, dislike_count, ip_location,
                    user_id, user_nickname, user_avatar, crawled_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            let now = Utc::now().to_rfc3339();
            for comment in comments {
                stmt.execute(params![
                    comment.comment_id,
                    content_id,
                    comment.content_type.as_str(),
                    comment.parent_comment_id,
                    comment.content,
                    comment.publish_time,
                    comment.sub_comment_count,
                    comment.like_count,
                    comment.dislike_count,
                    comment.ip_location,
                    comment.author.user_id,
                    comment.author.nickname,
                    comment.author.avatar,
                    now,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_creator(&self, creator: &Creator) -> SinkResult<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO creators (
                user_id, url_token, nickname, avatar, gender, ip_location, follows, fans,
                answer_count, video_count, question_count, article_count, column_count,
                voteup_count, crawled_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                creator.user_id,
                creator.url_token,
                creator.nickname,
                creator.avatar,
                creator.gender,
                creator.ip_location,
                creator.follows,
                creator.fans,
                creator.answer_count,
                creator.video_count,
                creator.question_count,
                creator.article_count,
                creator.column_count,
                creator.voteup_count,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
