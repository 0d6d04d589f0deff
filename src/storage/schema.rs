//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sumi-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    platform TEXT NOT NULL,
    crawl_mode TEXT NOT NULL,
    status TEXT NOT NULL
);

-- Answers, articles and videos; ids are unique per content type
CREATE TABLE IF NOT EXISTS contents (
    content_type TEXT NOT NULL,
    content_id TEXT NOT NULL,
    question_id TEXT,
    title TEXT NOT NULL,
    content_text TEXT NOT NULL,
    description TEXT NOT NULL,
    content_url TEXT NOT NULL,
    created_time INTEGER NOT NULL,
    updated_time INTEGER NOT NULL,
    voteup_count INTEGER NOT NULL DEFAULT 0,
    comment_count INTEGER NOT NULL DEFAULT 0,
    source_keyword TEXT NOT NULL,
    user_id TEXT NOT NULL,
    user_url_token TEXT NOT NULL,
    user_nickname TEXT NOT NULL,
    user_avatar TEXT NOT NULL,
    user_link TEXT NOT NULL,
    crawled_at TEXT NOT NULL,
    PRIMARY KEY (content_type, content_id)
);

CREATE INDEX IF NOT EXISTS idx_contents_keyword ON contents(source_keyword);

-- Comments are append-only; seq preserves arrival order
CREATE TABLE IF NOT EXISTS comments (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    comment_id TEXT NOT NULL,
    content_id TEXT NOT NULL,
    content_type TEXT NOT NULL,
    parent_comment_id TEXT,
    content TEXT NOT NULL,
    publish_time INTEGER NOT NULL,
    sub_comment_count INTEGER NOT NULL DEFAULT 0,
    like_count INTEGER NOT NULL DEFAULT 0,
    dislike_count INTEGER NOT NULL DEFAULT 0,
    ip_location TEXT NOT NULL,
    user_id TEXT NOT NULL,
    user_nickname TEXT NOT NULL,
    user_avatar TEXT NOT NULL,
    crawled_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_content ON comments(content_id);
CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_comment_id);

-- Creator profiles
CREATE TABLE IF NOT EXISTS creators (
    user_id TEXT PRIMARY KEY,
    url_token TEXT NOT NULL,
    nickname TEXT NOT NULL,
    avatar TEXT NOT NULL,
    gender TEXT NOT NULL,
    ip_location TEXT NOT NULL,
    follows INTEGER NOT NULL DEFAULT 0,
    fans INTEGER NOT NULL DEFAULT 0,
    answer_count INTEGER NOT NULL DEFAULT 0,
    video_count INTEGER NOT NULL DEFAULT 0,
    question_count INTEGER NOT NULL DEFAULT 0,
    article_count INTEGER NOT NULL DEFAULT 0,
    column_count INTEGER NOT NULL DEFAULT 0,
    voteup_count INTEGER NOT NULL DEFAULT 0,
    crawled_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
