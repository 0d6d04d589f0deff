//! Payload extraction
//!
//! Turns decoded API payloads and server-rendered pages into unified records
//! and pagination cursors. Everything here is pure: no I/O, no ambient state.
//! Optional fields default (numbers to 0, strings to empty); a record without
//! an id is dropped with a warning.

use crate::crawler::ContentRef;
use crate::model::{Comment, Content, ContentKind, Creator, CreatorRef};
use crate::platform::zhihu::constants::{ZHIHU_URL, ZHIHU_ZHUANLAN_URL};
use crate::state::{Cursor, Page};
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

// ===== Field access =====

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Looks a field up by its snake_case name, falling back to camelCase
fn field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value.get(name) {
        Some(v) if !v.is_null() => Some(v),
        _ => value.get(camel_case(name)).filter(|v| !v.is_null()),
    }
}

/// String field; numbers are rendered as strings
fn text(value: &Value, name: &str) -> String {
    match field(value, name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Integer field; numeric strings are parsed
fn int(value: &Value, name: &str) -> i64 {
    match field(value, name) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

fn first_text(value: &Value, names: &[&str]) -> String {
    names
        .iter()
        .map(|name| text(value, name))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

fn first_int(value: &Value, names: &[&str]) -> i64 {
    names
        .iter()
        .find(|name| field(value, name).is_some())
        .map(|name| int(value, name))
        .unwrap_or(0)
}

/// Strips tags and collapses whitespace
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return html.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    let fragment = Html::parse_fragment(html);
    let raw: String = fragment.root_element().text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ===== Canonical URLs =====

pub fn answer_url(question_id: &str, answer_id: &str) -> String {
    format!("{}/question/{}/answer/{}", ZHIHU_URL, question_id, answer_id)
}

pub fn article_url(id: &str) -> String {
    format!("{}/p/{}", ZHIHU_ZHUANLAN_URL, id)
}

pub fn video_url(id: &str) -> String {
    format!("{}/zvideo/{}", ZHIHU_URL, id)
}

pub fn creator_url(url_token: &str) -> String {
    format!("{}/people/{}", ZHIHU_URL, url_token)
}

// ===== Records =====

fn extract_author(value: Option<&Value>) -> CreatorRef {
    let Some(author) = value else {
        return CreatorRef::default();
    };
    let url_token = text(author, "url_token");
    CreatorRef {
        user_id: text(author, "id"),
        link: if url_token.is_empty() {
            String::new()
        } else {
            creator_url(&url_token)
        },
        url_token,
        nickname: text(author, "name"),
        avatar: text(author, "avatar_url"),
    }
}

fn extract_answer(answer: &Value, keyword: &str) -> Option<Content> {
    let content_id = text(answer, "id");
    if content_id.is_empty() {
        tracing::warn!("Dropping answer without id");
        return None;
    }

    let question = field(answer, "question");
    let question_id = question.map(|q| text(q, "id")).unwrap_or_default();
    let mut title = html_to_text(&text(answer, "title"));
    if title.is_empty() {
        if let Some(q) = question {
            title = html_to_text(&first_text(q, &["title", "name"]));
        }
    }

    Some(Content {
        content_url: answer_url(&question_id, &content_id),
        content_id,
        content_type: ContentKind::Answer,
        title,
        content_text: html_to_text(&text(answer, "content")),
        desc: html_to_text(&first_text(answer, &["description", "excerpt"])),
        question_id: Some(question_id).filter(|q| !q.is_empty()),
        created_time: int(answer, "created_time"),
        updated_time: int(answer, "updated_time"),
        voteup_count: int(answer, "voteup_count"),
        comment_count: int(answer, "comment_count"),
        source_keyword: keyword.to_string(),
        author: extract_author(field(answer, "author")),
    })
}

fn extract_article(article: &Value, keyword: &str) -> Option<Content> {
    let content_id = text(article, "id");
    if content_id.is_empty() {
        tracing::warn!("Dropping article without id");
        return None;
    }

    Some(Content {
        content_url: article_url(&content_id),
        content_id,
        content_type: ContentKind::Article,
        title: html_to_text(&text(article, "title")),
        content_text: html_to_text(&text(article, "content")),
        desc: html_to_text(&first_text(article, &["description", "excerpt"])),
        question_id: None,
        created_time: first_int(article, &["created_time", "created"]),
        updated_time: first_int(article, &["updated_time", "updated"]),
        voteup_count: int(article, "voteup_count"),
        comment_count: int(article, "comment_count"),
        source_keyword: keyword.to_string(),
        author: extract_author(field(article, "author")),
    })
}

fn extract_video(video: &Value, keyword: &str) -> Option<Content> {
    // search results carry zvideo_id; detail pages and listings carry id
    let content_id = first_text(video, &["zvideo_id", "id"]);
    if content_id.is_empty() {
        tracing::warn!("Dropping video without id");
        return None;
    }

    Some(Content {
        content_url: video_url(&content_id),
        content_id,
        content_type: ContentKind::Video,
        title: html_to_text(&text(video, "title")),
        content_text: String::new(),
        desc: html_to_text(&text(video, "description")),
        question_id: None,
        created_time: first_int(video, &["created_at", "published_at", "created_time"]),
        updated_time: first_int(video, &["updated_at", "updated_time"]),
        voteup_count: first_int(video, &["voteup_count", "vote_count"]),
        comment_count: int(video, "comment_count"),
        source_keyword: keyword.to_string(),
        author: extract_author(field(video, "author")),
    })
}

fn extract_content(object: &Value, kind: ContentKind, keyword: &str) -> Option<Content> {
    match kind {
        ContentKind::Answer => extract_answer(object, keyword),
        ContentKind::Article => extract_article(object, keyword),
        ContentKind::Video => extract_video(object, keyword),
    }
}

fn paging_is_end(json: &Value) -> bool {
    json.get("paging")
        .and_then(|p| p.get("is_end"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn data_array(json: &Value) -> &[Value] {
    json.get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Extracts one page of search results
///
/// Keeps items of type `search_result` or `zvideo`, then dispatches on the
/// nested object's type. Unknown object types are skipped.
///
/// # Arguments
///
/// * `json` - Decoded `search_v3` response
/// * `keyword` - Search keyword stamped on every record
/// * `page` - Page number that was requested
pub fn extract_search_page(json: &Value, keyword: &str, page: u32) -> Page<Content> {
    let items = data_array(json)
        .iter()
        .filter(|item| {
            matches!(
                item.get("type").and_then(Value::as_str),
                Some("search_result") | Some("zvideo")
            )
        })
        .filter_map(|item| item.get("object"))
        .filter_map(|object| {
            let kind = object
                .get("type")
                .and_then(Value::as_str)
                .and_then(ContentKind::parse);
            match kind {
                Some(kind) => extract_content(object, kind, keyword),
                None => {
                    tracing::debug!(object_type = ?object.get("type"), "Skipping search object");
                    None
                }
            }
        })
        .collect();

    Page::new(
        items,
        Cursor {
            next: page.saturating_add(1).to_string(),
            is_end: paging_is_end(json),
        },
    )
}

/// Offset query parameter of `paging.next`, empty when absent
pub fn extract_next_offset(json: &Value) -> String {
    json.get("paging")
        .and_then(|p| p.get("next"))
        .and_then(Value::as_str)
        .and_then(|next| Url::parse(next).ok())
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "offset")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_default()
}

fn ip_location(comment: &Value) -> String {
    comment
        .get("comment_tag")
        .and_then(Value::as_array)
        .and_then(|tags| {
            tags.iter()
                .find(|tag| tag.get("type").and_then(Value::as_str) == Some("ip_info"))
        })
        .map(|tag| text(tag, "text"))
        .unwrap_or_default()
}

fn extract_comment(comment: &Value, content: &Content, root: Option<&Comment>) -> Option<Comment> {
    let comment_id = text(comment, "id");
    if comment_id.is_empty() {
        tracing::warn!(content_id = %content.content_id, "Dropping comment without id");
        return None;
    }

    let parent_comment_id = root.map(|root| {
        let reply_to = text(comment, "reply_comment_id");
        if reply_to.is_empty() || reply_to == "0" {
            root.comment_id.clone()
        } else {
            reply_to
        }
    });

    Some(Comment {
        comment_id,
        content_id: content.content_id.clone(),
        content_type: content.content_type,
        parent_comment_id,
        content: html_to_text(&text(comment, "content")),
        publish_time: int(comment, "created_time"),
        sub_comment_count: int(comment, "child_comment_count"),
        like_count: int(comment, "like_count"),
        dislike_count: int(comment, "dislike_count"),
        ip_location: ip_location(comment),
        author: extract_author(field(comment, "author")),
    })
}

/// Extracts one page of root comments (`root == None`) or child comments of `root`
///
/// The cursor carries `paging.is_end` and the offset from `paging.next`. A
/// listing without a next offset cannot advance and is treated as ended.
pub fn extract_comment_page(json: &Value, content: &Content, root: Option<&Comment>) -> Page<Comment> {
    let items = data_array(json)
        .iter()
        .filter_map(|c| extract_comment(c, content, root))
        .collect();

    let next = extract_next_offset(json);
    Page::new(
        items,
        Cursor {
            is_end: paging_is_end(json) || next.is_empty(),
            next,
        },
    )
}

/// Extracts one page of a creator's authored content
///
/// Creator listings paginate by numeric offset, so the next cursor is `offset + limit`.
pub fn extract_creator_page(json: &Value, kind: ContentKind, offset: u64, limit: u32) -> Page<Content> {
    let items = data_array(json)
        .iter()
        .filter_map(|item| {
            let item_kind = item
                .get("type")
                .and_then(Value::as_str)
                .and_then(ContentKind::parse)
                .unwrap_or(kind);
            extract_content(item, item_kind, "")
        })
        .collect();

    Page::new(
        items,
        Cursor {
            next: (offset + u64::from(limit)).to_string(),
            is_end: paging_is_end(json),
        },
    )
}

/// Answer references from a question's answer listing; answers without id are skipped
pub fn extract_question_answer_refs(json: &Value, question_id: &str) -> Vec<ContentRef> {
    data_array(json)
        .iter()
        .filter_map(|answer| {
            let answer_id = text(answer, "id");
            if answer_id.is_empty() {
                tracing::warn!(question_id, "Skipping answer without id");
                return None;
            }
            Some(ContentRef::Answer {
                question_id: question_id.to_string(),
                answer_id,
            })
        })
        .collect()
}

// ===== Server-rendered pages =====

/// Parses `<script id="js-initialData">` and returns its `initialState`
pub fn extract_initial_state(html: &str) -> Option<Value> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("script#js-initialData").ok()?;
    let raw: String = document.select(&selector).next()?.text().collect();
    let json: Value = match serde_json::from_str(raw.trim()) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed js-initialData payload");
            return None;
        }
    };
    json.get("initialState").cloned()
}

/// Entity `id` from `initialState.entities.{collection}`
fn entity<'a>(state: &'a Value, collection: &str, id: &str) -> Option<&'a Value> {
    state.get("entities")?.get(collection)?.get(id)
}

/// Extracts an answer from its server-rendered page
pub fn extract_answer_from_html(html: &str, answer_id: &str) -> Option<Content> {
    let state = extract_initial_state(html)?;
    extract_answer(entity(&state, "answers", answer_id)?, "")
}

/// Extracts an article from its server-rendered page
pub fn extract_article_from_html(html: &str, article_id: &str) -> Option<Content> {
    let state = extract_initial_state(html)?;
    extract_article(entity(&state, "articles", article_id)?, "")
}

/// Extracts a video from its server-rendered page
pub fn extract_video_from_html(html: &str, video_id: &str) -> Option<Content> {
    let state = extract_initial_state(html)?;
    extract_video(entity(&state, "zvideos", video_id)?, "")
}

/// Extracts a creator profile from the `/people/{url_token}` page
pub fn extract_creator_from_html(html: &str, url_token: &str) -> Option<Creator> {
    let state = extract_initial_state(html)?;
    let user = entity(&state, "users", url_token)?;

    let user_id = text(user, "id");
    if user_id.is_empty() {
        tracing::warn!(url_token, "Dropping creator without id");
        return None;
    }

    let gender = match field(user, "gender").and_then(Value::as_i64) {
        Some(1) => "male",
        Some(0) => "female",
        _ => "unknown",
    };

    let token = text(user, "url_token");
    Some(Creator {
        user_id,
        url_token: if token.is_empty() {
            url_token.to_string()
        } else {
            token
        },
        nickname: text(user, "name"),
        avatar: text(user, "avatar_url"),
        gender: gender.to_string(),
        ip_location: text(user, "ip_info"),
        follows: int(user, "following_count"),
        fans: int(user, "follower_count"),
        answer_count: int(user, "answer_count"),
        video_count: int(user, "zvideo_count"),
        question_count: int(user, "question_count"),
        article_count: int(user, "articles_count"),
        column_count: int(user, "columns_count"),
        voteup_count: int(user, "voteup_count"),
    })
}
