//! Classification of user-supplied Zhihu URLs

use crate::crawler::ContentRef;
use url::Url;

/// Classifies an answer, article or video URL
///
/// The query string and fragment are ignored. Returns `None` for any other shape.
///
/// # Example
///
/// ```
/// use sumi_harvest::crawler::ContentRef;
/// use sumi_harvest::platform::zhihu::classify_content_url;
///
/// assert_eq!(
///     classify_content_url("https://zhuanlan.zhihu.com/p/123?utm=x"),
///     Some(ContentRef::Article { id: "123".to_string() })
/// );
/// ```
pub fn classify_content_url(raw: &str) -> Option<ContentRef> {
    let url = Url::parse(raw.trim()).ok()?;
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect();

    match segments.as_slice() {
        ["question", question_id, "answer", answer_id] => Some(ContentRef::Answer {
            question_id: question_id.to_string(),
            answer_id: answer_id.to_string(),
        }),
        ["p", id] => Some(ContentRef::Article { id: id.to_string() }),
        ["zvideo", id] => Some(ContentRef::Video { id: id.to_string() }),
        _ => None,
    }
}

/// Url token of a creator profile link: its last non-empty path segment
pub fn creator_url_token(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let path = match Url::parse(trimmed) {
        Ok(url) => url.path().to_string(),
        Err(_) => trimmed.to_string(),
    };
    path.split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}

/// Question id from a question URL or a bare id
pub fn question_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim().split(['?', '#']).next().unwrap_or_default();
    trimmed
        .split('/')
        .filter(|s| !s.is_empty())
        .next_back()
        .map(str::to_string)
}
