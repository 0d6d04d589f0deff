//! Orchestrator tests
//!
//! These run the coordinator against a scripted source and an in-memory sink,
//! checking pagination, ordering, failure containment and the concurrency bound.

use crate::support::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use sumi_harvest::config::CrawlMode;
use sumi_harvest::crawler::{ContentRef, Coordinator};
use sumi_harvest::model::ContentKind;
use sumi_harvest::storage::MemorySink;
use sumi_harvest::{Creator, Cursor, HarvestError, Page};

fn coordinator(
    source: &Arc<StubSource>,
    sink: &Arc<MemorySink>,
    settings: sumi_harvest::crawler::CrawlSettings,
) -> Coordinator {
    Coordinator::new(source.clone(), sink.clone(), settings)
}

#[tokio::test]
async fn test_search_single_final_page_makes_one_call() {
    let source = Arc::new(StubSource {
        search_pages: vec![
            Page::new(answers("a", 20), Cursor::end()),
            Page::new(answers("b", 20), Cursor::end()),
        ],
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.max_items = 20;
    settings.enable_comments = false;

    let stats = coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(source.count("search:"), 1);
    assert_eq!(sink.contents().len(), 20);
    assert_eq!(stats.contents, 20);
    assert!(sink.contents().iter().all(|c| c.source_keyword == "python"));
}

#[tokio::test]
async fn test_search_stops_on_empty_page() {
    let source = Arc::new(StubSource {
        search_pages: vec![open_page(answers("a", 2), 2)],
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.enable_comments = false;

    coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(
        source.calls(),
        vec!["search:python:1".to_string(), "search:python:2".to_string()]
    );
    assert_eq!(sink.contents().len(), 2);
}

#[tokio::test]
async fn test_search_truncates_to_max_items() {
    let source = Arc::new(StubSource {
        search_pages: vec![
            open_page(answers("a", 20), 2),
            open_page(answers("b", 20), 3),
            open_page(answers("c", 20), 4),
        ],
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.max_items = 30;
    settings.enable_comments = false;

    coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(source.count("search:"), 2);
    assert_eq!(sink.contents().len(), 30);
}

#[tokio::test]
async fn test_search_starts_at_configured_page() {
    let source = Arc::new(StubSource {
        search_pages: paged(vec![answers("a", 1), answers("b", 1), answers("c", 1)]),
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.start_page = 3;
    settings.enable_comments = false;

    coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(source.calls(), vec!["search:python:3".to_string()]);
    assert_eq!(sink.contents()[0].content_id, "c0");
}

#[tokio::test]
async fn test_failed_keyword_does_not_stop_others() {
    let source = Arc::new(StubSource {
        search_pages: paged(vec![answers("a", 3)]),
        failing_keywords: ["rust".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.keywords = vec!["rust".to_string(), "python".to_string()];
    settings.enable_comments = false;

    coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(
        source.calls(),
        vec!["search:rust:1".to_string(), "search:python:1".to_string()]
    );
    assert_eq!(sink.contents().len(), 3);
}

#[tokio::test]
async fn test_comment_end_flag_stops_paging() {
    let mut roots = HashMap::new();
    // A second page exists but the first one reports the end
    roots.insert(
        "a0".to_string(),
        vec![
            Page::new(vec![root("r1", 0)], Cursor::end()),
            Page::new(vec![root("r2", 0)], Cursor::end()),
        ],
    );
    let source = Arc::new(StubSource {
        search_pages: paged(vec![answers("a", 1)]),
        roots,
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    coordinator(&source, &sink, settings(CrawlMode::Search))
        .run()
        .await
        .unwrap();

    assert_eq!(source.count("roots:"), 1);
    assert_eq!(sink.comments().len(), 1);
}

#[tokio::test]
async fn test_root_order_preserved_and_zero_subcomments_skip_children() {
    let mut roots = HashMap::new();
    roots.insert(
        "a0".to_string(),
        paged(vec![
            vec![root("r1", 0), root("r2", 2)],
            vec![root("r3", 0)],
        ]),
    );
    let mut children = HashMap::new();
    children.insert(
        "r2".to_string(),
        paged(vec![vec![child("c1", "r2")], vec![child("c2", "r2")]]),
    );

    let source = Arc::new(StubSource {
        search_pages: paged(vec![answers("a", 1)]),
        roots,
        children,
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let stats = coordinator(&source, &sink, settings(CrawlMode::Search))
        .run()
        .await
        .unwrap();

    let batches: Vec<Vec<String>> = sink
        .comment_batches()
        .into_iter()
        .map(|(content_id, ids)| {
            assert_eq!(content_id, "a0");
            ids
        })
        .collect();
    assert_eq!(
        batches,
        vec![
            vec!["r1".to_string(), "r2".to_string()],
            vec!["c1".to_string()],
            vec!["c2".to_string()],
            vec!["r3".to_string()],
        ]
    );

    // Only r2 has replies
    assert_eq!(source.count("children:r2:"), 2);
    assert_eq!(source.count("children:"), 2);
    assert_eq!(stats.comments, 5);
}

#[tokio::test]
async fn test_sub_comments_can_be_disabled() {
    let mut roots = HashMap::new();
    roots.insert("a0".to_string(), paged(vec![vec![root("r1", 4)]]));
    let source = Arc::new(StubSource {
        search_pages: paged(vec![answers("a", 1)]),
        roots,
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.enable_sub_comments = false;
    coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(source.count("children:"), 0);
    assert_eq!(sink.comments().len(), 1);
}

#[tokio::test]
async fn test_forbidden_terminates_run() {
    let source = Arc::new(StubSource {
        search_pages: paged(vec![answers("a", 2)]),
        forbidden_roots: true,
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.keywords = vec!["python".to_string(), "rust".to_string()];

    let err = coordinator(&source, &sink, settings).run().await.unwrap_err();

    assert!(matches!(err, HarvestError::Forbidden(_)));
    assert_eq!(source.count("search:"), 1);
    // Records stored before the ban stay stored
    assert_eq!(sink.contents().len(), 2);
}

#[tokio::test]
async fn test_concurrency_bound_across_items() {
    let mut roots = HashMap::new();
    for content in answers("a", 5) {
        roots.insert(content.content_id.clone(), paged(vec![vec![root("r", 0)]]));
    }
    let source = Arc::new(StubSource {
        search_pages: paged(vec![answers("a", 5)]),
        roots,
        root_delay: Duration::from_millis(50),
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.max_concurrency = 2;
    coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(source.count("roots:"), 5);
    assert_eq!(source.max_in_flight(), 2);
    assert_eq!(sink.comments().len(), 5);
}

#[tokio::test]
async fn test_failed_thread_leaves_siblings_unaffected() {
    let mut roots = HashMap::new();
    for content in answers("a", 3) {
        let id = content.content_id.clone();
        roots.insert(id.clone(), paged(vec![vec![root(&format!("r-{}", id), 0)]]));
    }
    let source = Arc::new(StubSource {
        search_pages: paged(vec![answers("a", 3)]),
        roots,
        failing_roots: ["a1".to_string()].into_iter().collect(),
        root_delay: Duration::from_millis(20),
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Search);
    settings.max_concurrency = 2;
    let stats = coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(source.count("roots:"), 3);
    let mut threads: Vec<String> = sink
        .comment_batches()
        .into_iter()
        .map(|(content_id, _)| content_id)
        .collect();
    threads.sort();
    assert_eq!(threads, vec!["a0".to_string(), "a2".to_string()]);
    assert_eq!(stats.comments, 2);
    assert_eq!(stats.contents, 3);
}

#[tokio::test]
async fn test_detail_mode_skips_unknown_urls() {
    let mut details = HashMap::new();
    details.insert("222".to_string(), answer("222"));
    details.insert("333".to_string(), answer("333"));

    let source = Arc::new(StubSource {
        details,
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Detail);
    settings.enable_comments = false;
    settings.specified_urls = vec![
        "https://www.zhihu.com/question/111/answer/222?utm_source=x".to_string(),
        "https://www.zhihu.com/people/someone".to_string(),
        "https://www.zhihu.com/question/111/answer/333".to_string(),
        "https://zhuanlan.zhihu.com/p/444".to_string(),
    ];

    let stats = coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(
        source.calls(),
        vec![
            "detail:222".to_string(),
            "detail:333".to_string(),
            "detail:444".to_string(),
        ]
    );
    let ids: Vec<String> = sink.contents().into_iter().map(|c| c.content_id).collect();
    assert_eq!(ids, vec!["222".to_string(), "333".to_string()]);
    // One unknown shape plus one empty detail page
    assert_eq!(stats.skipped, 2);
}

#[tokio::test]
async fn test_creator_mode_pages_until_end() {
    let mut creators = HashMap::new();
    creators.insert(
        "someone".to_string(),
        Creator {
            user_id: "u1".to_string(),
            url_token: "someone".to_string(),
            nickname: "Someone".to_string(),
            ..Default::default()
        },
    );
    let mut authored = HashMap::new();
    authored.insert(
        "someone".to_string(),
        paged(vec![answers("a", 2), answers("b", 1)]),
    );

    let source = Arc::new(StubSource {
        creators,
        authored,
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Creator);
    settings.creator_urls = vec!["https://www.zhihu.com/people/someone".to_string()];

    let stats = coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(source.count("authored:someone:answer:"), 2);
    assert_eq!(sink.creators().len(), 1);
    assert_eq!(sink.content_count(ContentKind::Answer), 3);
    // Comments are fetched for the aggregate set
    assert_eq!(source.count("roots:"), 3);
    assert_eq!(stats.creators, 1);
}

#[tokio::test]
async fn test_question_mode_fetches_each_answer() {
    let mut details = HashMap::new();
    details.insert("a1".to_string(), answer("a1"));
    details.insert("a2".to_string(), answer("a2"));

    let source = Arc::new(StubSource {
        details,
        question_refs: vec![
            ContentRef::Answer {
                question_id: "q1".to_string(),
                answer_id: "a1".to_string(),
            },
            ContentRef::Answer {
                question_id: "q1".to_string(),
                answer_id: "a2".to_string(),
            },
        ],
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::new());

    let mut settings = settings(CrawlMode::Question);
    settings.question_url = "https://www.zhihu.com/question/q1".to_string();

    coordinator(&source, &sink, settings).run().await.unwrap();

    assert_eq!(source.count("answers:q1"), 1);
    assert_eq!(source.count("detail:"), 2);
    assert_eq!(sink.contents().len(), 2);
}

#[test]
fn test_run_future_is_send() {
    fn require_send<T: Send>(_: T) {}

    let source = Arc::new(StubSource::default());
    let sink = Arc::new(MemorySink::new());
    let coordinator = coordinator(&source, &sink, settings(CrawlMode::Detail));
    require_send(coordinator.run());
}
