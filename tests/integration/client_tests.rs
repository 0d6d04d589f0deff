//! API client tests
//!
//! These use wiremock to stand in for the remote API and check response
//! classification, retries, signing and an end-to-end question crawl.

use crate::support::settings;
use std::sync::Arc;
use std::time::Duration;
use sumi_harvest::config::CrawlMode;
use sumi_harvest::crawler::Coordinator;
use sumi_harvest::platform::zhihu::{Endpoints, RetryPolicy, Signer, ZhihuClient};
use sumi_harvest::session::Session;
use sumi_harvest::storage::MemorySink;
use sumi_harvest::HarvestError;
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COOKIES: &str = "d_c0=fingerprint|1700000000; z_c0=token";

/// Client pointed at the mock server for both hosts, with a short retry delay
fn client_for(server: &MockServer, cookies: &str) -> ZhihuClient {
    let endpoints = Endpoints {
        main: server.uri(),
        zhuanlan: server.uri(),
    };
    ZhihuClient::new(
        Session::parse(cookies).snapshot(),
        Signer::new("zst-token"),
        endpoints,
        Duration::from_secs(5),
        None,
    )
    .expect("client builds")
    .with_retry(RetryPolicy {
        attempts: 3,
        delay: Duration::from_millis(10),
    })
}

fn answer_page(question_id: &str, answer_id: &str) -> String {
    format!(
        r#"<html><body><script id="js-initialData" type="text/json">{{"initialState":{{"entities":{{"answers":{{"{a}":{{"id":"{a}","content":"<p>answer {a}</p>","voteupCount":3,"question":{{"id":"{q}","title":"The question"}},"author":{{"id":"u1","urlToken":"someone","name":"Someone"}}}}}}}}}}}}</script></body></html>"#,
        a = answer_id,
        q = question_id
    )
}

#[tokio::test]
async fn test_not_found_yields_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, COOKIES);
    let json = client.get_json("/api/v4/missing", &[]).await.unwrap();
    assert!(json.as_object().unwrap().is_empty());

    let refs = client.question_answer_refs("q1").await.unwrap();
    assert!(refs.is_empty());
}

#[tokio::test]
async fn test_forbidden_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/search_v3"))
        .respond_with(ResponseTemplate::new(403).set_body_string("banned"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, COOKIES);
    let err = client.search_page("python", 1).await.unwrap_err();
    assert!(matches!(err, HarvestError::Forbidden(_)));
}

#[tokio::test]
async fn test_two_failures_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/me"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"uid": "abc", "name": "Someone"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, COOKIES);
    let json = client.get_json("/api/v4/me", &[]).await.unwrap();
    assert_eq!(json["name"], "Someone");
}

#[tokio::test]
async fn test_three_failures_surface_data_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, COOKIES);
    let err = client.get_json("/api/v4/me", &[]).await.unwrap_err();
    assert!(matches!(err, HarvestError::DataFetch(_)));
}

#[tokio::test]
async fn test_embedded_error_is_data_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"error": {"code": 10003, "message": "request parameter error"}}"#,
        ))
        .mount(&server)
        .await;

    let client = client_for(&server, COOKIES);
    match client.get_json("/api/v4/me", &[]).await {
        Err(HarvestError::DataFetch(message)) => assert_eq!(message, "request parameter error"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_fingerprint_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, "z_c0=token");
    let err = client.get_json("/api/v4/me", &[]).await.unwrap_err();
    assert!(matches!(err, HarvestError::Signing(_)));
}

#[tokio::test]
async fn test_requests_carry_signature_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/search_v3"))
        .and(query_param("q", "python"))
        .and(query_param("offset", "20"))
        .and(query_param("limit", "20"))
        .and(header("x-zse-93", "101_3_3.0"))
        .and(header("x-zst-81", "zst-token"))
        .and(header_exists("x-zse-96"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data": [], "paging": {"is_end": true, "next": ""}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, COOKIES);
    let page = client.search_page("python", 2).await.unwrap();
    assert!(page.items.is_empty());
    assert!(page.cursor.is_end);
}

#[tokio::test]
async fn test_articles_route_to_column_host() {
    let main = MockServer::start().await;
    let column = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/123"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&column)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&main)
        .await;

    let client = ZhihuClient::new(
        Session::parse(COOKIES).snapshot(),
        Signer::default(),
        Endpoints {
            main: main.uri(),
            zhuanlan: column.uri(),
        },
        Duration::from_secs(5),
        None,
    )
    .unwrap();

    assert!(client.article_info("123").await.unwrap().is_none());
}

#[tokio::test]
async fn test_pong_reports_login_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"uid": "abc", "name": "Someone"}"#),
        )
        .mount(&server)
        .await;
    assert!(client_for(&server, COOKIES).pong().await);

    let anonymous = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&anonymous)
        .await;
    assert!(!client_for(&anonymous, COOKIES).pong().await);
}

#[tokio::test]
async fn test_question_crawl_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/questions/42/answers"))
        .and(query_param("order_by", "created"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data": [{"id": "a1"}, {"id": ""}, {"id": 2}], "paging": {"is_end": true}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    for answer_id in ["a1", "2"] {
        Mock::given(method("GET"))
            .and(path(format!("/question/42/answer/{}", answer_id)))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(answer_page("42", answer_id)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let source = Arc::new(client_for(&server, COOKIES));
    let sink = Arc::new(MemorySink::new());
    let mut settings = settings(CrawlMode::Question);
    settings.question_url = "https://www.zhihu.com/question/42".to_string();

    let stats = Coordinator::new(source, sink.clone(), settings)
        .run()
        .await
        .unwrap();

    let contents = sink.contents();
    assert_eq!(stats.contents, 2);
    assert_eq!(contents.len(), 2);
    assert_eq!(contents[0].content_id, "a1");
    assert_eq!(contents[0].title, "The question");
    assert_eq!(contents[0].question_id.as_deref(), Some("42"));
    assert_eq!(contents[0].author.url_token, "someone");
    assert_eq!(contents[1].content_id, "2");
}
