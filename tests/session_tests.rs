//! Integration tests for session startup
//!
//! Covers mounting after a good and a failed fetch, and the mode sink

mod common;

use std::sync::Arc;

use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use common::{clipboard, init_logging, session_config, RecordingClipboard};
use vimbin::engine::{BufferEngine, ModalEngine, ModeChange};
use vimbin::status::ERROR_CLASS;
use vimbin::widgets::Page;
use vimbin::Session;

async fn start(server: &MockServer) -> Session<BufferEngine> {
    let backend = Arc::new(RecordingClipboard::default());
    Session::start(
        session_config(server),
        Page::new(),
        clipboard(&backend),
        BufferEngine::new,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_start_mounts_fetched_document() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abc"))
        .expect(1)
        .mount(&server)
        .await;

    let session = start(&server).await;

    assert_eq!(session.engine().document().text(), "abc");
    assert_eq!(session.page().status.text(), "");
    assert_eq!(session.page().mode.text(), "NORMAL");
    assert!(session.page().mode.has_class("normal"));
}

#[tokio::test]
async fn test_failed_fetch_mounts_empty_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fetch"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/save"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Bytes-Written", "0")
                .set_body_json(json!({ "status": "saved" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = start(&server).await;

    assert_eq!(session.engine().document().text(), "");
    assert_eq!(
        session.page().status.text(),
        "ERROR: Fetch failed. Reason: Internal Server Error"
    );
    assert!(session.page().status.has_class(ERROR_CLASS));

    // The session stays usable
    session.engine().execute_ex(":w").unwrap();
    session.settle().await;
    assert_eq!(session.page().status.text(), "0B written");
    assert!(!session.page().status.has_class(ERROR_CLASS));
}

#[tokio::test]
async fn test_mode_sink_follows_engine() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_string("abc"))
        .mount(&server)
        .await;

    let session = start(&server).await;
    let mode = &session.page().mode;

    session.engine().set_mode(ModeChange::new("insert"));
    assert_eq!(mode.text(), "INSERT");

    session
        .engine()
        .set_mode(ModeChange::new("visual").with_sub_mode("linewise"));
    assert_eq!(mode.text(), "V-LINE");
    assert_eq!(mode.classes(), vec!["visual-line".to_string()]);

    session.engine().set_mode(ModeChange::new("replace"));
    assert_eq!(mode.text(), "UNKNOWN");
}

#[tokio::test]
async fn test_line_numbers_follow_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a\nb\nc"))
        .mount(&server)
        .await;

    let session = start(&server).await;
    let numbers = session.line_numbers();
    let total = session.engine().document().line_count();

    assert_eq!(numbers.label(1, 1, total), "0");
    assert_eq!(numbers.label(3, 1, total), "2");
    assert_eq!(session.pending(), 0);
}
