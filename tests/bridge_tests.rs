//! Integration tests for the command bridge
//!
//! Drives the registered commands through the buffer engine, the way key
//! presses and ex-commands reach them in the editor

mod common;

use std::sync::Arc;

use serde_json::json;
use tokio_test::assert_ok;
use tokio_util::task::TaskTracker;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

use common::{clipboard, session_config, RecordingClipboard};
use vimbin::api::{ApiClient, SaveCoordinator};
use vimbin::bridge::{CommandBridge, SessionActions};
use vimbin::config::{KeyTarget, KeymapConfig};
use vimbin::engine::{BufferEngine, KeyResolution, ModalEngine};
use vimbin::status::{StatusKind, StatusNotifier, DEFAULT_CLEAR_DELAY};
use vimbin::widgets::DisplayElement;

struct Harness {
    engine: BufferEngine,
    clipboard: Arc<RecordingClipboard>,
    notifier: StatusNotifier,
    status: DisplayElement,
    tracker: TaskTracker,
}

impl Harness {
    fn new(text: &str, server: &MockServer, backend: RecordingClipboard) -> Self {
        let engine = BufferEngine::new(text);
        let backend = Arc::new(backend);
        let status = DisplayElement::new("status");
        let notifier = StatusNotifier::new(status.clone(), DEFAULT_CLEAR_DELAY);
        let saver = SaveCoordinator::new(ApiClient::new(session_config(server)).unwrap());
        let actions = SessionActions::new(
            engine.document(),
            saver,
            clipboard(&backend),
            notifier.clone(),
        );
        let tracker = TaskTracker::new();
        CommandBridge::install(&engine, &actions, &KeymapConfig::default(), &tracker);

        Self {
            engine,
            clipboard: backend,
            notifier,
            status,
            tracker,
        }
    }

    async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    fn select(&self, from: (usize, usize), to: (usize, usize)) {
        self.engine.with_buffer_mut(|b| {
            b.cursor_pos = from;
            b.start_selection(false);
            b.cursor_pos = to;
        });
    }
}

#[tokio::test]
async fn test_write_command_saves_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save"))
        .and(body_json(json!({ "content": "hello\nworld" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Bytes-Written", "42")
                .set_body_json(json!({ "status": "saved" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let harness = Harness::new("hello\nworld", &server, RecordingClipboard::default());

    assert_ok!(harness.engine.execute_ex(":w"));
    harness.settle().await;
    assert_eq!(harness.status.text(), "42B written");

    harness.notifier.clear();
    assert_ok!(harness.engine.execute_ex(":x"));
    harness.settle().await;
    assert_eq!(harness.status.text(), "42B written");
}

#[tokio::test]
async fn test_write_failure_shows_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/save"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let harness = Harness::new("abc", &server, RecordingClipboard::default());
    assert_ok!(harness.engine.execute_ex("write"));
    harness.settle().await;

    let message = harness.notifier.current().unwrap();
    assert_eq!(message.kind, StatusKind::Error);
    assert_eq!(message.text, "ERROR: Save failed. Reason: Service Unavailable");
}

#[tokio::test]
async fn test_append_command_appends_document() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/append"))
        .and(body_json(json!({ "content": "more" })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Bytes-Written", "4")
                .set_body_json(json!({ "status": "appended" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let harness = Harness::new("more", &server, RecordingClipboard::default());

    assert_ok!(harness.engine.execute_ex(":append"));
    harness.settle().await;
    assert_eq!(harness.status.text(), "4B written");

    harness.notifier.clear();
    assert_ok!(harness.engine.execute_ex(":a"));
    harness.settle().await;
    assert_eq!(harness.status.text(), "4B written");
}

#[tokio::test]
async fn test_yank_without_selection_skips_clipboard() {
    let server = MockServer::start().await;
    let harness = Harness::new("foo bar", &server, RecordingClipboard::default());

    assert_ok!(harness.engine.run_action("yankToClipboard"));
    harness.settle().await;

    assert!(harness.clipboard.writes().is_empty());
    assert_eq!(harness.status.text(), "No text selected to yank");
}

#[tokio::test]
async fn test_yank_writes_selection_once() {
    let server = MockServer::start().await;
    let harness = Harness::new("foo bar", &server, RecordingClipboard::default());
    harness.select((0, 0), (0, 2));

    assert_ok!(harness.engine.run_action("yankToClipboard"));
    harness.settle().await;

    assert_eq!(harness.clipboard.writes(), vec!["foo".to_string()]);
    assert_eq!(harness.status.text(), "Text yanked to clipboard");
}

#[tokio::test]
async fn test_yank_failure_is_reported() {
    let server = MockServer::start().await;
    let harness = Harness::new("foo", &server, RecordingClipboard::failing("permission denied"));
    harness.select((0, 0), (0, 2));

    assert_ok!(harness.engine.run_action("yankToClipboard"));
    harness.settle().await;

    let message = harness.notifier.current().unwrap();
    assert_eq!(message.kind, StatusKind::Error);
    assert_eq!(message.text, "ERROR: permission denied");
}

#[tokio::test]
async fn test_paste_inserts_at_cursor() {
    let server = MockServer::start().await;
    let harness = Harness::new("ac", &server, RecordingClipboard::with_contents("b"));
    harness.engine.with_buffer_mut(|b| b.cursor_pos = (0, 1));

    assert_ok!(harness.engine.run_action("pasteFromClipboard"));
    harness.settle().await;

    assert_eq!(harness.engine.document().text(), "abc");
    assert_eq!(harness.status.text(), "Pasted from clipboard");
}

#[tokio::test]
async fn test_paste_lands_at_cursor_when_inserted() {
    let server = MockServer::start().await;
    let harness = Harness::new("ac", &server, RecordingClipboard::with_contents("b"));
    harness.engine.with_buffer_mut(|b| b.cursor_pos = (0, 0));

    assert_ok!(harness.engine.run_action("pasteFromClipboard"));
    // The cursor moves before the paste task gets to run
    harness.engine.with_buffer_mut(|b| b.cursor_pos = (0, 2));
    harness.settle().await;

    assert_eq!(harness.engine.document().text(), "acb");
}

#[tokio::test]
async fn test_paste_keeps_selection() {
    let server = MockServer::start().await;
    let harness = Harness::new("xyz", &server, RecordingClipboard::with_contents("--"));
    harness.select((0, 0), (0, 1));

    assert_ok!(harness.engine.run_action("pasteFromClipboard"));
    harness.settle().await;

    // Inserted before the cursor's character, nothing replaced
    assert_eq!(harness.engine.document().text(), "x--yz");
}

#[tokio::test]
async fn test_paste_empty_clipboard() {
    let server = MockServer::start().await;
    let harness = Harness::new("abc", &server, RecordingClipboard::default());

    assert_ok!(harness.engine.run_action("pasteFromClipboard"));
    harness.settle().await;

    assert_eq!(harness.engine.document().text(), "abc");
    assert_eq!(harness.status.text(), "Clipboard is empty");
}

#[tokio::test]
async fn test_paste_not_defined_without_clipboard_read() {
    let server = MockServer::start().await;
    let harness = Harness::new("abc", &server, RecordingClipboard::write_only());

    assert!(harness.engine.has_action("yankToClipboard"));
    assert!(!harness.engine.has_action("pasteFromClipboard"));
    assert!(!harness.engine.is_mapped("<Space>p"));
}

#[tokio::test]
async fn test_default_keymap_is_applied() {
    let server = MockServer::start().await;
    let harness = Harness::new("abc", &server, RecordingClipboard::default());

    assert!(harness.engine.has_ex("write"));
    assert!(harness.engine.has_ex("x"));
    assert!(harness.engine.has_ex("append"));
    assert_eq!(harness.engine.resolve_keys("<Space>"), KeyResolution::Pending);
    assert_eq!(
        harness.engine.resolve_keys("<Space>y"),
        KeyResolution::Matched(KeyTarget::Action("yankToClipboard".to_string()))
    );
    assert_eq!(
        harness.engine.resolve_keys("<Space><Space>"),
        KeyResolution::Matched(KeyTarget::Keys("l".to_string()))
    );
}
