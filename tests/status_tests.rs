//! Integration tests for the status notifier timer
//!
//! Uses a paused clock so expiry can be checked to the millisecond

use std::time::Duration;

use vimbin::status::{StatusKind, StatusNotifier, StatusState, DEFAULT_CLEAR_DELAY, ERROR_CLASS};
use vimbin::widgets::DisplayElement;

fn notifier() -> (StatusNotifier, DisplayElement) {
    let element = DisplayElement::new("status");
    (
        StatusNotifier::new(element.clone(), DEFAULT_CLEAR_DELAY),
        element,
    )
}

/// Let spawned timer tasks run up to their next await point
async fn run_pending() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

async fn advance(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    run_pending().await;
}

#[tokio::test(start_paused = true)]
async fn test_message_clears_after_delay() {
    let (status, element) = notifier();

    status.info("Text yanked to clipboard");
    run_pending().await;

    advance(4999).await;
    assert_eq!(element.text(), "Text yanked to clipboard");

    advance(2).await;
    assert_eq!(element.text(), "");
    assert_eq!(status.state(), StatusState::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_errors_are_not_sticky() {
    let (status, element) = notifier();

    status.error("ERROR: Save failed. Reason: Service Unavailable");
    run_pending().await;
    assert!(element.has_class(ERROR_CLASS));

    advance(5001).await;
    assert_eq!(element.text(), "");
    assert!(!element.has_class(ERROR_CLASS));
}

#[tokio::test(start_paused = true)]
async fn test_replacing_message_restarts_timer() {
    let (status, element) = notifier();

    status.info("first");
    run_pending().await;
    advance(3000).await;

    status.show(StatusKind::NoChange, "second");
    run_pending().await;

    // The first timer would have fired here
    advance(2500).await;
    assert_eq!(element.text(), "second");

    advance(2499).await;
    assert_eq!(element.text(), "second");

    advance(2).await;
    assert_eq!(element.text(), "");
}

#[tokio::test(start_paused = true)]
async fn test_clear_cancels_timer() {
    let (status, element) = notifier();

    status.info("first");
    run_pending().await;
    status.clear();
    assert_eq!(element.text(), "");

    status.info("second");
    run_pending().await;
    advance(4000).await;
    assert_eq!(element.text(), "second");
}

#[tokio::test(start_paused = true)]
async fn test_custom_delay() {
    let element = DisplayElement::new("status");
    let status = StatusNotifier::new(element.clone(), Duration::from_millis(100));

    status.info("short");
    run_pending().await;
    advance(101).await;
    assert_eq!(element.text(), "");
}
