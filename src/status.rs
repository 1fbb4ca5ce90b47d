//! Transient status line with a single slot and an auto-clear timer.
//!
//! The notifier is the only writer of the status element. Every `show`
//! cancels the pending timer before installing the new message, and each
//! timer carries the generation it was started for, so a timer that already
//! woke up can never clear a newer message.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::widgets::element::DisplayElement;

/// Class marker for error messages
pub const ERROR_CLASS: &str = "isError";

/// Class marker for "no changes" messages
pub const NO_CHANGES_CLASS: &str = "noChanges";

const STATUS_CLASSES: [&str; 2] = [ERROR_CLASS, NO_CHANGES_CLASS];

/// Default delay before a message clears itself
pub const DEFAULT_CLEAR_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
    NoChange,
}

impl StatusKind {
    fn class(self) -> Option<&'static str> {
        match self {
            StatusKind::Info => None,
            StatusKind::Error => Some(ERROR_CLASS),
            StatusKind::NoChange => Some(NO_CHANGES_CLASS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusState {
    Idle,
    Showing(StatusMessage),
}

#[derive(Debug, Default)]
struct Slot {
    current: Option<StatusMessage>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Owner of the status element and its expiry timer
#[derive(Debug, Clone)]
pub struct StatusNotifier {
    element: DisplayElement,
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl StatusNotifier {
    pub fn new(element: DisplayElement, delay: Duration) -> Self {
        Self {
            element,
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn info(&self, text: impl Into<String>) {
        self.show(StatusKind::Info, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.show(StatusKind::Error, text);
    }

    /// Replace whatever is showing with a new message and restart the timer
    pub fn show(&self, kind: StatusKind, text: impl Into<String>) {
        let text = text.into();
        let mut slot = self.lock();

        if let Some(timer) = slot.timer.take() {
            timer.abort();
            debug!("Replaced pending status timer");
        }
        slot.generation = slot.generation.wrapping_add(1);

        self.element.replace(text.clone(), &STATUS_CLASSES, kind.class());
        slot.current = Some(StatusMessage { text, kind });

        slot.timer = self.start_timer(slot.generation);
    }

    /// Cancel the timer and clear the element right away
    pub fn clear(&self) {
        let mut slot = self.lock();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.generation = slot.generation.wrapping_add(1);
        Self::reset(&self.element, &mut slot);
    }

    pub fn state(&self) -> StatusState {
        match &self.lock().current {
            Some(message) => StatusState::Showing(message.clone()),
            None => StatusState::Idle,
        }
    }

    pub fn current(&self) -> Option<StatusMessage> {
        self.lock().current.clone()
    }

    fn start_timer(&self, generation: u64) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime; status message will not auto-clear");
            return None;
        };

        let slot = Arc::clone(&self.slot);
        let element = self.element.clone();
        let delay = self.delay;

        Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;

            let mut slot = slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.generation != generation {
                return;
            }
            slot.timer = None;
            Self::reset(&element, &mut slot);
        }))
    }

    fn reset(element: &DisplayElement, slot: &mut Slot) {
        slot.current = None;
        element.replace("", &STATUS_CLASSES, None);
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> (StatusNotifier, DisplayElement) {
        let element = DisplayElement::new("status");
        (StatusNotifier::new(element.clone(), DEFAULT_CLEAR_DELAY), element)
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_sets_text_and_marker() {
        let (status, element) = notifier();

        status.show(StatusKind::Error, "ERROR: boom");
        assert_eq!(element.text(), "ERROR: boom");
        assert!(element.has_class(ERROR_CLASS));

        status.show(StatusKind::NoChange, "No changes were made.");
        assert!(!element.has_class(ERROR_CLASS));
        assert!(element.has_class(NO_CHANGES_CLASS));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_is_immediate() {
        let (status, element) = notifier();
        status.info("42B written");
        status.clear();

        assert_eq!(status.state(), StatusState::Idle);
        assert_eq!(element.text(), "");
        assert!(element.classes().is_empty());
    }

    #[test]
    fn test_error_marker_always_matches_text() {
        let (status, element) = notifier();
        let writer = {
            let status = status.clone();
            std::thread::spawn(move || {
                for i in 0..20_000 {
                    if i % 2 == 0 {
                        status.error("ERROR: boom");
                    } else {
                        status.info("42B written");
                    }
                }
            })
        };

        while !writer.is_finished() {
            let state = element.snapshot();
            assert_eq!(state.text.starts_with("ERROR"), state.classes.contains(ERROR_CLASS));
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_show_without_runtime_keeps_message() {
        let (status, element) = notifier();
        status.info("hello");
        assert_eq!(element.text(), "hello");
        assert!(matches!(status.state(), StatusState::Showing(_)));
    }
}
