//! Session controller: loads the document, mounts the engine and wires the
//! bridges to the page.

use tokio_util::task::TaskTracker;
use tracing::info;

use crate::api::{ApiClient, ContentLoader, SaveCoordinator};
use crate::bridge::{CommandBridge, ModeDisplay, SessionActions};
use crate::clipboard::ClipboardAdapter;
use crate::config::SessionConfig;
use crate::engine::ModalEngine;
use crate::error::Result;
use crate::line_numbers::RelativeLineNumbers;
use crate::status::StatusNotifier;
use crate::widgets::element::Page;

pub struct Session<E> {
    config: SessionConfig,
    page: Page,
    engine: E,
    notifier: StatusNotifier,
    tracker: TaskTracker,
}

impl<E: ModalEngine> Session<E> {
    /// Fetch the stored document and mount an engine on it.
    ///
    /// A failed fetch still mounts the engine, on an empty document, and
    /// leaves the failure on the status line.
    pub async fn start<F>(
        config: SessionConfig,
        page: Page,
        clipboard: ClipboardAdapter,
        mount: F,
    ) -> Result<Self>
    where
        F: FnOnce(&str) -> E,
    {
        let client = ApiClient::new(config.clone())?;
        let notifier = StatusNotifier::new(page.status.clone(), config.clear_delay);

        let outcome = ContentLoader::new(client.clone()).load().await;
        if let Some(message) = outcome.failure_message() {
            notifier.error(message);
        }
        let engine = mount(&outcome.into_text());

        let actions = SessionActions::new(
            engine.document(),
            SaveCoordinator::new(client),
            clipboard,
            notifier.clone(),
        );
        let tracker = TaskTracker::new();

        CommandBridge::install(&engine, &actions, &config.keymap, &tracker);
        ModeDisplay::new(page.mode.clone()).attach(&engine);

        info!(url = %config.base_url, "Session started");
        Ok(Self {
            config,
            page,
            engine,
            notifier,
            tracker,
        })
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn notifier(&self) -> &StatusNotifier {
        &self.notifier
    }

    pub fn line_numbers(&self) -> RelativeLineNumbers {
        RelativeLineNumbers::new(self.config.cursor_line_label)
    }

    /// Number of command tasks still running
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every command task started so far has finished
    pub async fn settle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
