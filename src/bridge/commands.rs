use std::future::Future;
use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::api::{SaveCoordinator, SaveOutcome};
use crate::clipboard::ClipboardAdapter;
use crate::config::{KeyTarget, KeymapConfig};
use crate::engine::{CommandHandler, EditorDocument, ModalEngine};
use crate::status::StatusNotifier;

pub const YANK_ACTION: &str = "yankToClipboard";
pub const PASTE_ACTION: &str = "pasteFromClipboard";

/// The boundary operations the editor commands trigger. Each one reports
/// through the status notifier and never returns an error.
#[derive(Clone)]
pub struct SessionActions {
    document: Arc<dyn EditorDocument>,
    saver: SaveCoordinator,
    clipboard: ClipboardAdapter,
    notifier: StatusNotifier,
}

impl SessionActions {
    pub fn new(
        document: Arc<dyn EditorDocument>,
        saver: SaveCoordinator,
        clipboard: ClipboardAdapter,
        notifier: StatusNotifier,
    ) -> Self {
        Self {
            document,
            saver,
            clipboard,
            notifier,
        }
    }

    pub fn notifier(&self) -> &StatusNotifier {
        &self.notifier
    }

    pub fn clipboard(&self) -> &ClipboardAdapter {
        &self.clipboard
    }

    /// Save the whole document and show the outcome
    pub async fn write(&self) -> SaveOutcome {
        let content = self.document.text();
        let outcome = self.saver.save(&content).await;
        let (kind, text) = outcome.status();
        self.notifier.show(kind, text);
        outcome
    }

    /// Append the whole document to the stored one and show the outcome
    pub async fn append(&self) -> SaveOutcome {
        let content = self.document.text();
        let outcome = self.saver.append(&content).await;
        let (kind, text) = outcome.status();
        self.notifier.show(kind, text);
        outcome
    }

    pub async fn yank_to_clipboard(&self) {
        let selection = self.document.selection_text();
        if selection.is_empty() {
            self.notifier.info("No text selected to yank");
            return;
        }

        match self.clipboard.write(&selection).await {
            Ok(()) => {
                debug!(bytes = selection.len(), "Yanked selection");
                self.notifier.info("Text yanked to clipboard");
            }
            Err(e) => self.notifier.error(format!("ERROR: {}", e)),
        }
    }

    pub async fn paste_from_clipboard(&self) {
        let text = match self.clipboard.read().await {
            Ok(text) => text,
            Err(e) => {
                self.notifier.error(format!("ERROR: {}", e));
                return;
            }
        };

        if text.is_empty() {
            self.notifier.info("Clipboard is empty");
            return;
        }

        let offset = self.document.insert_at_cursor(&text);
        debug!(offset, bytes = text.len(), "Pasted clipboard text");
        self.notifier.info("Pasted from clipboard");
    }
}

/// Registers the session's commands against a modal engine
pub struct CommandBridge;

impl CommandBridge {
    /// Define `:write`, `:x`, `:append` and the clipboard actions, then apply the keymap.
    /// Handlers run their work as tracked tasks so the caller can wait for it.
    pub fn install(
        engine: &dyn ModalEngine,
        actions: &SessionActions,
        keymap: &KeymapConfig,
        tracker: &TaskTracker,
    ) {
        let write = Self::handler(actions, tracker, |actions| async move {
            actions.write().await;
        });
        engine.define_ex("write", "w", Arc::clone(&write));
        engine.define_ex("x", "x", write);
        engine.define_ex(
            "append",
            "a",
            Self::handler(actions, tracker, |actions| async move {
                actions.append().await;
            }),
        );

        engine.define_action(
            YANK_ACTION,
            Self::handler(actions, tracker, |actions| async move {
                actions.yank_to_clipboard().await;
            }),
        );

        if actions.clipboard().supports_read() {
            engine.define_action(
                PASTE_ACTION,
                Self::handler(actions, tracker, |actions| async move {
                    actions.paste_from_clipboard().await;
                }),
            );
        } else {
            info!("Clipboard reading unsupported; {} not defined", PASTE_ACTION);
        }

        for (keys, target) in &keymap.bindings {
            if let KeyTarget::Action(name) = target {
                if name == PASTE_ACTION && !actions.clipboard().supports_read() {
                    continue;
                }
            }
            debug!("Mapping {} -> {:?}", keys, target);
            engine.map_keys(keys, target.clone());
        }

        for keys in &keymap.unmap {
            if !engine.unmap(keys) {
                debug!("Nothing mapped to {}", keys);
            }
        }

        info!(
            bindings = keymap.bindings.len(),
            unmapped = keymap.unmap.len(),
            "Installed editor commands"
        );
    }

    fn handler<F, Fut>(actions: &SessionActions, tracker: &TaskTracker, run: F) -> CommandHandler
    where
        F: Fn(SessionActions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let actions = actions.clone();
        let tracker = tracker.clone();
        Arc::new(move || {
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                warn!("No async runtime; command dropped");
                return;
            };
            tracker.spawn_on(run(actions.clone()), &runtime);
        })
    }
}
