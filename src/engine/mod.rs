//! Narrow interface to the modal editing engine.
//!
//! The session never depends on a concrete engine. It reads document
//! snapshots through [`EditorDocument`] and extends the engine through
//! [`ModalEngine`]: ex-commands, actions, key mappings and the mode signal.
//! [`BufferEngine`] implements both for the terminal host.

mod buffer_engine;

pub use buffer_engine::{BufferEngine, EngineError, KeyResolution};

use std::sync::Arc;

use crate::config::KeyTarget;

/// Callback bound to an ex-command or an action
pub type CommandHandler = Arc<dyn Fn() + Send + Sync>;

/// Callback notified on every mode change
pub type ModeListener = Arc<dyn Fn(&ModeChange) + Send + Sync>;

/// Mode signal as the engine reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeChange {
    /// Engine mode name, e.g. `normal`, `insert`, `visual`
    pub mode: String,
    /// Sub-mode; non-empty for linewise visual selections
    pub sub_mode: Option<String>,
}

impl ModeChange {
    pub fn new(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            sub_mode: None,
        }
    }

    pub fn with_sub_mode(mut self, sub_mode: &str) -> Self {
        self.sub_mode = Some(sub_mode.to_string());
        self
    }
}

/// Read access to the live document plus the single insertion paste needs
pub trait EditorDocument: Send + Sync {
    /// Full document text
    fn text(&self) -> String;

    /// Text of the primary selection, empty when nothing is selected
    fn selection_text(&self) -> String;

    /// Byte offset of the primary cursor
    fn cursor_offset(&self) -> usize;

    /// 1-based line of the primary cursor
    fn cursor_line(&self) -> usize;

    fn line_count(&self) -> usize;

    /// Insert text at the primary cursor without replacing any selection.
    /// Returns the offset the text landed at.
    fn insert_at_cursor(&self, text: &str) -> usize;
}

/// Command-extension surface of a modal engine
pub trait ModalEngine: Send + Sync {
    fn document(&self) -> Arc<dyn EditorDocument>;

    /// Register `:name`, reachable by any abbreviation starting with `prefix`
    fn define_ex(&self, name: &str, prefix: &str, handler: CommandHandler);

    fn define_action(&self, name: &str, handler: CommandHandler);

    fn map_keys(&self, keys: &str, target: KeyTarget);

    /// Remove a mapping; returns whether one existed
    fn unmap(&self, keys: &str) -> bool;

    fn on_mode_change(&self, listener: ModeListener);
}
