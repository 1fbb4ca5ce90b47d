use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::debug;

use super::{CommandHandler, EditorDocument, ModalEngine, ModeChange, ModeListener};
use crate::buffer::Buffer;
use crate::config::KeyTarget;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Not an editor command: {0}")]
    UnknownEx(String),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

/// Outcome of looking up a pending key sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    Matched(KeyTarget),
    /// The sequence is the start of a longer mapping
    Pending,
    Unmapped,
}

struct ExCommand {
    name: String,
    prefix: String,
    handler: CommandHandler,
}

impl ExCommand {
    fn matches(&self, input: &str) -> bool {
        input.starts_with(&self.prefix) && self.name.starts_with(input)
    }
}

struct Registry {
    ex_commands: Vec<ExCommand>,
    actions: HashMap<String, CommandHandler>,
    keymap: BTreeMap<String, KeyTarget>,
    listeners: Vec<ModeListener>,
    mode: ModeChange,
}

impl Default for Registry {
    fn default() -> Self {
        // Space moves right until something claims it
        let keymap = BTreeMap::from([("<Space>".to_string(), KeyTarget::Keys("l".to_string()))]);

        Self {
            ex_commands: Vec::new(),
            actions: HashMap::new(),
            keymap,
            listeners: Vec::new(),
            mode: ModeChange::new("normal"),
        }
    }
}

/// Document side of the engine
struct SharedBuffer {
    buffer: RwLock<Buffer>,
}

impl SharedBuffer {
    fn read(&self) -> RwLockReadGuard<'_, Buffer> {
        self.buffer.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Buffer> {
        self.buffer.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EditorDocument for SharedBuffer {
    fn text(&self) -> String {
        self.read().content_as_string()
    }

    fn selection_text(&self) -> String {
        self.read().get_selected_text().unwrap_or_default()
    }

    fn cursor_offset(&self) -> usize {
        self.read().cursor_offset()
    }

    fn cursor_line(&self) -> usize {
        self.read().cursor_pos.0 + 1
    }

    fn line_count(&self) -> usize {
        self.read().line_count()
    }

    fn insert_at_cursor(&self, text: &str) -> usize {
        let mut buffer = self.write();
        let offset = buffer.cursor_offset();
        buffer.insert_str_at(offset, text);
        offset
    }
}

/// In-process modal engine over a [`Buffer`]
#[derive(Clone)]
pub struct BufferEngine {
    document: Arc<SharedBuffer>,
    registry: Arc<RwLock<Registry>>,
}

impl BufferEngine {
    pub fn new(text: &str) -> Self {
        Self {
            document: Arc::new(SharedBuffer {
                buffer: RwLock::new(Buffer::from_text(text)),
            }),
            registry: Arc::new(RwLock::new(Registry::default())),
        }
    }

    pub fn with_buffer<R>(&self, f: impl FnOnce(&Buffer) -> R) -> R {
        f(&self.document.read())
    }

    pub fn with_buffer_mut<R>(&self, f: impl FnOnce(&mut Buffer) -> R) -> R {
        f(&mut self.document.write())
    }

    /// Run an ex-command line such as `:w` or `write`
    pub fn execute_ex(&self, line: &str) -> Result<(), EngineError> {
        let input = line.trim().trim_start_matches(':').trim();
        let command = input.split_whitespace().next().unwrap_or_default();

        let handler = self
            .registry()
            .ex_commands
            .iter()
            .find(|ex| !command.is_empty() && ex.matches(command))
            .map(|ex| Arc::clone(&ex.handler));

        match handler {
            Some(handler) => {
                debug!("Running ex-command '{}'", command);
                handler();
                Ok(())
            }
            None => Err(EngineError::UnknownEx(input.to_string())),
        }
    }

    pub fn run_action(&self, name: &str) -> Result<(), EngineError> {
        let handler = self.registry().actions.get(name).cloned();
        match handler {
            Some(handler) => {
                debug!("Running action '{}'", name);
                handler();
                Ok(())
            }
            None => Err(EngineError::UnknownAction(name.to_string())),
        }
    }

    /// Look up a pending key sequence in the keymap
    pub fn resolve_keys(&self, keys: &str) -> KeyResolution {
        let registry = self.registry();
        if let Some(target) = registry.keymap.get(keys) {
            return KeyResolution::Matched(target.clone());
        }

        let is_prefix = registry
            .keymap
            .range(keys.to_string()..)
            .next()
            .is_some_and(|(mapped, _)| mapped.starts_with(keys));
        if is_prefix {
            KeyResolution::Pending
        } else {
            KeyResolution::Unmapped
        }
    }

    pub fn is_mapped(&self, keys: &str) -> bool {
        self.registry().keymap.contains_key(keys)
    }

    pub fn has_ex(&self, name: &str) -> bool {
        self.registry().ex_commands.iter().any(|ex| ex.name == name)
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.registry().actions.contains_key(name)
    }

    pub fn mode(&self) -> ModeChange {
        self.registry().mode.clone()
    }

    /// Switch mode and notify listeners when it actually changed
    pub fn set_mode(&self, change: ModeChange) {
        let listeners = {
            let mut registry = self.registry_mut();
            if registry.mode == change {
                return;
            }
            registry.mode = change.clone();
            registry.listeners.clone()
        };

        for listener in listeners {
            listener(&change);
        }
    }

    fn registry(&self) -> RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn registry_mut(&self) -> RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ModalEngine for BufferEngine {
    fn document(&self) -> Arc<dyn EditorDocument> {
        self.document.clone()
    }

    fn define_ex(&self, name: &str, prefix: &str, handler: CommandHandler) {
        let mut registry = self.registry_mut();
        registry.ex_commands.retain(|ex| ex.name != name);
        registry.ex_commands.push(ExCommand {
            name: name.to_string(),
            prefix: prefix.to_string(),
            handler,
        });
    }

    fn define_action(&self, name: &str, handler: CommandHandler) {
        self.registry_mut()
            .actions
            .insert(name.to_string(), handler);
    }

    fn map_keys(&self, keys: &str, target: KeyTarget) {
        self.registry_mut().keymap.insert(keys.to_string(), target);
    }

    fn unmap(&self, keys: &str) -> bool {
        self.registry_mut().keymap.remove(keys).is_some()
    }

    fn on_mode_change(&self, listener: ModeListener) {
        self.registry_mut().listeners.push(listener);
    }
}
