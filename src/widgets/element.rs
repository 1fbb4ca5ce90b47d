//! Display elements: the mount points the session writes into.
//!
//! An element holds a text content and a set of class markers, the same two
//! things a page element exposes. Handles are cheap to clone and share one
//! underlying state.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ElementState {
    pub text: String,
    pub classes: BTreeSet<String>,
}

/// Shared handle to a display element
#[derive(Debug, Clone)]
pub struct DisplayElement {
    id: Arc<str>,
    state: Arc<RwLock<ElementState>>,
}

impl DisplayElement {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(RwLock::new(ElementState::default())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.write().text = text.into();
    }

    pub fn text(&self) -> String {
        self.read().text.clone()
    }

    pub fn add_class(&self, class: &str) {
        self.write().classes.insert(class.to_string());
    }

    pub fn remove_classes(&self, classes: &[&str]) {
        let mut state = self.write();
        for class in classes {
            state.classes.remove(*class);
        }
    }

    /// Swap text and class markers in one step, so readers never see a mix
    /// of the old and new state
    pub fn replace(&self, text: impl Into<String>, remove: &[&str], add: Option<&str>) {
        let mut state = self.write();
        for class in remove {
            state.classes.remove(*class);
        }
        if let Some(class) = add {
            state.classes.insert(class.to_string());
        }
        state.text = text.into();
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.read().classes.contains(class)
    }

    pub fn classes(&self) -> Vec<String> {
        self.read().classes.iter().cloned().collect()
    }

    /// Copy of the current text and classes
    pub fn snapshot(&self) -> ElementState {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ElementState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, ElementState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The page the session is mounted on
#[derive(Debug, Clone)]
pub struct Page {
    /// Status message sink
    pub status: DisplayElement,
    /// Mode indicator sink
    pub mode: DisplayElement,
}

impl Page {
    pub fn new() -> Self {
        Self {
            status: DisplayElement::new("status"),
            mode: DisplayElement::new("vim-mode"),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}
