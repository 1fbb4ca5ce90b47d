use std::sync::Arc;

use tracing::trace;

use crate::engine::{ModalEngine, ModeChange};
use crate::widgets::element::DisplayElement;

/// Every class the mode element can carry
pub const MODE_CLASSES: [&str; 5] = ["normal", "insert", "visual", "visual-line", "unknown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeIndicator {
    Normal,
    Insert,
    Visual,
    VisualLine,
    Unknown,
}

impl ModeIndicator {
    pub fn from_change(change: &ModeChange) -> Self {
        let linewise = change
            .sub_mode
            .as_deref()
            .is_some_and(|sub_mode| !sub_mode.is_empty());

        match change.mode.as_str() {
            "normal" => ModeIndicator::Normal,
            "insert" => ModeIndicator::Insert,
            "visual" if linewise => ModeIndicator::VisualLine,
            "visual" => ModeIndicator::Visual,
            _ => ModeIndicator::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ModeIndicator::Normal => "NORMAL",
            ModeIndicator::Insert => "INSERT",
            ModeIndicator::Visual => "VISUAL",
            ModeIndicator::VisualLine => "V-LINE",
            ModeIndicator::Unknown => "UNKNOWN",
        }
    }

    pub fn class(self) -> &'static str {
        match self {
            ModeIndicator::Normal => "normal",
            ModeIndicator::Insert => "insert",
            ModeIndicator::Visual => "visual",
            ModeIndicator::VisualLine => "visual-line",
            ModeIndicator::Unknown => "unknown",
        }
    }
}

/// Mirrors the engine mode onto the mode element
#[derive(Debug, Clone)]
pub struct ModeDisplay {
    element: DisplayElement,
}

impl ModeDisplay {
    pub fn new(element: DisplayElement) -> Self {
        Self { element }
    }

    pub fn update(&self, change: &ModeChange) -> ModeIndicator {
        let indicator = ModeIndicator::from_change(change);
        trace!("Mode changed to {:?}", indicator);

        self.element.replace(indicator.label(), &MODE_CLASSES, Some(indicator.class()));
        indicator
    }

    /// Show the normal mode and follow the engine from now on
    pub fn attach(self, engine: &dyn ModalEngine) {
        self.update(&ModeChange::new("normal"));
        engine.on_mode_change(Arc::new(move |change: &ModeChange| {
            self.update(change);
        }));
    }
}
