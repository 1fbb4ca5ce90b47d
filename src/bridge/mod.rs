//! Bridges between the modal engine and the rest of the session.
//!
//! [`CommandBridge`] registers the save/yank/paste commands and the
//! configured key mappings; [`ModeDisplay`] mirrors the engine's mode
//! signal onto the mode element.

mod commands;
mod mode;

pub use commands::{CommandBridge, SessionActions};
pub use mode::{ModeDisplay, ModeIndicator};
