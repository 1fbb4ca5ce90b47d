pub mod editor;
pub mod element;
pub mod status_bar;

pub use editor::Editor;
pub use element::{DisplayElement, ElementState, Page};
pub use status_bar::StatusLine;
