//! Vim-style editing session for a vimbin server

pub mod api;
pub mod app;
pub mod bridge;
pub mod buffer;
pub mod clipboard;
pub mod config;
pub mod engine;
pub mod error;
pub mod line_numbers;
pub mod session;
pub mod status;
pub mod ui;
pub mod widgets;

// Re-export main types for convenience
pub use app::{App, CommandMode};
pub use buffer::Buffer;
pub use error::{Error, Result};
pub use session::Session;
