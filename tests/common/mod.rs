//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use wiremock::MockServer;

use vimbin::clipboard::{ClipboardAdapter, ClipboardBackend};
use vimbin::config::SessionConfig;
use vimbin::error::{Error, Result};

pub const TOKEN: &str = "test-token";

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn session_config(server: &MockServer) -> SessionConfig {
    SessionConfig::new(server.uri(), TOKEN)
}

/// Clipboard double that records every write
#[derive(Default)]
pub struct RecordingClipboard {
    pub writes: Mutex<Vec<String>>,
    pub contents: Mutex<String>,
    pub failure: Option<String>,
    pub read_unsupported: bool,
}

impl RecordingClipboard {
    pub fn with_contents(text: &str) -> Self {
        Self {
            contents: Mutex::new(text.to_string()),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn write_only() -> Self {
        Self {
            read_unsupported: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl ClipboardBackend for RecordingClipboard {
    fn write_text(&self, text: String) -> BoxFuture<'_, Result<()>> {
        async move {
            self.writes.lock().unwrap().push(text.clone());
            if let Some(message) = &self.failure {
                return Err(Error::Clipboard(message.clone()));
            }
            *self.contents.lock().unwrap() = text;
            Ok(())
        }
        .boxed()
    }

    fn read_text(&self) -> BoxFuture<'_, Result<String>> {
        async move {
            if let Some(message) = &self.failure {
                return Err(Error::Clipboard(message.clone()));
            }
            Ok(self.contents.lock().unwrap().clone())
        }
        .boxed()
    }

    fn supports_read(&self) -> bool {
        !self.read_unsupported
    }
}

pub fn clipboard(backend: &Arc<RecordingClipboard>) -> ClipboardAdapter {
    ClipboardAdapter::new(backend.clone())
}
