//! Clipboard adapter.
//!
//! Platform clipboards are reached through [`ClipboardBackend`]; the adapter
//! turns whatever the platform does into a plain `Result` so callers only
//! ever see [`Error::Clipboard`].

use std::sync::Arc;

use clipboard::{ClipboardContext, ClipboardProvider};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Asynchronous access to a platform clipboard
pub trait ClipboardBackend: Send + Sync {
    fn write_text(&self, text: String) -> BoxFuture<'_, Result<()>>;

    fn read_text(&self) -> BoxFuture<'_, Result<String>>;

    /// Whether reading is available on this platform
    fn supports_read(&self) -> bool {
        true
    }
}

/// The operating system clipboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn context() -> std::result::Result<ClipboardContext, String> {
        <ClipboardContext as ClipboardProvider>::new().map_err(|e| e.to_string())
    }
}

impl ClipboardBackend for SystemClipboard {
    fn write_text(&self, text: String) -> BoxFuture<'_, Result<()>> {
        async move {
            // The platform handle is not Send; it lives entirely on the blocking thread.
            let result = tokio::task::spawn_blocking(move || {
                let mut context = Self::context()?;
                context.set_contents(text).map_err(|e| e.to_string())
            })
            .await;

            match result {
                Ok(inner) => inner.map_err(Error::Clipboard),
                Err(e) => Err(Error::Clipboard(format!("Clipboard unavailable: {}", e))),
            }
        }
        .boxed()
    }

    fn read_text(&self) -> BoxFuture<'_, Result<String>> {
        async move {
            let result = tokio::task::spawn_blocking(|| {
                let mut context = Self::context()?;
                context.get_contents().map_err(|e| e.to_string())
            })
            .await;

            match result {
                Ok(inner) => inner.map_err(Error::Clipboard),
                Err(e) => Err(Error::Clipboard(format!("Clipboard unavailable: {}", e))),
            }
        }
        .boxed()
    }
}

/// Uniform success/failure wrapper over a clipboard backend
#[derive(Clone)]
pub struct ClipboardAdapter {
    backend: Arc<dyn ClipboardBackend>,
}

impl ClipboardAdapter {
    pub fn new(backend: Arc<dyn ClipboardBackend>) -> Self {
        Self { backend }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemClipboard))
    }

    pub fn supports_read(&self) -> bool {
        self.backend.supports_read()
    }

    pub async fn write(&self, text: &str) -> Result<()> {
        debug!(bytes = text.len(), "Writing to clipboard");
        self.backend
            .write_text(text.to_string())
            .await
            .inspect_err(|e| warn!("Clipboard write failed: {}", e))
    }

    pub async fn read(&self) -> Result<String> {
        if !self.backend.supports_read() {
            return Err(Error::Clipboard(
                "Clipboard reading is not supported".to_string(),
            ));
        }

        self.backend
            .read_text()
            .await
            .inspect_err(|e| warn!("Clipboard read failed: {}", e))
    }
}

impl std::fmt::Debug for ClipboardAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardAdapter")
            .field("supports_read", &self.backend.supports_read())
            .finish()
    }
}
