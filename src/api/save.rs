use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, trace, warn};

use super::{ApiClient, ContentRequest, WriteResponse, BYTES_WRITTEN_HEADER, NO_CHANGES_STATUS};
use crate::error::{Error, Result};
use crate::status::StatusKind;

/// Classified result of one save or append
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The server stored the content. `size_reported` is false when the
    /// response lacked `X-Bytes-Written`, in which case `bytes` is 0.
    Written { bytes: u64, size_reported: bool },
    /// The submitted content already matched what is stored
    NoChange,
    Failed { reason: String },
    /// Another save was still in flight and saves are serialized
    Busy,
}

impl SaveOutcome {
    /// Status line text and kind for this outcome
    pub fn status(&self) -> (StatusKind, String) {
        match self {
            SaveOutcome::Written {
                bytes,
                size_reported: true,
            } => (StatusKind::Info, format!("{}B written", bytes)),
            SaveOutcome::Written {
                bytes,
                size_reported: false,
            } => (
                StatusKind::Info,
                format!("{}B written (server did not report a size)", bytes),
            ),
            SaveOutcome::NoChange => (StatusKind::NoChange, "No changes were made.".to_string()),
            SaveOutcome::Failed { reason } => (StatusKind::Error, format!("ERROR: {}", reason)),
            SaveOutcome::Busy => (StatusKind::Info, "Save already in progress".to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Save,
    Append,
}

impl WriteKind {
    fn path(self) -> &'static str {
        match self {
            WriteKind::Save => "/save",
            WriteKind::Append => "/append",
        }
    }

    fn action(self) -> &'static str {
        match self {
            WriteKind::Save => "Save",
            WriteKind::Append => "Append",
        }
    }
}

/// Sends the full document to the server and classifies the answer
#[derive(Debug, Clone)]
pub struct SaveCoordinator {
    client: ApiClient,
    serialize: bool,
    in_flight: Arc<AtomicUsize>,
}

impl SaveCoordinator {
    pub fn new(client: ApiClient) -> Self {
        let serialize = client.config().serialize_saves;
        Self {
            client,
            serialize,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Replace the stored document with `content`
    pub async fn save(&self, content: &str) -> SaveOutcome {
        self.write(WriteKind::Save, content).await
    }

    /// Append `content` to the stored document
    pub async fn append(&self, content: &str) -> SaveOutcome {
        self.write(WriteKind::Append, content).await
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    async fn write(&self, kind: WriteKind, content: &str) -> SaveOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, self.serialize) else {
            debug!("{} skipped, another one is in flight", kind.action());
            return SaveOutcome::Busy;
        };

        let outcome = match self.send(kind, content).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(class = ?e.class(), "{} failed: {}", kind.action(), e);
                SaveOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        info!("{} outcome: {:?}", kind.action(), outcome);
        outcome
    }

    async fn send(&self, kind: WriteKind, content: &str) -> Result<SaveOutcome> {
        debug!(bytes = content.len(), "POST {}", kind.path());
        trace!("Sending content: {}", content);

        let response = self
            .client
            .post(kind.path())
            .json(&ContentRequest { content })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::rejected(kind.action(), status));
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("application/json"));
        if !is_json {
            return Err(Error::NotJson);
        }

        let bytes_written = response
            .headers()
            .get(BYTES_WRITTEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let body = response.bytes().await?;
        let parsed: WriteResponse = serde_json::from_slice(&body)?;

        if parsed.status.as_deref() == Some(NO_CHANGES_STATUS) {
            return Ok(SaveOutcome::NoChange);
        }

        Ok(match bytes_written {
            Some(bytes) => SaveOutcome::Written {
                bytes,
                size_reported: true,
            },
            None => {
                warn!("Response is missing {}", BYTES_WRITTEN_HEADER);
                SaveOutcome::Written {
                    bytes: 0,
                    size_reported: false,
                }
            }
        })
    }
}

/// Counts one write as in flight until dropped
struct InFlightGuard<'a> {
    count: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    /// With `exclusive`, fails when another write is already in flight
    fn acquire(count: &'a AtomicUsize, exclusive: bool) -> Option<Self> {
        if exclusive {
            count
                .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                .ok()?;
        } else {
            count.fetch_add(1, Ordering::AcqRel);
        }
        Some(Self { count })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }
}
