use tracing::{debug, info, trace, warn};

use super::ApiClient;
use crate::error::{Error, Result};

/// Result of the initial fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Content { text: String },
    Failed { reason: String },
}

impl LoadOutcome {
    /// Document text to mount the editor with; empty after a failure
    pub fn into_text(self) -> String {
        match self {
            LoadOutcome::Content { text } => text,
            LoadOutcome::Failed { .. } => String::new(),
        }
    }

    /// Status line text for a failed load
    pub fn failure_message(&self) -> Option<String> {
        match self {
            LoadOutcome::Content { .. } => None,
            LoadOutcome::Failed { reason } => {
                Some(format!("ERROR: Fetch failed. Reason: {}", reason))
            }
        }
    }
}

/// Fetches the stored document once, at session start
#[derive(Debug, Clone)]
pub struct ContentLoader {
    client: ApiClient,
}

impl ContentLoader {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Issue a single `GET /fetch`; never retried
    pub async fn load(&self) -> LoadOutcome {
        match self.fetch().await {
            Ok(text) => {
                info!(bytes = text.len(), "Loaded document");
                trace!("Loaded content: {}", text);
                LoadOutcome::Content { text }
            }
            Err(Error::Rejected { reason, .. }) => {
                warn!("Fetch rejected: {}", reason);
                LoadOutcome::Failed { reason }
            }
            Err(e) => {
                warn!("Fetch failed: {}", e);
                LoadOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn fetch(&self) -> Result<String> {
        debug!("GET /fetch");
        let response = self.client.get("/fetch").send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::rejected("Fetch", status));
        }

        // 204 means nothing is stored yet
        Ok(response.text().await?)
    }
}
