//! Client side of the vimbin content protocol.
//!
//! - `GET /fetch` returns the stored document as plain text
//! - `POST /save` replaces it, `POST /append` appends to it; both answer with
//!   `{"status": ...}` and report the stored size in `X-Bytes-Written`
//!
//! Every request carries the session's API token in `X-API-Token`.

pub mod loader;
pub mod save;

pub use loader::{ContentLoader, LoadOutcome};
pub use save::{SaveCoordinator, SaveOutcome};

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::error::Result;

/// Header carrying the API token
pub const TOKEN_HEADER: &str = "X-API-Token";

/// Header carrying the stored size after a write
pub const BYTES_WRITTEN_HEADER: &str = "X-Bytes-Written";

/// `status` value the server uses when the stored content did not change
pub const NO_CHANGES_STATUS: &str = "no changes";

/// Body of `/save` and `/append`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentRequest<'a> {
    pub content: &'a str,
}

/// Body of a `/save` or `/append` response
#[derive(Debug, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub status: Option<String>,
}

/// HTTP client bound to one server and token
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: SessionConfig,
    http: Client,
}

impl ApiClient {
    pub fn new(config: SessionConfig) -> Result<Self> {
        let http = Client::builder()
            .danger_accept_invalid_certs(config.skip_insecure_verify)
            .build()?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.http
            .get(self.config.endpoint(path))
            .headers(self.default_headers())
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.http
            .post(self.config.endpoint(path))
            .headers(self.default_headers())
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match HeaderValue::from_str(&self.config.token) {
            Ok(token) => {
                headers.insert(TOKEN_HEADER, token);
            }
            Err(_) => tracing::warn!("API token is not a valid header value; sending without it"),
        }
        headers
    }
}
