//! Error taxonomy shared by every boundary operation.
//!
//! Nothing here is fatal: the loader, the save coordinator and the clipboard
//! actions fold these errors into an outcome value or a status message, so the
//! editing session keeps running after any of them.

use thiserror::Error;

/// Errors raised while talking to the content server or the clipboard
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-success status
    #[error("{action} failed. Reason: {reason}")]
    Rejected { action: &'static str, reason: String },

    /// The request never produced a response (unreachable host, reset, TLS)
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// The response did not declare a JSON content type
    #[error("Response was not JSON")]
    NotJson,

    /// The response declared JSON but the body could not be decoded
    #[error("Malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// The platform clipboard refused the operation or is not available
    #[error("{0}")]
    Clipboard(String),
}

/// Coarse failure classes, used for logging and for picking a status kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transport,
    Protocol,
    Clipboard,
}

impl Error {
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Rejected { .. } | Error::Network(_) => ErrorClass::Transport,
            Error::NotJson | Error::MalformedBody(_) => ErrorClass::Protocol,
            Error::Clipboard(_) => ErrorClass::Clipboard,
        }
    }

    pub(crate) fn rejected(action: &'static str, status: reqwest::StatusCode) -> Self {
        Error::Rejected {
            action,
            reason: status_text(status),
        }
    }
}

/// Reason phrase for a status code, falling back to the numeric code
pub fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_owned)
        .unwrap_or_else(|| status.as_str().to_owned())
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_rejected_message_carries_reason_phrase() {
        let err = Error::rejected("Save", StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "Save failed. Reason: Service Unavailable");
        assert_eq!(err.class(), ErrorClass::Transport);
    }

    #[test]
    fn test_protocol_errors() {
        assert_eq!(Error::NotJson.to_string(), "Response was not JSON");
        assert_eq!(Error::NotJson.class(), ErrorClass::Protocol);

        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(Error::from(bad).class(), ErrorClass::Protocol);
    }

    #[test]
    fn test_unknown_status_falls_back_to_code() {
        let status = StatusCode::from_u16(599).unwrap();
        assert_eq!(status_text(status), "599");
    }
}
