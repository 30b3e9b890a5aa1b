use std::time::Duration;

use thiserror::Error;

/// Failure of a single upstream window request.
///
/// Only transport problems are errors, including a body that stops mid-read.
/// A bad status or a body that is not a JSON list of persons is
/// reported as an empty window by the client, never as an `ApiError`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Maximum length for response bodies echoed into log lines
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Classify a reqwest failure, keeping timeouts distinct.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout)
        } else if err.is_connect() {
            ApiError::Connection(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }

    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut cut = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
    }
}
