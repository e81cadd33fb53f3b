use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection-level failure: nothing is listening at the base URL.
    #[error("API is not reachable at {url}")]
    Unreachable {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// The liveness probe answered, but not with `200`.
    #[error("API is not active: GET / answered {status}")]
    NotReady { status: u16 },

    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ApiError::Unreachable { .. })
    }
}
