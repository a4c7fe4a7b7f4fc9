use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API error: {status} {reason}")]
    RequestFailed {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("Decode error: {0}")]
    DecodeFailed(String),

    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ApiError {
    /// HTTP status of a rejected request, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::DecodeFailed(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::DecodeFailed(err.to_string())
    }
}
