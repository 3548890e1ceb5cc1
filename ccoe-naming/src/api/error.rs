use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Request timeout after {0} seconds")]
    Timeout(f64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API returned error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ApiError {
    /// The record is confirmed absent on the naming service. Collection
    /// level 404s are reported as `Status` by `NamingApi`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}
