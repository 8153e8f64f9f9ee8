use reqwest::StatusCode;

/// Errors seen by API clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status; carries the server's
    /// error message when it sent one
    #[error("{0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::HttpStatus(status, _) => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}
