// src/github/error.rs
// =============================================================================
// Error type for GitHub API calls.
//
// The application layer wraps these in anyhow, but keeping a typed error
// here lets callers tell "not found" apart from "network down" (the first is
// an empty state, the second offers a retry).
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    /// 404 from the API (unknown user, repository or missing README)
    #[error("not found: {0}")]
    NotFound(String),

    /// 403/429 with the rate limit exhausted
    #[error("GitHub API rate limit exceeded, try again later or configure a token")]
    RateLimited,

    /// Any other non-success status
    #[error("GitHub API error ({status}): {message}")]
    Status { status: StatusCode, message: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),

    /// The body was not the JSON we expected
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid token value")]
    InvalidToken,
}

impl GithubError {
    /// Categorizes a transport-level reqwest error.
    pub fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            GithubError::Timeout(error.to_string())
        } else {
            GithubError::Network(error.to_string())
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GithubError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, GithubError>;
