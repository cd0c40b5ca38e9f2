// Error types for slackstat.
// Covers Slack API failures, configuration problems, and cache I/O.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlackstatError {
    #[error("Slack API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Slack API method {method} failed: {error}")]
    Api { method: String, error: String },

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Rate limit exceeded, retry after {retry_after}s")]
    RateLimited { retry_after: u64 },

    #[error("Missing SLACK_API_TOKEN environment variable")]
    MissingToken,

    #[error("Connection check failed: {0}")]
    ConnectionFailed(String),

    #[error("No user named {0:?} in the workspace")]
    UnknownUser(String),

    #[error("No channel named {0:?} in the workspace")]
    UnknownChannel(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SlackstatError>;
