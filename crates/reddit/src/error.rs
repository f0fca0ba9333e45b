//! Reddit client and tool errors.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RedditError {
    /// A required credential is missing from the environment.
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("network error: {0}")]
    Network(String),

    /// Credentials were rejected or the token lacks access.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited by Reddit")]
    RateLimited,

    #[error("API error: {0}")]
    Api(String),

    #[error("invalid response: {0}")]
    Decode(String),

    /// The worker thread running a blocking call panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, RedditError>;
