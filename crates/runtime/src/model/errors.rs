use thiserror::Error;

/// Errors from LLM provider calls.
///
/// No variant is retried; each is surfaced to the caller as-is.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A network error occurred during the API call.
    #[error("network: {0}")]
    Network(String),

    /// The provider rejected the request because of rate limits.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The LLM provider returned an error response.
    #[error("provider api: {0}")]
    Api(String),

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
