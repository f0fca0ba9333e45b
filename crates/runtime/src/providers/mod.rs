//! LLM provider adapters.
//!
//! Each provider implements [`Backend`](crate::model::Backend) for its
//! specific API, owning the translation between the shared message model and
//! its wire format.

mod anthropic;
mod openai;

pub use anthropic::{AnthropicBackend, AnthropicBackendBuilder};
pub use openai::{OpenAiBackend, OpenAiBackendBuilder};

use crate::model::ModelError;
use reqwest::StatusCode;

/// Map a non-success HTTP status to a model error.
pub(crate) fn status_error(status: StatusCode, body: String) -> ModelError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ModelError::RateLimited(body)
    } else {
        ModelError::Api(format!("{status}: {body}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_requests_is_rate_limited() {
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, "slow down".into());
        assert!(matches!(err, ModelError::RateLimited(_)));

        let err = status_error(StatusCode::UNAUTHORIZED, "nope".into());
        assert_eq!(err.to_string(), "provider api: 401 Unauthorized: nope");
    }
}
