//! TextGenerator trait

use serde::{Deserialize, Serialize};

/// Result type for generation operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Generation error types. `is_transient()` is the retry gate: only
/// transient failures are ever retried.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("timeout")]
    Timeout,

    #[error("retry exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GeneratorError {
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Unavailable(_) | Self::Timeout => true,
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::RetryExhausted { .. } => true,
            _ => false,
        }
    }
}

/// Options forwarded with every completion call. Part of the cache key.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// The content-generation collaborator. Assumed slow and unreliable; every
/// implementation routes calls through the retry/cache path.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> GeneratorResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transience_classification() {
        assert!(GeneratorError::RateLimited { retry_after_ms: 100 }.is_transient());
        assert!(GeneratorError::Unavailable("503".into()).is_transient());
        assert!(GeneratorError::Timeout.is_transient());
        assert!(!GeneratorError::AuthFailed("bad key".into()).is_transient());
        assert!(!GeneratorError::InvalidResponse("not json".into()).is_transient());
    }
}
