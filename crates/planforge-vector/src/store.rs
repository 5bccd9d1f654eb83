//! SimilarityStore trait

use serde::{Deserialize, Serialize};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from similarity-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("response error: status={status}, message={message}")]
    Response { status: u16, message: String },

    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("timeout")]
    Timeout,

    #[error("retry exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else if err.is_connect() {
            StoreError::Connection(err.to_string())
        } else {
            StoreError::Request(err.to_string())
        }
    }
}

/// One hit from a similarity query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryMatch {
    pub id: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A record to persist alongside its embedding.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// The similarity/embedding collaborator. The store itself is external;
/// this crate only speaks its protocol.
#[async_trait::async_trait]
pub trait SimilarityStore: Send + Sync {
    async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>>;

    async fn query(
        &self,
        vector: &[f32],
        filter: Option<&serde_json::Value>,
        top_k: usize,
    ) -> StoreResult<Vec<QueryMatch>>;

    async fn upsert(&self, records: Vec<VectorRecord>) -> StoreResult<()>;
}
