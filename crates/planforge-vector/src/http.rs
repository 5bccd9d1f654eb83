//! HTTP similarity-store client with retry

use crate::store::{QueryMatch, SimilarityStore, StoreError, StoreResult, VectorRecord};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct VectorConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8091".into(),
            auth_token: None,
            timeout: Duration::from_secs(15),
            max_retries: 3,
            retry_backoff_ms: 100,
        }
    }
}

impl VectorConfig {
    pub fn from_env() -> StoreResult<Self> {
        let base_url = std::env::var("PLANFORGE_VECTOR_URL")
            .map_err(|_| StoreError::Configuration("PLANFORGE_VECTOR_URL not set".into()))?;
        let auth_token = std::env::var("PLANFORGE_VECTOR_TOKEN").ok();
        Ok(Self {
            base_url,
            auth_token,
            ..Default::default()
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    vectors: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a serde_json::Value>,
    top_k: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    matches: Vec<QueryMatch>,
}

#[derive(Serialize)]
struct UpsertRequest {
    records: Vec<VectorRecord>,
}

pub struct HttpVectorStore {
    client: Client,
    config: VectorConfig,
}

impl HttpVectorStore {
    pub fn new(config: VectorConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> StoreResult<Self> {
        Self::new(VectorConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Execute a request with retry on transient failures only.
    async fn execute_with_retry<T: DeserializeOwned>(
        &self,
        request_builder: impl Fn() -> reqwest::RequestBuilder,
    ) -> StoreResult<T> {
        let mut attempts = 0;
        let mut last_error = String::new();

        while attempts < self.config.max_retries {
            attempts += 1;

            let request = request_builder();
            let request = if let Some(ref token) = self.config.auth_token {
                request.bearer_auth(token)
            } else {
                request
            };

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .map_err(|e| StoreError::Request(e.to_string()));
                    }

                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            return Err(StoreError::Authentication(
                                "invalid or missing authentication".into(),
                            ));
                        }
                        StatusCode::TOO_MANY_REQUESTS => {
                            warn!("similarity store rate limited, retrying");
                            last_error = "rate limited".into();
                        }
                        StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                            warn!(%status, "similarity store unavailable, retrying");
                            last_error = format!("service unavailable: {}", status);
                        }
                        _ => {
                            let body = response.text().await.unwrap_or_default();
                            return Err(StoreError::Response {
                                status: status.as_u16(),
                                message: body,
                            });
                        }
                    }
                }
                Err(e) => {
                    if e.is_timeout() || e.is_connect() {
                        warn!(
                            attempt = attempts,
                            max = self.config.max_retries,
                            error = %e,
                            "similarity store unreachable"
                        );
                        last_error = e.to_string();
                    } else {
                        return Err(e.into());
                    }
                }
            }

            if attempts < self.config.max_retries {
                let backoff = Duration::from_millis(
                    self.config.retry_backoff_ms * 2u64.pow(attempts - 1),
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(StoreError::RetryExhausted {
            attempts,
            last_error,
        })
    }
}

#[async_trait::async_trait]
impl SimilarityStore for HttpVectorStore {
    async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        let url = self.url("/v1/embed");
        let response: EmbedResponse = self
            .execute_with_retry(|| self.client.post(&url).json(&EmbedRequest { texts }))
            .await?;
        Ok(response.vectors)
    }

    async fn query(
        &self,
        vector: &[f32],
        filter: Option<&serde_json::Value>,
        top_k: usize,
    ) -> StoreResult<Vec<QueryMatch>> {
        let url = self.url("/v1/query");
        let response: QueryResponse = self
            .execute_with_retry(|| {
                self.client.post(&url).json(&QueryRequest {
                    vector,
                    filter,
                    top_k,
                })
            })
            .await?;
        Ok(response.matches)
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> StoreResult<()> {
        let url = self.url("/v1/upsert");
        let _: serde_json::Value = self
            .execute_with_retry(|| {
                self.client.post(&url).json(&UpsertRequest {
                    records: records.clone(),
                })
            })
            .await?;
        Ok(())
    }
}
