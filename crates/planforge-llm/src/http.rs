//! HTTP completion client with retry, backoff, and response caching

use crate::cache::ResponseCache;
use crate::provider::{GenerationOptions, GeneratorError, GeneratorResult, TextGenerator};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Client configuration.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Backoff doubles from this base per attempt.
    pub retry_backoff_ms: u64,
    pub cache_ttl: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8090".into(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_backoff_ms: 200,
            cache_ttl: Duration::from_secs(300),
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> GeneratorResult<Self> {
        let base_url = std::env::var("PLANFORGE_GENERATOR_URL")
            .map_err(|_| GeneratorError::RequestFailed("PLANFORGE_GENERATOR_URL not set".into()))?;
        let api_key = std::env::var("PLANFORGE_GENERATOR_KEY").ok();
        Ok(Self {
            base_url,
            api_key,
            ..Default::default()
        })
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    text: String,
}

/// Text-generation client. Consults the TTL cache before every call and
/// retries only transient failures.
pub struct HttpGenerator {
    client: Client,
    config: GeneratorConfig,
    cache: ResponseCache,
}

impl HttpGenerator {
    pub fn new(config: GeneratorConfig) -> GeneratorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;
        let cache = ResponseCache::new(config.cache_ttl);
        Ok(Self {
            client,
            config,
            cache,
        })
    }

    pub fn from_env() -> GeneratorResult<Self> {
        Self::new(GeneratorConfig::from_env()?)
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    async fn complete_once(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> GeneratorResult<String> {
        let body = CompletionRequest {
            prompt,
            model: options.model.as_deref(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };
        let url = format!("{}/v1/complete", self.config.base_url.trim_end_matches('/'));

        let mut request = self.client.post(&url).json(&body);
        if let Some(ref key) = self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GeneratorError::Timeout
            } else {
                GeneratorError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GeneratorError::AuthFailed(text),
                StatusCode::TOO_MANY_REQUESTS => GeneratorError::RateLimited {
                    retry_after_ms: self.config.retry_backoff_ms,
                },
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
                    GeneratorError::Unavailable(format!("{}: {}", status, text))
                }
                _ => GeneratorError::RequestFailed(format!("{}: {}", status, text)),
            });
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;
        Ok(parsed.text)
    }
}

#[async_trait::async_trait]
impl TextGenerator for HttpGenerator {
    fn name(&self) -> &str {
        "http-generator"
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> GeneratorResult<String> {
        let key = ResponseCache::key(prompt, options);
        if let Some(hit) = self.cache.get(key) {
            debug!(key, "completion cache hit");
            return Ok(hit);
        }

        let mut attempts = 0;
        let mut last_error = String::new();

        while attempts < self.config.max_retries {
            attempts += 1;
            match self.complete_once(prompt, options).await {
                Ok(text) => {
                    self.cache.insert(key, text.clone());
                    return Ok(text);
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        attempt = attempts,
                        max = self.config.max_retries,
                        error = %e,
                        "transient generation failure"
                    );
                    last_error = e.to_string();
                }
                Err(e) => return Err(e),
            }

            if attempts < self.config.max_retries {
                let backoff = Duration::from_millis(
                    self.config.retry_backoff_ms * 2u64.pow(attempts - 1),
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(GeneratorError::RetryExhausted {
            attempts,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let cfg = GeneratorConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn builds_with_defaults() {
        let gen = HttpGenerator::new(GeneratorConfig::default()).unwrap();
        assert_eq!(gen.name(), "http-generator");
        assert!(gen.cache().is_empty());
    }
}
