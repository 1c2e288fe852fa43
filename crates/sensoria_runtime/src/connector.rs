//! Connectors: uniform interface over outbound I/O with connector-level
//! retries and timeouts.
//!
//! Retries apply to transient failures only (429, 5xx, network errors);
//! client errors fail immediately. Backoff is exponential from
//! `backoff_initial_ms` with `backoff_factor`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

/// Retry/timeout policy every connector exposes.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_initial_ms: u64,
    pub backoff_factor: f64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 2,
            backoff_initial_ms: 200,
            backoff_factor: 2.0,
        }
    }
}

impl ConnectorConfig {
    /// Backoff delay before retry `n` (1-based).
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let ms = self.backoff_initial_ms as f64
            * self.backoff_factor.powi(retry.saturating_sub(1) as i32);
        Duration::from_millis(ms as u64)
    }
}

/// Common connector surface. Service-specific verbs live on the concrete
/// types; this trait covers lifecycle and identification.
#[async_trait]
pub trait Connector: Send + Sync {
    fn name(&self) -> &'static str;

    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// HTTP connector with JSON verbs.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
    base_url: String,
    config: ConnectorConfig,
}

impl HttpConnector {
    pub fn new(base_url: &str, config: ConnectorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// POST a JSON body, returning the parsed JSON response.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        self.request_with_retry(|| {
            self.client
                .post(format!("{}{}", self.base_url, path))
                .json(body)
        })
        .await
    }

    /// GET a JSON response.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        self.request_with_retry(|| self.client.get(format!("{}{}", self.base_url, path)))
            .await
    }

    async fn request_with_retry<F>(&self, build: F) -> Result<Value>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let attempts = self.config.max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        if attempt > 1 {
                            tracing::info!(
                                "http connector recovered on attempt {}/{}",
                                attempt,
                                attempts
                            );
                        }
                        return response
                            .json::<Value>()
                            .await
                            .context("Failed to parse JSON response");
                    }
                    let body = response.text().await.unwrap_or_default();
                    if !is_retryable_status(status) {
                        bail!("http error {}: {}", status, truncate(&body, 200));
                    }
                    tracing::warn!(
                        "http {} on attempt {}/{}: {}",
                        status,
                        attempt,
                        attempts,
                        truncate(&body, 200)
                    );
                    last_error = Some(format!("{}: {}", status, truncate(&body, 200)));
                }
                Err(e) => {
                    tracing::warn!("http network error on attempt {}/{}: {}", attempt, attempts, e);
                    last_error = Some(e.to_string());
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.config.backoff_delay(attempt)).await;
            }
        }

        bail!(
            "all {} attempts failed: {}",
            attempts,
            last_error.unwrap_or_else(|| "unknown".to_string())
        )
    }
}

#[async_trait]
impl Connector for HttpConnector {
    fn name(&self) -> &'static str {
        "http"
    }
}

fn truncate(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}
