use std::time::Duration;

use async_trait::async_trait;
use enermina_application::SearchIndex;
use enermina_core::{AppError, AppResult};
use serde_json::{Map, Value};
use tracing::warn;

/// Connection settings of the hosted search service.
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Base URL, for example `https://<app>.algolia.net`.
    pub api_url: String,
    /// Application identifier sent with every request.
    pub app_id: String,
    /// Write-capable API key.
    pub api_key: String,
}

/// HTTP client for a hosted full-text search index.
pub struct HttpSearchIndexClient {
    http_client: reqwest::Client,
    config: SearchIndexConfig,
    max_attempts: u8,
    retry_backoff_ms: u64,
}

impl HttpSearchIndexClient {
    /// Creates a new search index client.
    #[must_use]
    pub fn new(
        http_client: reqwest::Client,
        config: SearchIndexConfig,
        max_attempts: u8,
        retry_backoff_ms: u64,
    ) -> Self {
        Self {
            http_client,
            config,
            max_attempts: max_attempts.max(1),
            retry_backoff_ms: retry_backoff_ms.max(50),
        }
    }

    fn object_url(&self, index_name: &str, object_id: &str) -> String {
        format!(
            "{}/1/indexes/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            encode_segment(index_name),
            encode_segment(object_id)
        )
    }

    async fn send_with_retry<F>(&self, operation: &str, mut build: F) -> AppResult<()>
    where
        F: FnMut(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_u8;
        let mut last_error: Option<String> = None;

        while attempt < self.max_attempts {
            attempt = attempt.saturating_add(1);
            let response = build(&self.http_client)
                .header("X-Algolia-Application-Id", self.config.app_id.as_str())
                .header("X-Algolia-API-Key", self.config.api_key.as_str())
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND
                    && operation == "delete" =>
                {
                    return Ok(());
                }
                Ok(response)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS =>
                {
                    last_error = Some(format!(
                        "transient HTTP status {} for search {operation}",
                        response.status()
                    ));
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "<response body unavailable>".to_owned());
                    return Err(AppError::Validation(format!(
                        "search {operation} failed with status {status}: {body}"
                    )));
                }
                Err(error) => {
                    last_error = Some(format!("search {operation} transport error: {error}"));
                }
            }

            if attempt < self.max_attempts {
                warn!(operation, attempt, "retrying search index request");
                let delay = self.retry_backoff_ms.saturating_mul(u64::from(attempt));
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
        }

        Err(AppError::Internal(last_error.unwrap_or_else(|| {
            format!("search {operation} exhausted retries")
        })))
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndexClient {
    async fn upsert(
        &self,
        index_name: &str,
        object_id: &str,
        body: Map<String, Value>,
    ) -> AppResult<()> {
        let url = self.object_url(index_name, object_id);
        let body = Value::Object(body);
        self.send_with_retry("upsert", |client| client.put(url.as_str()).json(&body))
            .await
    }

    async fn delete(&self, index_name: &str, object_id: &str) -> AppResult<()> {
        let url = self.object_url(index_name, object_id);
        self.send_with_retry("delete", |client| client.delete(url.as_str()))
            .await
    }
}

fn encode_segment(segment: &str) -> String {
    segment
        .bytes()
        .map(|byte| match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                char::from(byte).to_string()
            }
            _ => format!("%{byte:02X}"),
        })
        .collect()
}
