use async_trait::async_trait;
use reqwest::StatusCode;
use selector_core::{FindRequest, IndexRequest};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{FindError, FindResult};
use crate::port::{ExecutionPort, FindLimits, IndexOutcome, Page};

/// Execution port talking to the database's HTTP endpoints.
pub struct HttpPort {
    base_url: String,
    limits: FindLimits,
    client: reqwest::Client,
}

impl HttpPort {
    pub fn new(config: &ClientConfig) -> FindResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .build()
            .map_err(|e| FindError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url().trim_end_matches('/').to_string(),
            limits: config.limits(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> FindResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| FindError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FindError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(backend_error(status, &text));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Maps a non-success response onto [`FindError::Backend`], using the
/// backend's `{"error": .., "reason": ..}` body when there is one.
fn backend_error(status: StatusCode, body: &str) -> FindError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let error = field("error").unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown_error")
            .to_string()
    });
    let reason = field("reason").unwrap_or_else(|| body.trim().to_string());

    FindError::Backend {
        status: status.as_u16(),
        error,
        reason,
    }
}

fn db_path(database: &str, endpoint: &str) -> String {
    format!("/{}/{}", database.trim_matches('/'), endpoint)
}

#[async_trait]
impl ExecutionPort for HttpPort {
    async fn execute(&self, database: &str, request: &FindRequest) -> FindResult<Page> {
        self.post(&db_path(database, "_find"), request).await
    }

    async fn create_index(&self, database: &str, index: &IndexRequest) -> FindResult<IndexOutcome> {
        self.post(&db_path(database, "_index"), index).await
    }

    fn limits(&self) -> FindLimits {
        self.limits
    }
}
