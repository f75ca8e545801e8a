use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/ask";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

/// Body of the backend liveness endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Why a question could not be answered. The user is shown the same text for
/// every variant; the distinction only matters for logs.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("backend responded with status {0}")]
    Status(StatusCode),
    #[error("response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request task did not complete: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct AskClient {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl AskClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| anyhow!("Invalid backend endpoint {:?}: {}", endpoint, e))?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Scheme, host and port of the endpoint, e.g. `http://localhost:8080`.
    pub fn origin(&self) -> String {
        self.endpoint.origin().ascii_serialization()
    }

    /// POST `{"question": ...}` and return the parsed JSON reply.
    pub async fn ask(&self, question: &str) -> Result<Value, DispatchError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&AskRequest { question })
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Query `/health` on the same origin as the ask endpoint.
    pub async fn health(&self) -> Result<Health> {
        let url = self.endpoint.join("/health")?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Health check failed: {}", response.status()));
        }

        Ok(response.json().await?)
    }

    fn classify(&self, err: reqwest::Error) -> DispatchError {
        if err.is_timeout() {
            DispatchError::Timeout(self.timeout)
        } else {
            DispatchError::Transport(err)
        }
    }
}
