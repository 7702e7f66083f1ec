use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use crate::app_config::FetchConfig;
use crate::errors::{AppError, TransportError};

use super::{Transport, TransportResponse};

/// HTTP transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl HttpTransport {
    /// Create a transport from fetch settings
    pub fn new(config: &FetchConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config.retry_count, config.retry_backoff_ms))
    }

    /// Wrap an existing client
    pub fn with_client(client: Client, max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            client,
            max_retries,
            backoff_base_ms,
        }
    }

    fn classify(error: &reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(error.to_string())
        } else if error.is_connect() {
            TransportError::ConnectionError(error.to_string())
        } else if error.is_builder() {
            TransportError::InvalidUri(error.to_string())
        } else {
            TransportError::RequestFailed(error.to_string())
        }
    }

    async fn into_transport_response(response: reqwest::Response) -> Result<TransportResponse, TransportError> {
        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();

        let body = response.bytes().await.map_err(|e| Self::classify(&e))?;

        Ok(TransportResponse { status, headers, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, uri: &str) -> Result<TransportResponse, TransportError> {
        let mut attempt = 0;

        loop {
            let error = match self.client.get(uri).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_server_error() || attempt >= self.max_retries {
                        debug!("GET {} -> {}", uri, status);
                        return Self::into_transport_response(response).await;
                    }
                    warn!("GET {} -> {} - attempt {}/{}", uri, status, attempt + 1, self.max_retries + 1);
                    TransportError::RequestFailed(format!("server responded with {}", status))
                }
                Err(e) => {
                    let error = Self::classify(&e);
                    if matches!(error, TransportError::InvalidUri(_)) {
                        return Err(error);
                    }
                    error!("GET {} failed: {} - attempt {}/{}", uri, error, attempt + 1, self.max_retries + 1);
                    error
                }
            };

            if attempt >= self.max_retries {
                return Err(error);
            }

            attempt += 1;
            let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }
}
