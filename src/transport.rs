//! The single outbound call to the inference endpoint.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::payload::InferenceRequest;

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Sends one request. Status classification is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &InferenceRequest) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
    key: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, config))
    }

    /// Use an existing reqwest client.
    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            url: config.endpoint_url.clone(),
            key: config.endpoint_key.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &InferenceRequest) -> Result<RawResponse, TransportError> {
        debug!(url = %self.url, "Sending request to Gemini");

        let response = self
            .client
            .post(&self.url)
            .query(&[("key", &self.key)])
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, body_len = body.len(), "Gemini responded");

        Ok(RawResponse { status, body })
    }
}
