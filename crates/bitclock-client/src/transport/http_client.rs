//! HTTP transport on reqwest with timeout and gzip.
//!
//! No retries and no backoff: a failed batch is dropped by the sender.

use std::time::Duration;

use async_trait::async_trait;
use bitclock_core::errors::DeliveryError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};

use super::{PostRequest, PostResponse, Transport};

fn net_err(reason: String) -> DeliveryError {
    DeliveryError::Network { reason }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e: reqwest::Error| net_err(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: PostRequest) -> Result<PostResponse, DeliveryError> {
        let mut req = self
            .client
            .post(&request.url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(request.body);
        if let Some(ref token) = request.bearer_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                net_err(format!("request timed out: {e}"))
            } else {
                net_err(e.to_string())
            }
        })?;
        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(status, error = %e, "http transport: failed to read response body");
                String::new()
            }
        };
        tracing::trace!(status, "http transport: response received");
        Ok(PostResponse { status, body })
    }
}
