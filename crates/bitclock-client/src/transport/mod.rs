//! Outbound transport: the seam between the sender and the network.

pub mod http_client;

use async_trait::async_trait;
use bitclock_core::errors::DeliveryError;

pub use http_client::HttpTransport;

/// A fully built POST request.
#[derive(Debug, Clone)]
pub struct PostRequest {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer_token: Option<String>,
    /// JSON body.
    pub body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PostResponse {
    pub status: u16,
    pub body: String,
}

impl PostResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can POST a JSON body.
///
/// Implementations return non-2xx responses as `Ok`; only failures to
/// obtain a response at all are `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: PostRequest) -> Result<PostResponse, DeliveryError>;
}
