//! Sender: serializes a batch into the wire envelope and posts it.
//!
//! `send` never fails. Every delivery problem is logged with its error
//! code and the batch is dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitclock_core::constants::CLIENT_VERSION;
use bitclock_core::errors::DeliveryError;
use bitclock_core::models::EventEnvelope;
use bitclock_core::tracing::events;
use bitclock_core::{ConfigStore, Event};

use crate::auth::{TokenResolver, TokenSigner};
use crate::transport::{PostRequest, Transport};

pub struct Sender {
    config: ConfigStore,
    transport: Arc<dyn Transport>,
    tokens: TokenResolver,
    signer: Option<Arc<dyn TokenSigner>>,
    env_warned: AtomicBool,
    token_warned: AtomicBool,
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("signed", &self.signer.is_some())
            .finish_non_exhaustive()
    }
}

impl Sender {
    pub fn new(config: ConfigStore, transport: Arc<dyn Transport>) -> Self {
        Self {
            tokens: TokenResolver::new(config.clone()),
            config,
            transport,
            signer: None,
            env_warned: AtomicBool::new(false),
            token_warned: AtomicBool::new(false),
        }
    }

    /// Sign every token with `signer` before it goes on the wire.
    pub fn with_signer(mut self, signer: Arc<dyn TokenSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn tokens(&self) -> &TokenResolver {
        &self.tokens
    }

    /// Post one batch. Resolves once the request finished or was skipped.
    pub async fn send(&self, batch: Vec<Event>) {
        if batch.is_empty() {
            return;
        }
        let config = self.config.snapshot();
        let batch_size = batch.len();

        if !config.enable {
            tracing::debug!(batch_size, "delivery disabled, dropping batch");
            return;
        }
        if config.env.is_none() && !self.env_warned.swap(true, Ordering::Relaxed) {
            tracing::warn!("missing value for config.env");
        }
        let Some(url) = config.event_url() else {
            events::batch_dropped(batch_size, &DeliveryError::MissingBucket { events: batch_size });
            return;
        };

        let bearer_token = self.resolve_token();
        let envelope = EventEnvelope {
            version: CLIENT_VERSION.to_string(),
            env: config.env,
            user_agent: config.user_agent,
            source: config.source,
            events: batch,
        };
        let body = match serde_json::to_vec(&envelope) {
            Ok(body) => body,
            Err(e) => {
                let err = DeliveryError::Serialization {
                    reason: e.to_string(),
                };
                events::batch_dropped(batch_size, &err);
                return;
            }
        };
        tracing::debug!(batch_size, url = %url, "sending batch");

        let request = PostRequest {
            url,
            bearer_token,
            body,
        };
        match self.transport.post(request).await {
            Ok(resp) if resp.is_success() => events::batch_sent(batch_size, resp.status),
            Ok(resp) => events::batch_dropped(
                batch_size,
                &DeliveryError::Status {
                    status: resp.status,
                    body: resp.body,
                },
            ),
            Err(e) => events::batch_dropped(batch_size, &e),
        }
    }

    fn resolve_token(&self) -> Option<String> {
        let Some(token) = self.tokens.get_token() else {
            if !self.token_warned.swap(true, Ordering::Relaxed) {
                tracing::warn!("no API token found, sending without authorization");
            }
            return None;
        };
        Some(match &self.signer {
            Some(signer) => signer.sign(&token),
            None => token,
        })
    }
}
