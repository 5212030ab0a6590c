//! Bitclock: the client facade wiring config, sender and scheduler.

use std::sync::Arc;

use bitclock_core::errors::{BitclockError, BitclockResult, ConfigError};
use bitclock_core::tracing::{events, init_tracing_with_filter};
use bitclock_core::validation::parse_dimensions;
use bitclock_core::{ClientConfig, ConfigStore, Dimensions};
use serde_json::{Map, Value};
use tokio::runtime::Handle;

use crate::auth::TokenSigner;
use crate::scheduler::Scheduler;
use crate::sender::Sender;
use crate::transaction::Transaction;
use crate::transport::{HttpTransport, Transport};
use crate::waterfall::Waterfall;

/// Process-wide telemetry client. Cheap to clone; clones share the
/// delivery queue and config.
#[derive(Debug, Clone)]
pub struct Bitclock {
    config: ConfigStore,
    scheduler: Arc<Scheduler>,
}

/// Builder for [`Bitclock`] when the defaults (HTTP transport, unsigned
/// tokens, the current tokio runtime) don't fit.
pub struct BitclockBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    signer: Option<Arc<dyn TokenSigner>>,
    runtime: Option<Handle>,
}

impl BitclockBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn TokenSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> BitclockResult<Bitclock> {
        if self.config.debug {
            init_tracing_with_filter("bitclock=debug");
        }
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|e| BitclockError::NoRuntime {
                reason: e.to_string(),
            })?,
        };
        // The HTTP client's timeout is fixed here; later changes to
        // `request_timeout_ms` apply to new clients only.
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.config.request_timeout())?),
        };

        let config = ConfigStore::new(self.config)?;
        let mut sender = Sender::new(config.clone(), transport);
        if let Some(signer) = self.signer {
            sender = sender.with_signer(signer);
        }
        let scheduler = Arc::new(Scheduler::new(config.clone(), Arc::new(sender), runtime));
        tracing::debug!(
            bucket = ?config.with(|c| c.bucket.clone()),
            "bitclock client ready"
        );
        Ok(Bitclock { config, scheduler })
    }
}

impl Bitclock {
    /// Client on the current tokio runtime with the HTTP transport.
    pub fn new(config: ClientConfig) -> BitclockResult<Self> {
        Self::builder(config).build()
    }

    /// Client on the current tokio runtime with a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> BitclockResult<Self> {
        Self::builder(config).transport(transport).build()
    }

    pub fn builder(config: ClientConfig) -> BitclockBuilder {
        BitclockBuilder {
            config,
            transport: None,
            signer: None,
            runtime: None,
        }
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Key/value configuration. See [`ConfigStore::set`].
    pub fn configure(&self, key: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        self.config.set(key, value.into())
    }

    /// Restore the compiled config defaults.
    pub fn reset_config(&self) {
        self.config.reset();
    }

    /// Forget the memoized API token.
    pub fn reset_token(&self) {
        self.scheduler.sender().tokens().reset();
    }

    pub fn transaction(&self) -> Transaction {
        Transaction::new(
            Arc::clone(&self.scheduler),
            self.config.clone(),
            Dimensions::new(),
            Map::new(),
        )
    }

    /// Transaction with initial dimensions and data. Invalid input is
    /// logged and left out.
    pub fn transaction_with(&self, dimensions: impl Into<Value>, data: impl Into<Value>) -> Transaction {
        let dimensions = match dimensions.into() {
            Value::Null => Dimensions::new(),
            other => parse_dimensions(&other).unwrap_or_else(|e| {
                events::event_rejected("transaction", &e);
                Dimensions::new()
            }),
        };
        let data = match data.into() {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                events::misuse_ignored("transaction", &format!("data must be an object, got {other}"));
                Map::new()
            }
        };
        Transaction::new(Arc::clone(&self.scheduler), self.config.clone(), dimensions, data)
    }

    /// Waterfall on a fresh transaction.
    pub fn waterfall(&self, dimensions: impl Into<Value>) -> Waterfall {
        self.transaction().waterfall(dimensions)
    }

    /// Send everything queued now and wait for the requests to finish.
    pub async fn flush(&self) {
        self.scheduler.flush().await;
    }

    /// Items waiting in the delivery queue (heuristic).
    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }
}
