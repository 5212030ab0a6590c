//! Shared fixtures: an in-memory transport and client configs.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bitclock_client::{Bitclock, PostRequest, PostResponse, Transport};
use bitclock_core::errors::DeliveryError;
use bitclock_core::{ClientConfig, Dimensions, Event, EventType, EventValue};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Records every request. Answers with `status` after `delay`, or fails
/// with `error`.
pub struct RecordingTransport {
    requests: Mutex<Vec<PostRequest>>,
    status: u16,
    error: Option<DeliveryError>,
    delay: Duration,
    completed: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Self::with_status(200)
    }

    pub fn with_status(status: u16) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            status,
            error: None,
            delay: Duration::ZERO,
            completed: AtomicUsize::new(0),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            status: 200,
            error: None,
            delay,
            completed: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: DeliveryError) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            status: 0,
            error: Some(error),
            delay: Duration::ZERO,
            completed: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> Vec<PostRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests whose response has been returned.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Parsed JSON bodies, in arrival order.
    pub fn bodies(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    /// Every delivered event, flattened across requests.
    pub fn events(&self) -> Vec<Value> {
        self.bodies()
            .into_iter()
            .flat_map(|body| body["events"].as_array().cloned().unwrap_or_default())
            .collect()
    }

    /// Number of events in each request.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.bodies()
            .iter()
            .map(|body| body["events"].as_array().map_or(0, Vec::len))
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, request: PostRequest) -> Result<PostResponse, DeliveryError> {
        self.requests.lock().unwrap().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(PostResponse {
                status: self.status,
                body: "{}".to_string(),
            }),
        }
    }
}

pub fn test_config(reporting_interval_ms: u64) -> ClientConfig {
    ClientConfig {
        env: Some("test".to_string()),
        bucket: Some("test-bucket".to_string()),
        token: Some("test-token".to_string()),
        reporting_interval_ms,
        reporting_endpoint: "http://collector.test".to_string(),
        ..Default::default()
    }
}

pub fn client(config: ClientConfig) -> (Bitclock, Arc<RecordingTransport>) {
    let transport = RecordingTransport::new();
    let client = Bitclock::with_transport(config, transport.clone()).unwrap();
    (client, transport)
}

pub fn event(value: f64) -> Event {
    Event {
        event_type: EventType::Count,
        value: EventValue::Number(value),
        dimensions: Dimensions::new().with("k", 1),
        data: Map::new(),
        transaction_id: Uuid::new_v4(),
        timestamp: chrono::Utc::now(),
    }
}

/// Poll `f` until it holds or `timeout` passes.
pub async fn wait_for(timeout: Duration, mut f: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if f() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    f()
}
