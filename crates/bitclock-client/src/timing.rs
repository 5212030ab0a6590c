//! Timing spans returned by `Transaction::tic`.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use bitclock_core::tracing::events;
use bitclock_core::{EventType, OneShot};
use serde_json::Value;

use crate::transaction::{overlay, signed_ms, Transaction};

#[derive(Debug)]
pub(crate) struct TimingState {
    dimensions: Value,
    /// Registration key in the transaction's timer table, if any.
    key: Option<String>,
    start: Instant,
    elapsed: OneShot<f64>,
}

impl TimingState {
    pub(crate) fn new(dimensions: Value, key: Option<String>, start: Instant) -> Self {
        Self {
            dimensions,
            key,
            start,
            elapsed: OneShot::new(),
        }
    }
}

/// An open timer. Closing it dispatches one `timing` event.
///
/// Clones share the same timer. Only the first `close` has any effect;
/// later calls return the same elapsed value.
#[derive(Debug, Clone)]
pub struct TimingSpan {
    tx: Transaction,
    state: Arc<Mutex<TimingState>>,
}

impl TimingSpan {
    pub(crate) fn new(tx: Transaction, state: Arc<Mutex<TimingState>>) -> Self {
        Self { tx, state }
    }

    /// Stop the timer and dispatch. Returns elapsed milliseconds.
    pub fn close(&self, final_dimensions: impl Into<Value>) -> f64 {
        let (elapsed, dimensions, key) = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(&elapsed) = state.elapsed.result() {
                events::misuse_ignored("timing close", "span already closed");
                return elapsed;
            }
            let start = state.start;
            let elapsed = state.elapsed.fire(|| signed_ms(start, Instant::now()));
            let dimensions = overlay(&state.dimensions, final_dimensions.into());
            (elapsed, dimensions, state.key.take())
        };
        if let Some(key) = key {
            self.tx.forget_timer(&key, &self.state);
        }
        self.tx.dispatch(EventType::Timing, elapsed, dimensions);
        elapsed
    }

    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed
            .has_fired()
    }

    /// Milliseconds since the timer started, without closing it.
    pub fn elapsed_so_far(&self) -> f64 {
        let start = self.state.lock().unwrap_or_else(PoisonError::into_inner).start;
        signed_ms(start, Instant::now())
    }
}
