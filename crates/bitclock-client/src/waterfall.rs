//! Waterfall: ordered, timed elements committed as one `waterfall` event.
//!
//! `open` until `commit`, then terminal. Offsets are milliseconds since the
//! init time and may be negative if the init time was moved forward.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use bitclock_core::tracing::events;
use bitclock_core::validation::parse_valid_dimensions;
use bitclock_core::{EventType, OneShot, WaterfallElement};
use serde_json::Value;

use crate::transaction::{signed_ms, Transaction};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct WaterfallState {
    elements: Vec<WaterfallElement>,
    init_time: Instant,
    committed: bool,
    dimensions: Value,
}

/// Clones share the same waterfall.
#[derive(Debug, Clone)]
pub struct Waterfall {
    tx: Transaction,
    state: Arc<Mutex<WaterfallState>>,
}

impl Waterfall {
    pub(crate) fn new(tx: Transaction, dimensions: Value) -> Self {
        if let Err(e) = parse_valid_dimensions(&dimensions) {
            events::event_rejected("waterfall", &e);
        }
        Self {
            tx,
            state: Arc::new(Mutex::new(WaterfallState {
                elements: Vec::new(),
                init_time: Instant::now(),
                committed: false,
                dimensions,
            })),
        }
    }

    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    /// Move the reference point for offsets recorded from now on.
    pub fn set_init_time(&self, init_time: Instant) -> &Self {
        lock(&self.state).init_time = init_time;
        self
    }

    /// Record a complete element (no `elapsed`).
    pub fn point(&self, data: impl Into<Value>) -> &Self {
        self.record("point", data.into());
        self
    }

    /// Record an element now and return the capability that closes it.
    pub fn span(&self, data: impl Into<Value>) -> WaterfallSpan {
        let index = self.record("span", data.into());
        WaterfallSpan {
            waterfall: Arc::clone(&self.state),
            span: Arc::new(Mutex::new(SpanState {
                index,
                started: Instant::now(),
                elapsed: OneShot::new(),
            })),
        }
    }

    fn record(&self, operation: &str, data: Value) -> Option<usize> {
        let mut state = lock(&self.state);
        if state.committed {
            events::misuse_ignored(operation, "waterfall already committed");
            return None;
        }
        let offset = signed_ms(state.init_time, Instant::now());
        match WaterfallElement::from_value(data, offset) {
            Ok(element) => {
                state.elements.push(element);
                Some(state.elements.len() - 1)
            }
            Err(e) => {
                events::event_rejected(operation, &e);
                None
            }
        }
    }

    /// Dispatch the elements as one `waterfall` event. Terminal.
    pub fn commit(&self) -> &Self {
        let (elements, dimensions) = {
            let mut state = lock(&self.state);
            if state.committed {
                events::misuse_ignored("commit", "waterfall already committed");
                return self;
            }
            state.committed = true;
            (state.elements.clone(), state.dimensions.clone())
        };
        self.tx.dispatch(EventType::Waterfall, elements, dimensions);
        self
    }

    pub fn is_committed(&self) -> bool {
        lock(&self.state).committed
    }

    /// Snapshot of the recorded elements.
    pub fn elements(&self) -> Vec<WaterfallElement> {
        lock(&self.state).elements.clone()
    }
}

#[derive(Debug)]
struct SpanState {
    /// Position of the element; `None` if the push was rejected.
    index: Option<usize>,
    started: Instant,
    elapsed: OneShot<f64>,
}

/// Close capability for a waterfall span. One-shot; clones share it.
#[derive(Debug, Clone)]
pub struct WaterfallSpan {
    waterfall: Arc<Mutex<WaterfallState>>,
    span: Arc<Mutex<SpanState>>,
}

impl WaterfallSpan {
    /// Merge `final_fields` into the element and stamp `elapsed`.
    ///
    /// Returns elapsed milliseconds. After commit the committed event is
    /// left untouched.
    pub fn close(&self, final_fields: impl Into<Value>) -> f64 {
        let mut span = lock(&self.span);
        if let Some(&elapsed) = span.elapsed.result() {
            events::misuse_ignored("span close", "span already closed");
            return elapsed;
        }
        let (index, started) = (span.index, span.started);
        let final_fields = final_fields.into();
        span.elapsed.fire(|| {
            let elapsed = signed_ms(started, Instant::now());
            let mut waterfall = lock(&self.waterfall);
            if waterfall.committed {
                events::misuse_ignored("span close", "waterfall already committed");
            } else if let Some(element) = index.and_then(|i| waterfall.elements.get_mut(i)) {
                element.merge_fields(final_fields);
                element.elapsed = Some(elapsed);
            }
            elapsed
        })
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.span).elapsed.has_fired()
    }
}
