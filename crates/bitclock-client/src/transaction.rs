//! Transaction: a correlation scope that produces events.
//!
//! Every event carries the transaction's id, its dimensions merged with
//! the call-site dimensions, and its free-form data. Events go into the
//! transaction's private queue and the scheduler is told to pick them up.
//! No call here ever fails: invalid input is logged and ignored.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use bitclock_core::constants::METRIC_DIMENSION_KEY;
use bitclock_core::tracing::events;
use bitclock_core::validation::{parse_dimensions, validate_dimensions, validate_metrics};
use bitclock_core::{ConfigStore, Dimensions, Event, EventType, EventValue};
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::queue::{Pending, Stack};
use crate::scheduler::Scheduler;
use crate::timing::{TimingSpan, TimingState};
use crate::waterfall::Waterfall;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cheap to clone; clones share the same transaction.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<Inner>,
}

struct Inner {
    id: Uuid,
    dimensions: Mutex<Dimensions>,
    data: Mutex<Map<String, Value>>,
    queue: Arc<Mutex<Stack<Event>>>,
    /// Open `tic` timers by dimension key.
    timers: Mutex<HashMap<String, Arc<Mutex<TimingState>>>>,
    scheduler: Arc<Scheduler>,
    config: ConfigStore,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.inner.id)
            .field("dimensions", &*lock(&self.inner.dimensions))
            .finish_non_exhaustive()
    }
}

impl Transaction {
    pub(crate) fn new(
        scheduler: Arc<Scheduler>,
        config: ConfigStore,
        dimensions: Dimensions,
        data: Map<String, Value>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                dimensions: Mutex::new(dimensions),
                data: Mutex::new(data),
                queue: Arc::new(Mutex::new(Stack::new())),
                timers: Mutex::new(HashMap::new()),
                scheduler,
                config,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Transaction-level dimensions.
    pub fn dimensions(&self) -> Dimensions {
        lock(&self.inner.dimensions).clone()
    }

    /// Transaction-level data.
    pub fn data(&self) -> Map<String, Value> {
        lock(&self.inner.data).clone()
    }

    /// Events produced but not yet picked up by the scheduler.
    pub fn pending(&self) -> usize {
        lock(&self.inner.queue).size()
    }

    /// Merge `dimensions` into the transaction dimensions.
    pub fn set_dimensions(&self, dimensions: impl Into<Value>) -> &Self {
        match parse_dimensions(&dimensions.into()) {
            Ok(dimensions) => lock(&self.inner.dimensions).merge(&dimensions),
            Err(e) => events::event_rejected("set_dimensions", &e),
        }
        self
    }

    /// Merge `data` (a JSON object) into the transaction data.
    pub fn set_data(&self, data: impl Into<Value>) -> &Self {
        match data.into() {
            Value::Object(map) => lock(&self.inner.data).extend(map),
            other => events::misuse_ignored(
                "set_data",
                &format!("data must be an object, got {other}"),
            ),
        }
        self
    }

    /// Validate, stamp and enqueue one event.
    ///
    /// Call-site dimensions win over transaction dimensions; the merged map
    /// must be non-empty. Returns `self` whatever the outcome.
    pub fn dispatch(
        &self,
        event_type: EventType,
        value: impl Into<EventValue>,
        dimensions: impl Into<Value>,
    ) -> &Self {
        if !self.inner.config.enabled() {
            tracing::debug!(event_type = event_type.as_str(), "delivery disabled, event skipped");
            return self;
        }
        let call_site = match parse_dimensions(&dimensions.into()) {
            Ok(dimensions) => dimensions,
            Err(e) => {
                events::event_rejected(event_type.as_str(), &e);
                return self;
            }
        };
        let merged = lock(&self.inner.dimensions).merged(&call_site);
        if let Err(e) = validate_dimensions(&merged) {
            events::event_rejected(event_type.as_str(), &e);
            return self;
        }

        let event = Event {
            event_type,
            value: value.into(),
            dimensions: merged,
            data: lock(&self.inner.data).clone(),
            transaction_id: self.inner.id,
            timestamp: Utc::now(),
        };
        self.push(event);
        self
    }

    fn push(&self, event: Event) {
        let event_type = event.event_type;
        let queue_size = {
            let mut queue = lock(&self.inner.queue);
            queue.put(Pending::Value(event));
            queue.size()
        };
        events::event_enqueued(event_type.as_str(), &self.inner.id.to_string(), queue_size);

        let queue = Arc::clone(&self.inner.queue);
        self.inner
            .scheduler
            .enqueue(Pending::deferred(move || {
                let mut pending = lock(&queue);
                pending.drain_all()
            }));
    }

    /// Start a timer. Closing the returned span dispatches a `timing` event.
    ///
    /// The span is also registered under its dimensions so [`Self::toc`]
    /// can close it. A second `tic` with the same dimensions while the
    /// first is open logs a warning and returns a span only reachable
    /// through its handle.
    pub fn tic(&self, dimensions: impl Into<Value>) -> TimingSpan {
        let dimensions = dimensions.into();
        let mut key = parse_dimensions(&dimensions).ok().map(|d| d.key());
        if let Some(ref k) = key {
            let mut timers = lock(&self.inner.timers);
            match timers.entry(k.clone()) {
                Entry::Occupied(_) => {
                    events::misuse_ignored("tic", &format!("duplicate timer key '{k}'"));
                    key = None;
                }
                Entry::Vacant(slot) => {
                    let state = Arc::new(Mutex::new(TimingState::new(
                        dimensions,
                        key.clone(),
                        Instant::now(),
                    )));
                    slot.insert(Arc::clone(&state));
                    return TimingSpan::new(self.clone(), state);
                }
            }
        }
        let state = TimingState::new(dimensions, key, Instant::now());
        TimingSpan::new(self.clone(), Arc::new(Mutex::new(state)))
    }

    /// Close the timer opened by `tic(dimensions)`.
    ///
    /// Returns the elapsed milliseconds, or `None` (with a warning) when no
    /// such timer is open.
    pub fn toc(&self, dimensions: impl Into<Value>, final_dimensions: impl Into<Value>) -> Option<f64> {
        let key = match parse_dimensions(&dimensions.into()) {
            Ok(dimensions) => dimensions.key(),
            Err(e) => {
                events::event_rejected("toc", &e);
                return None;
            }
        };
        let Some(state) = lock(&self.inner.timers).remove(&key) else {
            events::misuse_ignored("toc", &format!("no open timer for key '{key}'"));
            return None;
        };
        Some(TimingSpan::new(self.clone(), state).close(final_dimensions))
    }

    /// Drop the registration of a closed timer, if it still points at `state`.
    pub(crate) fn forget_timer(&self, key: &str, state: &Arc<Mutex<TimingState>>) {
        let mut timers = lock(&self.inner.timers);
        if timers.get(key).is_some_and(|open| Arc::ptr_eq(open, state)) {
            timers.remove(key);
        }
    }

    pub fn count(&self, dimensions: impl Into<Value>) -> &Self {
        self.count_n(dimensions, 1)
    }

    pub fn count_n(&self, dimensions: impl Into<Value>, n: u64) -> &Self {
        self.dispatch(EventType::Count, n as f64, dimensions)
    }

    /// One `metric` event per key, with `dimensions.metric = key`.
    ///
    /// All-or-nothing: if any value is not a finite number nothing is sent.
    pub fn metrics(&self, values: impl Into<Value>, dimensions: impl Into<Value>) -> &Self {
        let metrics = match validate_metrics(&values.into()) {
            Ok(metrics) => metrics,
            Err(e) => {
                events::event_rejected("metrics", &e);
                return self;
            }
        };
        let call_site = match dimensions.into() {
            Value::Null => Dimensions::new(),
            other => match parse_dimensions(&other) {
                Ok(dimensions) => dimensions,
                Err(e) => {
                    events::event_rejected("metrics", &e);
                    return self;
                }
            },
        };
        for (key, value) in metrics {
            let dimensions = call_site.clone().with(METRIC_DIMENSION_KEY, key);
            self.dispatch(EventType::Metric, value, dimensions);
        }
        self
    }

    /// Start a waterfall whose commit is dispatched through this transaction.
    pub fn waterfall(&self, dimensions: impl Into<Value>) -> Waterfall {
        Waterfall::new(self.clone(), dimensions.into())
    }
}

/// Overlay `extra` on `base`. Objects merge key by key with `extra`
/// winning; `null` keeps `base`; anything else replaces it.
pub(crate) fn overlay(base: &Value, extra: Value) -> Value {
    match (base, extra) {
        (Value::Object(base), Value::Object(extra)) => {
            let mut merged = base.clone();
            merged.extend(extra);
            Value::Object(merged)
        }
        (base, Value::Null) => base.clone(),
        (_, extra) => extra,
    }
}

/// Milliseconds from `from` to `to`, negative when `to` is earlier.
pub(crate) fn signed_ms(from: Instant, to: Instant) -> f64 {
    match to.checked_duration_since(from) {
        Some(d) => d.as_secs_f64() * 1000.0,
        None => -(from.duration_since(to).as_secs_f64() * 1000.0),
    }
}
