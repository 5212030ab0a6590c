//! Scheduler: interval-driven flush of the process-wide delivery queue.
//!
//! Two states. `idle`: no check task exists. `armed`: exactly one check
//! task is alive; it sends when `reporting_interval` has elapsed since the
//! last send and otherwise sleeps for at most half the interval. The task
//! clears `armed` under the same lock it uses to see the queue empty, so
//! an enqueue racing with the last check always either lands in the queue
//! the task still drains or re-arms a fresh task.
//!
//! Every drain pass and every spawned send holds an [`InFlight`] token;
//! `flush` waits until none are outstanding.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use bitclock_core::constants::MIN_POLL_DELAY;
use bitclock_core::{ConfigStore, Event};
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::queue::{Pending, Stack};
use crate::sender::Sender;

#[derive(Debug)]
struct DeliveryState {
    queue: Stack<Event>,
    armed: bool,
    last_sent: Option<Instant>,
}

#[derive(Debug)]
pub struct Scheduler {
    config: ConfigStore,
    sender: Arc<Sender>,
    runtime: Handle,
    state: Mutex<DeliveryState>,
    /// Set while a drain pass is running, so a timer-triggered drain and a
    /// direct `flush` never interleave.
    in_progress: AtomicBool,
    /// Count of drain passes and sends not yet finished.
    in_flight: watch::Sender<usize>,
}

/// Clears the drain flag on every exit path.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the in-flight count raised until dropped.
struct InFlight(watch::Sender<usize>);

impl InFlight {
    fn new(counter: &watch::Sender<usize>) -> Self {
        counter.send_modify(|n| *n += 1);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Scheduler {
    pub fn new(config: ConfigStore, sender: Arc<Sender>, runtime: Handle) -> Self {
        Self {
            config,
            sender,
            runtime,
            state: Mutex::new(DeliveryState {
                queue: Stack::new(),
                armed: false,
                last_sent: None,
            }),
            in_progress: AtomicBool::new(false),
            in_flight: watch::channel(0).0,
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeliveryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an item for delivery and arm the check task if needed.
    ///
    /// Never runs a check inline: the task is spawned onto the runtime.
    /// Does nothing while delivery is disabled.
    pub fn enqueue(self: &Arc<Self>, item: Pending<Event>) {
        if !self.config.enabled() {
            tracing::debug!("delivery disabled, not enqueuing");
            return;
        }
        let arm = {
            let mut state = self.lock();
            state.queue.put(item);
            tracing::debug!(queue_size = state.queue.size(), "delivery queue: enqueue");
            !std::mem::replace(&mut state.armed, true)
        };
        if arm {
            let this = Arc::clone(self);
            self.runtime.spawn(async move { this.run_checks().await });
        }
    }

    async fn run_checks(self: Arc<Self>) {
        loop {
            let interval = self.config.reporting_interval();
            let due = self
                .lock()
                .last_sent
                .map_or(true, |sent| sent.elapsed() >= interval);
            tracing::trace!(due, "delivery queue: check");

            if due {
                let _pass = InFlight::new(&self.in_flight);
                self.lock().last_sent = Some(Instant::now());
                for batch in self.drain_backlog() {
                    let sender = Arc::clone(&self.sender);
                    let send = InFlight::new(&self.in_flight);
                    self.runtime.spawn(async move {
                        sender.send(batch).await;
                        drop(send);
                    });
                }
            }

            let delay = {
                let mut state = self.lock();
                if state.queue.is_empty() {
                    state.armed = false;
                    tracing::trace!("delivery queue: idle");
                    return;
                }
                let remaining = state
                    .last_sent
                    .map_or(Duration::ZERO, |sent| interval.saturating_sub(sent.elapsed()));
                next_poll_delay(remaining, interval)
            };
            tokio::time::sleep(delay).await;
        }
    }

    /// Drain the whole backlog in `max_chunk_size` passes.
    ///
    /// Returns no batches when another drain is already running.
    fn drain_backlog(&self) -> Vec<Vec<Event>> {
        if self.in_progress.swap(true, Ordering::AcqRel) {
            tracing::debug!("delivery queue: drain already in progress");
            return Vec::new();
        }
        let _guard = DrainGuard(&self.in_progress);

        let max = self.config.max_chunk_size();
        let mut batches = Vec::new();
        loop {
            let batch = self.lock().queue.drain(max);
            if batch.is_empty() {
                break;
            }
            tracing::debug!(batch_size = batch.len(), "delivery queue: drained batch");
            batches.push(batch);
        }
        batches
    }

    /// Drain everything now and wait for the sends to finish, including
    /// those the check task already started.
    pub async fn flush(&self) {
        let batches = self.drain_backlog();
        if !batches.is_empty() {
            self.lock().last_sent = Some(Instant::now());
            for batch in batches {
                self.sender.send(batch).await;
            }
        }
        let mut in_flight = self.in_flight.subscribe();
        if in_flight.wait_for(|n| *n == 0).await.is_err() {
            tracing::debug!("delivery queue: in-flight tracker closed");
        }
    }

    /// Drain passes and sends started by the check task and not yet done.
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    /// Items waiting in the delivery queue (heuristic).
    pub fn pending(&self) -> usize {
        self.lock().queue.size()
    }

    pub fn is_armed(&self) -> bool {
        self.lock().armed
    }

    pub fn sender(&self) -> &Arc<Sender> {
        &self.sender
    }
}

/// `min(remaining, ceil(interval / 2))`, never below `MIN_POLL_DELAY`.
fn next_poll_delay(remaining: Duration, interval: Duration) -> Duration {
    let half = Duration::from_millis((interval.as_millis() as u64).div_ceil(2));
    remaining.min(half).max(MIN_POLL_DELAY)
}
