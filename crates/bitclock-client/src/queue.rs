//! Stack: append-only, drainable FIFO of pending producers.
//!
//! Items are deferred producers, single values, or batches. Deferred
//! producers run lazily at drain time. Storage resets to empty once the
//! read cursor catches up with the write position, so repeated put/drain
//! cycles never grow the buffer.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// One queued item.
pub enum Pending<T> {
    /// Evaluated at drain time; may yield any number of records.
    Deferred(Box<dyn FnOnce() -> Vec<T> + Send>),
    Value(T),
    Batch(Vec<T>),
}

impl<T> Pending<T> {
    pub fn deferred(f: impl FnOnce() -> Vec<T> + Send + 'static) -> Self {
        Self::Deferred(Box::new(f))
    }
}

impl<T: fmt::Debug> fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deferred(_) => f.write_str("Deferred(..)"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Batch(vs) => f.debug_tuple("Batch").field(vs).finish(),
        }
    }
}

pub struct Stack<T> {
    slots: Vec<Option<Pending<T>>>,
    cursor: usize,
    /// Records already produced but not yet handed out. A pass that stops
    /// at `max` leaves the rest of a batch here for the next pass.
    spill: VecDeque<T>,
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Stack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stack")
            .field("pending", &(self.slots.len() - self.cursor))
            .field("spilled", &self.spill.len())
            .finish()
    }
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            cursor: 0,
            spill: VecDeque::new(),
        }
    }

    pub fn put(&mut self, item: Pending<T>) {
        self.slots.push(Some(item));
    }

    /// Pop the oldest unconsumed item.
    pub fn next(&mut self) -> Option<Pending<T>> {
        if self.cursor >= self.slots.len() {
            return None;
        }
        let item = self.slots[self.cursor].take();
        self.cursor += 1;
        if self.cursor >= self.slots.len() {
            self.slots.clear();
            self.cursor = 0;
        }
        item
    }

    /// Unconsumed items plus spilled records. A heuristic for callers; a
    /// deferred item may still turn out to produce nothing.
    pub fn size(&self) -> usize {
        self.slots.len() - self.cursor + self.spill.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Take up to `max` records in FIFO order.
    ///
    /// Returns exactly `min(max, available)` records. A deferred item that
    /// panics is logged and skipped.
    pub fn drain(&mut self, max: usize) -> Vec<T> {
        let mut out = Vec::with_capacity(max.min(self.size()));
        while out.len() < max {
            if let Some(record) = self.spill.pop_front() {
                out.push(record);
                continue;
            }
            let Some(item) = self.next() else {
                break;
            };
            match item {
                Pending::Value(record) => out.push(record),
                Pending::Batch(records) => self.spill.extend(records),
                Pending::Deferred(producer) => match catch_unwind(AssertUnwindSafe(producer)) {
                    Ok(records) => self.spill.extend(records),
                    Err(panic) => tracing::warn!(
                        panic = %panic_message(panic.as_ref()),
                        "deferred producer panicked, skipping it"
                    ),
                },
            }
        }
        out
    }

    /// Take every available record.
    pub fn drain_all(&mut self) -> Vec<T> {
        self.drain(usize::MAX)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic>"
    }
}
