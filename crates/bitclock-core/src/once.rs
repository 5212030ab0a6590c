//! One-shot capability: the first `fire` runs, later calls replay its result.

/// Stateful replacement for closure-captured "already called" flags.
///
/// Used for span close capabilities (idempotent close) and for memoized
/// lookups that need an explicit [`OneShot::reset`].
#[derive(Debug, Clone)]
pub struct OneShot<R> {
    result: Option<R>,
}

impl<R: Clone> OneShot<R> {
    pub fn new() -> Self {
        Self { result: None }
    }

    /// Run `f` on the first call and store its result; every later call
    /// returns the stored result without running `f`.
    pub fn fire<F: FnOnce() -> R>(&mut self, f: F) -> R {
        if let Some(result) = &self.result {
            return result.clone();
        }
        let result = f();
        self.result = Some(result.clone());
        result
    }

    pub fn has_fired(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    /// Forget the stored result so the next `fire` runs again.
    pub fn reset(&mut self) {
        self.result = None;
    }
}

impl<R: Clone> Default for OneShot<R> {
    fn default() -> Self {
        Self::new()
    }
}
