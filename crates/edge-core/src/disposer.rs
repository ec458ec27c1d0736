//! One-shot teardown callbacks.

use std::fmt;

/// A zero-argument operation that reverses a prior subscription or registration.
///
/// Consumed by [`Disposer::dispose`], so it can never run twice.
pub struct Disposer(Box<dyn FnOnce() + Send>);

impl Disposer {
    /// Wrap a teardown closure.
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(f))
    }

    /// A disposer that does nothing.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    /// Run the teardown.
    pub fn dispose(self) {
        (self.0)()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Disposer")
    }
}
