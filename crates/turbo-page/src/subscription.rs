//! Subscription registry.

use edge_core::Disposer;

/// Disposers collected while a controller is bound.
///
/// [`DisposerList::dispose_all`] drains the list before running anything, so
/// each disposer runs at most once no matter how often teardown is requested.
#[derive(Debug, Default)]
pub struct DisposerList {
    disposers: Vec<Disposer>,
}

impl DisposerList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a disposer.
    pub fn add(&mut self, disposer: Disposer) {
        self.disposers.push(disposer);
    }

    /// Run every disposer in insertion order and clear the list. Returns how
    /// many ran.
    pub fn dispose_all(&mut self) -> usize {
        let drained = std::mem::take(&mut self.disposers);
        let count = drained.len();
        for disposer in drained {
            disposer.dispose();
        }
        count
    }

    /// Number of pending disposers.
    pub fn len(&self) -> usize {
        self.disposers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.disposers.is_empty()
    }
}
