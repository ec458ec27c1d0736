//! Controller identity and status.

use edge_core::{ControllerId, PagePhase};

use crate::subscription::DisposerList;

/// Identity and status of one controller.
#[derive(Debug)]
pub struct ControllerMeta {
    /// Unique within the request or page session.
    pub id: ControllerId,
    /// History key taken from the location.
    pub key: Option<String>,
    /// Set by `destroy`, cleared by `restore`.
    pub is_destroyed: bool,
    /// Set on the first successful client bind.
    pub had_mounted: bool,
    /// Current phase.
    pub phase: PagePhase,
    /// Disposers of the current binding.
    pub subscriptions: DisposerList,
}

impl ControllerMeta {
    /// Fresh metadata in the `Created` phase.
    pub fn new(id: ControllerId, key: Option<String>) -> Self {
        Self {
            id,
            key,
            is_destroyed: false,
            had_mounted: false,
            phase: PagePhase::Created,
            subscriptions: DisposerList::new(),
        }
    }
}
