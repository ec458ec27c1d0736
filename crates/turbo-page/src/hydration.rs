//! One-shot server-to-client state transfer.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::store::State;

/// Holds at most one pending state blob.
///
/// The server render sets it; the first client controller to initialize takes
/// it with [`HydrationChannel::peek_and_clear`]. Every later reader sees it
/// empty. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct HydrationChannel {
    slot: Arc<Mutex<Option<State>>>,
}

impl HydrationChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel already holding `state`.
    pub fn with_state(state: State) -> Self {
        let channel = Self::new();
        channel.set(state);
        channel
    }

    /// Rebuild a channel from the JSON embedded by the server. An empty
    /// input or `null` gives an empty channel.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        let state: Option<State> = serde_json::from_str(json)?;
        let channel = Self::new();
        *channel.slot.lock() = state;
        Ok(channel)
    }

    /// Store the blob to transfer, replacing any previous one.
    pub fn set(&self, state: State) {
        *self.slot.lock() = Some(state);
    }

    /// Take the pending blob, leaving the channel empty.
    pub fn peek_and_clear(&self) -> Option<State> {
        self.slot.lock().take()
    }

    /// True while a blob is waiting.
    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Pending blob as JSON for embedding in an HTML document, without
    /// consuming it. `<` is escaped so the payload cannot close a script tag.
    pub fn to_json(&self) -> Option<String> {
        let slot = self.slot.lock();
        let state = slot.as_ref()?;
        serde_json::to_string(state)
            .ok()
            .map(|json| json.replace('<', "\\u003c"))
    }
}
