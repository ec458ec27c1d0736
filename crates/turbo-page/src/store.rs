//! State store contract, the built-in store and change binding.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use edge_core::Disposer;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

/// Page state: a JSON object.
pub type State = Map<String, Value>;

/// A named state transition: current state plus payload to next state.
pub type Action = Arc<dyn Fn(&State, Value) -> Result<State, StoreError> + Send + Sync>;

/// Change listener, called with the new state after every dispatch.
pub type Listener = Arc<dyn Fn(&State) + Send + Sync>;

/// View-refresh callback installed by the embedding renderer.
pub type RefreshFn = Arc<dyn Fn(&State) + Send + Sync>;

/// Dispatched on the existing store when a page comes back through history.
pub const PAGE_DID_BACK: &str = "__PAGE_DID_BACK__";
/// Shallow-merges an object payload into the state.
pub const UPDATE_STATE: &str = "UPDATE_STATE";
/// Sets one nested value from a `{ "name": "a.b", "value": ... }` payload.
pub const UPDATE_INPUT_VALUE: &str = "UPDATE_INPUT_VALUE";

/// Store errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid payload for {action}: {reason}")]
    InvalidPayload { action: String, reason: String },
}

impl StoreError {
    /// Build an [`StoreError::InvalidPayload`].
    pub fn invalid_payload(action: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            action: action.to_string(),
            reason: reason.into(),
        }
    }
}

/// Named actions available on a store.
#[derive(Clone, Default)]
pub struct ActionTable {
    actions: BTreeMap<String, Action>,
}

impl ActionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an infallible action.
    pub fn with<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&State, Value) -> State + Send + Sync + 'static,
    {
        self.actions
            .insert(name.into(), Arc::new(move |state: &State, payload: Value| Ok(action(state, payload))));
        self
    }

    /// Add an action that can reject its payload.
    pub fn with_fallible<F>(mut self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&State, Value) -> Result<State, StoreError> + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Arc::new(action));
        self
    }

    /// Look up an action.
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// True when `name` is defined.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Defined action names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.actions.keys().cloned().collect()
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True when no actions are defined.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Overlay `other` on this table; `other` wins on name collisions.
    pub fn extend(&mut self, other: ActionTable) {
        self.actions.extend(other.actions);
    }
}

impl fmt::Debug for ActionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.actions.keys()).finish()
    }
}

/// Actions every page store carries.
pub fn shared_actions() -> ActionTable {
    ActionTable::new()
        .with(PAGE_DID_BACK, |state, location| {
            let mut next = state.clone();
            next.insert("location".to_string(), location);
            next
        })
        .with_fallible(UPDATE_STATE, |state, payload| match payload {
            Value::Object(patch) => {
                let mut next = state.clone();
                next.extend(patch);
                Ok(next)
            }
            other => Err(StoreError::invalid_payload(
                UPDATE_STATE,
                format!("expected object, got {}", other),
            )),
        })
        .with_fallible(UPDATE_INPUT_VALUE, |state, payload| {
            let name = payload
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| StoreError::invalid_payload(UPDATE_INPUT_VALUE, "missing `name`"))?;
            let value = payload.get("value").cloned().unwrap_or(Value::Null);
            let mut next = state.clone();
            set_by_path(&mut next, name, value);
            Ok(next)
        })
}

/// Merge page actions over the shared ones. Page actions win on collision.
pub fn merge_actions(page: ActionTable) -> ActionTable {
    let mut merged = shared_actions();
    merged.extend(page);
    merged
}

/// Set a dotted path (`a.b.c`), creating or replacing intermediate objects.
pub fn set_by_path(state: &mut State, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = state;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => unreachable!("slot was just made an object"),
        };
    }
}

/// State container contract.
pub trait Store: Send + Sync {
    /// Snapshot of the current state.
    fn get_state(&self) -> State;

    /// Register a change listener.
    fn subscribe(&self, listener: Listener) -> Disposer;

    /// Run a named action and notify listeners with the new state.
    fn dispatch(&self, action: &str, payload: Value) -> Result<State, StoreError>;

    /// Names of the actions this store accepts.
    fn action_names(&self) -> Vec<String>;

    /// Number of live listeners.
    fn listener_count(&self) -> usize;
}

/// Builds stores for controllers.
pub trait StoreFactory: Send + Sync {
    /// Create a store from merged actions and the composed initial state.
    fn create(&self, actions: ActionTable, initial: State) -> Arc<dyn Store>;
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: BTreeMap<u64, Listener>,
}

/// In-memory store.
pub struct MemoryStore {
    state: RwLock<State>,
    actions: ActionTable,
    listeners: Arc<Mutex<ListenerTable>>,
    dispatches: AtomicU64,
}

impl MemoryStore {
    /// Create a store.
    pub fn new(actions: ActionTable, initial: State) -> Self {
        Self {
            state: RwLock::new(initial),
            actions,
            listeners: Arc::new(Mutex::new(ListenerTable::default())),
            dispatches: AtomicU64::new(0),
        }
    }

    /// Number of successful dispatches.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }
}

impl Store for MemoryStore {
    fn get_state(&self) -> State {
        self.state.read().clone()
    }

    fn subscribe(&self, listener: Listener) -> Disposer {
        let id = {
            let mut table = self.listeners.lock();
            let id = table.next_id;
            table.next_id += 1;
            table.listeners.insert(id, listener);
            id
        };
        let listeners = Arc::clone(&self.listeners);
        Disposer::new(move || {
            listeners.lock().listeners.remove(&id);
        })
    }

    fn dispatch(&self, action: &str, payload: Value) -> Result<State, StoreError> {
        let reducer = self
            .actions
            .get(action)
            .ok_or_else(|| StoreError::UnknownAction(action.to_string()))?;

        let next = {
            let mut state = self.state.write();
            let next = reducer(&state, payload)?;
            *state = next.clone();
            next
        };
        self.dispatches.fetch_add(1, Ordering::Relaxed);

        // Listeners run outside both locks so they may read the store.
        let listeners: Vec<Listener> = self.listeners.lock().listeners.values().cloned().collect();
        for listener in listeners {
            listener(&next);
        }
        Ok(next)
    }

    fn action_names(&self) -> Vec<String> {
        self.actions.names()
    }

    fn listener_count(&self) -> usize {
        self.listeners.lock().listeners.len()
    }
}

/// Factory for [`MemoryStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStoreFactory;

impl StoreFactory for MemoryStoreFactory {
    fn create(&self, actions: ActionTable, initial: State) -> Arc<dyn Store> {
        Arc::new(MemoryStore::new(actions, initial))
    }
}

/// Wires store changes to the view-refresh callback and a change hook.
#[derive(Clone)]
pub struct StoreBinder {
    refresh: RefreshFn,
}

impl StoreBinder {
    /// Bind with a refresh callback.
    pub fn new(refresh: RefreshFn) -> Self {
        Self { refresh }
    }

    /// Subscribe: each change calls refresh, then `on_change`.
    pub fn bind<F>(&self, store: &dyn Store, on_change: F) -> Disposer
    where
        F: Fn(&State) + Send + Sync + 'static,
    {
        let refresh = Arc::clone(&self.refresh);
        store.subscribe(Arc::new(move |state: &State| {
            refresh(state);
            on_change(state);
        }))
    }
}

impl Default for StoreBinder {
    fn default() -> Self {
        Self::new(Arc::new(|_: &State| {}))
    }
}

impl fmt::Debug for StoreBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StoreBinder")
    }
}
