//! Explicit handler registry.
//!
//! Pages declare their event handlers by name through
//! [`HandlerRegistry::register`]. The controller binds every handler to the
//! live [`Scope`] of the current navigation and hands the view an opaque
//! [`HandlerMap`] to call them through.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use edge_core::{Location, Redirect};
use serde_json::Value;

use crate::context::PageContext;
use crate::error::PageError;
use crate::store::{State, Store, StoreError};

/// A named handler: called with the bound scope and an event payload.
pub type Handler = Arc<dyn Fn(&Scope, Value) -> anyhow::Result<()> + Send + Sync>;

/// What a handler can reach.
#[derive(Clone)]
pub struct Scope {
    store: Arc<dyn Store>,
    location: Location,
    context: PageContext,
}

impl Scope {
    pub(crate) fn new(store: Arc<dyn Store>, location: Location, context: PageContext) -> Self {
        Self {
            store,
            location,
            context,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> State {
        self.store.get_state()
    }

    /// Dispatch an action on the page store.
    pub fn dispatch(&self, action: &str, payload: Value) -> Result<State, StoreError> {
        self.store.dispatch(action, payload)
    }

    /// Redirect through the environment.
    pub fn redirect(&self, target: &str, replace: bool) -> Redirect {
        self.context.redirect(target, replace)
    }

    /// The page store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The navigation this scope belongs to, without its history key.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The page context.
    pub fn context(&self) -> &PageContext {
        &self.context
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("location", &self.location)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Handlers declared by a page, not yet bound.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A second registration under the same name replaces
    /// the first.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&Scope, Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Bind every handler to `scope`.
    pub fn bind(self, scope: Scope) -> HandlerMap {
        HandlerMap {
            scope,
            handlers: self.handlers,
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}

/// Handlers bound to a scope.
pub struct HandlerMap {
    scope: Scope,
    handlers: BTreeMap<String, Handler>,
}

impl HandlerMap {
    /// Call a handler by name.
    pub fn call(&self, name: &str, payload: Value) -> Result<(), PageError> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| PageError::UnknownHandler(name.to_string()))?;

        handler(&self.scope, payload).map_err(|source| {
            tracing::warn!(handler = name, error = %source, "Handler failed");
            PageError::Handler {
                name: name.to_string(),
                source,
            }
        })
    }

    /// Registered handler names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// The bound scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl fmt::Debug for HandlerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMap")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
