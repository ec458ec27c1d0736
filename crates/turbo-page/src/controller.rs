//! Lifecycle coordinator.
//!
//! A [`PageController`] owns one page for one navigation. On the server it
//! runs once: guard, data hooks, preload, render, publish state for
//! hydration. In the client it either reuses the state the server published
//! (fast path) or replays the server sequence (full path), then binds the
//! store and navigation listeners until [`PageController::destroy`].
//!
//! ```text
//! Created ──init──► Initializing ──► ServerRendered | ClientReady
//!                        │                                 │
//!                        ├──► Suppressed | Aborted         destroy
//!                        └──► Failed                       ▼
//!                                    Reactivated ◄─restore─ Destroyed
//! ```

use std::sync::Arc;

use edge_core::{ControllerId, LeaveDecision, Location, PagePhase, PhaseEvent, TimingContext};
use parking_lot::Mutex;
use tracing::Instrument;

use crate::context::PageContext;
use crate::error::{PageError, Result};
use crate::handlers::{HandlerMap, HandlerRegistry, Scope};
use crate::meta::ControllerMeta;
use crate::model::{compose_initial_state, InitialState};
use crate::page::{Page, ServerRender, ViewProps};
use crate::preload::{PreloadLoader, PreloadReport};
use crate::store::{merge_actions, ActionTable, RefreshFn, State, Store, StoreBinder, PAGE_DID_BACK};

/// Result of [`PageController::init`].
#[derive(Debug)]
pub enum InitOutcome<V> {
    /// The page rendered.
    Rendered(V),
    /// The server guard declined; this is the fallback view.
    Suppressed(V),
    /// The creation guard returned false. Nothing was rendered.
    Aborted,
}

impl<V> InitOutcome<V> {
    /// The view, if any.
    pub fn into_view(self) -> Option<V> {
        match self {
            Self::Rendered(view) | Self::Suppressed(view) => Some(view),
            Self::Aborted => None,
        }
    }

    /// True when the page rendered.
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }

    /// True when the server guard declined.
    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed(_))
    }

    /// True when the creation guard declined.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

struct ControllerState {
    meta: ControllerMeta,
    location: Location,
    context: PageContext,
    store: Option<Arc<dyn Store>>,
    handlers: Option<Arc<HandlerMap>>,
    timing: TimingContext,
}

/// Drives one page through its lifecycle.
///
/// Usually held in an `Arc` so `destroy` can be called while `init` is still
/// awaiting hooks; the late bind then sees the destroyed flag and does
/// nothing.
pub struct PageController<P: Page> {
    page: Arc<P>,
    binder: StoreBinder,
    state: Mutex<ControllerState>,
}

impl<P: Page> PageController<P> {
    /// Create a controller with the next id of the context's request scope.
    pub fn new(page: impl Into<Arc<P>>, location: Location, context: PageContext) -> Self {
        let id = context.scope().next_controller_id();
        Self::with_id(id, page, location, context)
    }

    /// Create a controller with a caller-supplied id.
    ///
    /// The location's history key moves into the controller's metadata here,
    /// before any state is composed from the location.
    pub fn with_id(
        id: ControllerId,
        page: impl Into<Arc<P>>,
        mut location: Location,
        context: PageContext,
    ) -> Self {
        let key = location.take_key();
        Self {
            page: page.into(),
            binder: StoreBinder::default(),
            state: Mutex::new(ControllerState {
                meta: ControllerMeta::new(id, key),
                location,
                context,
                store: None,
                handlers: None,
                timing: TimingContext::new(),
            }),
        }
    }

    /// Call `refresh` with the new state after every store change, before
    /// [`Page::state_did_change`].
    pub fn with_refresh(mut self, refresh: RefreshFn) -> Self {
        self.binder = StoreBinder::new(refresh);
        self
    }

    // === Lifecycle ===

    /// Initialize the page and render it.
    pub async fn init(&self) -> Result<InitOutcome<P::View>> {
        let (id, location, context) = {
            let mut state = self.state.lock();
            if state.meta.phase != PagePhase::Created {
                return Err(PageError::InvalidTransition {
                    operation: "init",
                    phase: state.meta.phase.clone(),
                });
            }
            state.timing.mark("init_start");
            (state.meta.id, state.location.clone(), state.context.clone())
        };
        self.transition(PagePhase::Initializing);

        let span = tracing::info_span!(
            "page_init",
            page = self.page.name(),
            controller = id.0,
            environment = %context.kind(),
            path = %location.pathname,
        );

        let result = self.run_init(location, context).instrument(span).await;
        if let Err(err) = &result {
            tracing::warn!(page = self.page.name(), controller = id.0, error = %err, "page init failed");
            self.settle(PagePhase::Failed(err.to_string()));
        }
        result
    }

    async fn run_init(&self, location: Location, context: PageContext) -> Result<InitOutcome<P::View>> {
        // 1. Server guard
        if context.is_server() {
            let decision = if context.config().ssr {
                self.page
                    .should_server_render(&location, &context)
                    .await
                    .map_err(|e| PageError::hook("should_server_render", e))?
            } else {
                ServerRender::Suppress
            };
            if decision == ServerRender::Suppress {
                tracing::info!("server render suppressed");
                let view = self.page.fallback(&location, &context);
                self.settle(PagePhase::Suppressed);
                return Ok(InitOutcome::Suppressed(view));
            }
        }

        // 2. Defaults and actions
        let (initial, actions) = self.resolve_model();
        let defaults = initial.resolve(&location, &context);

        // 3. Hydration, read once and only in the client
        let global = if context.is_client() {
            context.hydration().peek_and_clear()
        } else {
            None
        };

        // 4-6. Compose, then refine or acknowledge reuse
        let mut initial_state = compose_initial_state(defaults, global.as_ref(), &location, &context);
        match &global {
            None => {
                initial_state = self
                    .page
                    .get_initial_state(initial_state, &location, &context)
                    .await
                    .map_err(|e| PageError::hook("get_initial_state", e))?;
            }
            Some(_) => self.page.state_did_reuse(&initial_state),
        }

        // 7-8. Store
        let actions = merge_actions(self.page.get_final_actions(actions));
        let store = context.store_factory().create(actions, initial_state);

        // 9. Handlers
        let scope = Scope::new(Arc::clone(&store), location, context.clone());
        let handlers = self.bind_handlers(scope.clone());
        {
            let mut state = self.state.lock();
            state.store = Some(Arc::clone(&store));
            state.handlers = Some(handlers);
        }

        // 10. Fast path
        if global.is_some() {
            tracing::debug!("reusing transferred state");
            self.bind();
            return self.finish(&context).map(InitOutcome::Rendered);
        }

        // 11. Full path
        let create = self
            .page
            .should_component_create(&scope)
            .await
            .map_err(|e| PageError::hook("should_component_create", e))?;
        self.mark("guard");
        if !create {
            tracing::info!("component creation declined");
            self.settle(PagePhase::Aborted);
            return Ok(InitOutcome::Aborted);
        }

        let loader = PreloadLoader::for_context(&context);
        let manifest = self.page.preload();
        let ((), report): ((), PreloadReport) = futures::try_join!(
            async {
                self.page
                    .component_will_create(&scope)
                    .await
                    .map_err(|e| PageError::hook("component_will_create", e))
            },
            async { loader.load(&manifest).await.map_err(PageError::from) },
        )?;
        self.mark("phase2");
        tracing::debug!(
            fetched = report.fetched.len(),
            cached = report.cached.len(),
            "data and preload settled"
        );

        self.bind();
        if context.is_server() {
            context.hydration().set(store.get_state());
        }
        self.finish(&context).map(InitOutcome::Rendered)
    }

    fn resolve_model(&self) -> (InitialState, ActionTable) {
        match (self.page.initial_state(), self.page.actions()) {
            (None, None) => self
                .page
                .model()
                .map(|model| (model.initial_state, model.actions))
                .unwrap_or_default(),
            (initial, actions) => (initial.unwrap_or_default(), actions.unwrap_or_default()),
        }
    }

    fn finish(&self, context: &PageContext) -> Result<P::View> {
        let view = self.render()?;
        self.settle(if context.is_server() {
            PagePhase::ServerRendered
        } else {
            PagePhase::ClientReady
        });
        Ok(view)
    }

    /// Bind the store and navigation listeners. Does nothing on the server, or
    /// once the controller is destroyed. Returns whether anything was bound.
    fn bind(&self) -> bool {
        let mut state = self.state.lock();
        if !state.context.is_client() || state.meta.is_destroyed {
            return false;
        }
        let Some(store) = state.store.clone() else {
            return false;
        };

        let page = Arc::clone(&self.page);
        let disposer = self
            .binder
            .bind(store.as_ref(), move |s: &State| page.state_did_change(s));
        state.meta.subscriptions.add(disposer);

        let hooks = self.page.navigation_hooks();
        let env = Arc::clone(state.context.env());
        if hooks.page_will_leave {
            let page = Arc::clone(&self.page);
            let listener = Arc::new(move |to: &Location| -> LeaveDecision { page.page_will_leave(to) });
            if let Some(disposer) = env.on_before_leave(listener) {
                state.meta.subscriptions.add(disposer);
            }
        }
        if hooks.window_will_unload {
            let page = Arc::clone(&self.page);
            let listener =
                Arc::new(move |location: &Location| -> LeaveDecision { page.window_will_unload(location) });
            if let Some(disposer) = env.on_before_unload(listener) {
                state.meta.subscriptions.add(disposer);
            }
        }

        state.meta.had_mounted = true;
        tracing::debug!(
            controller = state.meta.id.0,
            subscriptions = state.meta.subscriptions.len(),
            "bound"
        );
        true
    }

    /// Tear down every subscription. Safe to call any number of times.
    pub fn destroy(&self) {
        let (mut subscriptions, first) = {
            let mut state = self.state.lock();
            let first = !state.meta.is_destroyed;
            state.meta.is_destroyed = true;
            (std::mem::take(&mut state.meta.subscriptions), first)
        };
        let disposed = subscriptions.dispose_all();
        if first {
            tracing::debug!(page = self.page.name(), disposed, "destroyed");
            self.transition(PagePhase::Destroyed);
        }
    }

    /// Bring a destroyed page back through history navigation.
    ///
    /// Reuses the existing store: dispatches `__PAGE_DID_BACK__` with the new
    /// location, calls [`Page::page_did_back`], binds again and renders.
    /// Nothing is fetched. If the dispatch or the hook fails, the controller
    /// stays destroyed and `restore` may be retried.
    pub async fn restore(&self, mut location: Location, context: PageContext) -> Result<P::View> {
        let store = {
            let state = self.state.lock();
            let store = state.store.clone().ok_or(PageError::NotInitialized)?;
            if !state.meta.is_destroyed {
                return Err(PageError::InvalidTransition {
                    operation: "restore",
                    phase: state.meta.phase.clone(),
                });
            }
            store
        };
        let key = location.take_key();

        let scope = Scope::new(Arc::clone(&store), location.clone(), context.clone());
        store.dispatch(PAGE_DID_BACK, location.to_value())?;
        self.page
            .page_did_back(&scope)
            .await
            .map_err(|e| PageError::hook("page_did_back", e))?;

        let handlers = self.bind_handlers(scope);
        {
            let mut state = self.state.lock();
            state.meta.is_destroyed = false;
            state.meta.key = key;
            state.location = location.clone();
            state.context = context;
            state.handlers = Some(handlers);
        }

        self.bind();
        let view = self.render()?;
        self.transition(PagePhase::Reactivated);
        tracing::info!(page = self.page.name(), path = %location.pathname, "page restored");
        Ok(view)
    }

    /// Render the current state.
    pub fn render(&self) -> Result<P::View> {
        let (store, handlers) = {
            let state = self.state.lock();
            match (&state.store, &state.handlers) {
                (Some(store), Some(handlers)) => (Arc::clone(store), Arc::clone(handlers)),
                _ => return Err(PageError::NotInitialized),
            }
        };
        Ok(self.page.render(ViewProps {
            state: store.get_state(),
            handlers,
            store,
        }))
    }

    /// Rebuild the handler map against the current store, location and context.
    pub fn combine_handlers(&self) -> Result<Arc<HandlerMap>> {
        let scope = {
            let state = self.state.lock();
            let store = state.store.clone().ok_or(PageError::NotInitialized)?;
            Scope::new(store, state.location.clone(), state.context.clone())
        };
        let handlers = self.bind_handlers(scope);
        self.state.lock().handlers = Some(Arc::clone(&handlers));
        Ok(handlers)
    }

    fn bind_handlers(&self, scope: Scope) -> Arc<HandlerMap> {
        let mut registry = HandlerRegistry::new();
        self.page.handlers(&mut registry);
        Arc::new(registry.bind(scope))
    }

    // === Accessors ===

    pub fn id(&self) -> ControllerId {
        self.state.lock().meta.id
    }

    /// History key of the current navigation.
    pub fn key(&self) -> Option<String> {
        self.state.lock().meta.key.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().meta.is_destroyed
    }

    /// True once a client bind has succeeded.
    pub fn had_mounted(&self) -> bool {
        self.state.lock().meta.had_mounted
    }

    pub fn phase(&self) -> PagePhase {
        self.state.lock().meta.phase.clone()
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().meta.subscriptions.len()
    }

    /// The store, once `init` has built it.
    pub fn store(&self) -> Option<Arc<dyn Store>> {
        self.state.lock().store.clone()
    }

    /// The current location, without its history key.
    pub fn location(&self) -> Location {
        self.state.lock().location.clone()
    }

    pub fn page(&self) -> &Arc<P> {
        &self.page
    }

    /// Time between two timing marks (`init_start`, `guard`, `phase2`).
    pub fn timing_between(&self, from: &str, to: &str) -> Option<std::time::Duration> {
        self.state.lock().timing.between(from, to)
    }

    fn mark(&self, name: &str) {
        self.state.lock().timing.mark(name);
    }

    fn transition(&self, phase: PagePhase) {
        self.apply_phase(phase, false);
    }

    /// Like `transition`, but a destroyed controller keeps `Destroyed`.
    fn settle(&self, phase: PagePhase) {
        self.apply_phase(phase, true);
    }

    fn apply_phase(&self, phase: PagePhase, unless_destroyed: bool) {
        let (event, observers) = {
            let mut state = self.state.lock();
            if unless_destroyed && state.meta.is_destroyed {
                return;
            }
            state.meta.phase = phase.clone();
            let event = PhaseEvent {
                controller: state.meta.id,
                page: self.page.name().to_string(),
                environment: state.context.kind(),
                phase,
                elapsed: state.timing.elapsed(),
            };
            (event, state.context.observers().to_vec())
        };
        for observer in observers {
            observer.on_phase(&event);
        }
    }
}

impl<P: Page> std::fmt::Debug for PageController<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("PageController")
            .field("page", &self.page.name())
            .field("meta", &state.meta)
            .field("location", &state.location)
            .finish_non_exhaustive()
    }
}
