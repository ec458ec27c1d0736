//! The page contract.

use std::sync::Arc;

use async_trait::async_trait;
use edge_core::{LeaveDecision, Location};

use crate::context::PageContext;
use crate::handlers::{HandlerMap, HandlerRegistry, Scope};
use crate::model::{InitialState, Model};
use crate::preload::PreloadManifest;
use crate::store::{ActionTable, State, Store};

/// Outcome of the server-render guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerRender {
    /// Run the full lifecycle and render.
    #[default]
    Render,
    /// Skip everything and return the fallback view.
    Suppress,
}

impl From<bool> for ServerRender {
    fn from(render: bool) -> Self {
        if render {
            Self::Render
        } else {
            Self::Suppress
        }
    }
}

/// Which navigation listeners a page wants bound in the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationHooks {
    /// Bind [`Page::page_will_leave`].
    pub page_will_leave: bool,
    /// Bind [`Page::window_will_unload`].
    pub window_will_unload: bool,
}

/// Everything a page needs to produce its view.
#[derive(Clone)]
pub struct ViewProps {
    /// Current state snapshot.
    pub state: State,
    /// Bound handlers.
    pub handlers: Arc<HandlerMap>,
    /// The page store.
    pub store: Arc<dyn Store>,
}

impl std::fmt::Debug for ViewProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewProps")
            .field("state", &self.state)
            .field("handlers", &self.handlers)
            .finish_non_exhaustive()
    }
}

/// A unit of view and state driven by a [`PageController`](crate::PageController).
///
/// Only [`Page::render`] and [`Page::fallback`] are required. Every hook has
/// a default that lets the lifecycle proceed unchanged.
///
/// Default state and actions come from [`Page::initial_state`] and
/// [`Page::actions`]. When both are `None`, [`Page::model`] is used instead.
#[async_trait]
pub trait Page: Send + Sync + 'static {
    /// What [`Page::render`] produces.
    type View: Send + 'static;

    /// Name used in logs and lifecycle events.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Default state and actions together.
    fn model(&self) -> Option<Model> {
        None
    }

    /// Default state.
    fn initial_state(&self) -> Option<InitialState> {
        None
    }

    /// Page actions. They override shared actions of the same name.
    fn actions(&self) -> Option<ActionTable> {
        None
    }

    /// Resources to fetch before the first render.
    fn preload(&self) -> PreloadManifest {
        PreloadManifest::new()
    }

    /// Declare event handlers.
    fn handlers(&self, _registry: &mut HandlerRegistry) {}

    /// Navigation listeners to bind.
    fn navigation_hooks(&self) -> NavigationHooks {
        NavigationHooks::default()
    }

    /// Server only: decide whether to render at all.
    async fn should_server_render(
        &self,
        _location: &Location,
        _context: &PageContext,
    ) -> anyhow::Result<ServerRender> {
        Ok(ServerRender::Render)
    }

    /// Refine the composed state when no server state was transferred.
    async fn get_initial_state(
        &self,
        state: State,
        _location: &Location,
        _context: &PageContext,
    ) -> anyhow::Result<State> {
        Ok(state)
    }

    /// Called instead of [`Page::get_initial_state`] when server state was
    /// reused.
    fn state_did_reuse(&self, _state: &State) {}

    /// Last chance to transform the page actions before the store is built.
    fn get_final_actions(&self, actions: ActionTable) -> ActionTable {
        actions
    }

    /// Creation guard. `false` aborts `init` without rendering.
    async fn should_component_create(&self, _scope: &Scope) -> anyhow::Result<bool> {
        Ok(true)
    }

    /// Data hook, run concurrently with the preload.
    async fn component_will_create(&self, _scope: &Scope) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called when the page is restored through history.
    async fn page_did_back(&self, _scope: &Scope) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after every store change while bound.
    fn state_did_change(&self, _state: &State) {}

    /// Called before navigating away, when enabled in [`Page::navigation_hooks`].
    fn page_will_leave(&self, _to: &Location) -> LeaveDecision {
        LeaveDecision::Allow
    }

    /// Called before the window unloads, when enabled in [`Page::navigation_hooks`].
    fn window_will_unload(&self, _location: &Location) -> LeaveDecision {
        LeaveDecision::Allow
    }

    /// Produce the view.
    fn render(&self, props: ViewProps) -> Self::View;

    /// View returned when the server render is suppressed.
    fn fallback(&self, location: &Location, context: &PageContext) -> Self::View;
}
