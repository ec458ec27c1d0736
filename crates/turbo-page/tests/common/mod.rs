//! Shared fixtures for controller tests.

#![allow(dead_code)]

use std::sync::Arc;

use edge_data::StaticFetcher;
use http::Method;
use parking_lot::Mutex;
use tokio::sync::Notify;
use turbo_page::prelude::*;
use turbo_page::{HydrationChannel, UPDATE_STATE};

/// Hook names in call order.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn push(&self, name: &str) {
        self.0.lock().push(name.to_string());
    }

    pub fn list(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.lock().iter().any(|c| c == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.0.lock().iter().filter(|c| *c == name).count()
    }
}

/// Pauses `component_will_create` until released.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// Configurable page recording every hook it sees.
#[derive(Default)]
pub struct TestPage {
    pub calls: Calls,
    pub defaults: State,
    pub actions: Option<ActionTable>,
    pub model: bool,
    pub suppress_server: bool,
    pub decline_create: bool,
    pub data_error: Option<String>,
    pub data_patch: Option<Value>,
    /// Failure for the next `page_did_back` only.
    pub back_error: Arc<Mutex<Option<String>>>,
    pub preload: PreloadManifest,
    pub gate: Option<Gate>,
    pub nav: NavigationHooks,
    pub block_leave: bool,
}

impl TestPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.defaults = object(defaults);
        self
    }
}

#[async_trait]
impl Page for TestPage {
    type View = String;

    fn name(&self) -> &str {
        "test_page"
    }

    fn model(&self) -> Option<Model> {
        self.model.then(|| {
            Model::new(
                self.defaults.clone(),
                ActionTable::new().with("from_model", |state, _| state.clone()),
            )
        })
    }

    fn initial_state(&self) -> Option<InitialState> {
        (!self.model).then(|| InitialState::from(self.defaults.clone()))
    }

    fn actions(&self) -> Option<ActionTable> {
        self.actions.clone()
    }

    fn preload(&self) -> PreloadManifest {
        self.preload.clone()
    }

    fn handlers(&self, registry: &mut HandlerRegistry) {
        registry.register("set_title", |scope, payload| {
            scope.dispatch(UPDATE_STATE, json!({ "title": payload }))?;
            Ok(())
        });
    }

    fn navigation_hooks(&self) -> NavigationHooks {
        self.nav
    }

    async fn should_server_render(
        &self,
        _location: &Location,
        _context: &PageContext,
    ) -> anyhow::Result<ServerRender> {
        self.calls.push("should_server_render");
        Ok(ServerRender::from(!self.suppress_server))
    }

    async fn get_initial_state(
        &self,
        state: State,
        _location: &Location,
        _context: &PageContext,
    ) -> anyhow::Result<State> {
        self.calls.push("get_initial_state");
        Ok(state)
    }

    fn state_did_reuse(&self, _state: &State) {
        self.calls.push("state_did_reuse");
    }

    async fn should_component_create(&self, _scope: &Scope) -> anyhow::Result<bool> {
        self.calls.push("should_component_create");
        Ok(!self.decline_create)
    }

    async fn component_will_create(&self, scope: &Scope) -> anyhow::Result<()> {
        self.calls.push("component_will_create");
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if let Some(reason) = &self.data_error {
            anyhow::bail!("{}", reason);
        }
        if let Some(patch) = &self.data_patch {
            scope.dispatch(UPDATE_STATE, patch.clone())?;
        }
        Ok(())
    }

    async fn page_did_back(&self, _scope: &Scope) -> anyhow::Result<()> {
        self.calls.push("page_did_back");
        if let Some(reason) = self.back_error.lock().take() {
            anyhow::bail!("{}", reason);
        }
        Ok(())
    }

    fn state_did_change(&self, _state: &State) {
        self.calls.push("state_did_change");
    }

    fn page_will_leave(&self, _to: &Location) -> LeaveDecision {
        self.calls.push("page_will_leave");
        if self.block_leave {
            LeaveDecision::Block
        } else {
            LeaveDecision::Allow
        }
    }

    fn window_will_unload(&self, _location: &Location) -> LeaveDecision {
        self.calls.push("window_will_unload");
        LeaveDecision::Allow
    }

    fn render(&self, props: ViewProps) -> String {
        serde_json::to_string(&props.state).unwrap_or_default()
    }

    fn fallback(&self, location: &Location, _context: &PageContext) -> String {
        format!("fallback:{}", location.pathname)
    }
}

pub fn object(value: Value) -> State {
    match value {
        Value::Object(map) => map,
        _ => State::new(),
    }
}

pub fn client_context(fetcher: &StaticFetcher, env: &ClientEnvironment) -> PageContext {
    client_context_with(PageConfig::default(), fetcher, env)
}

pub fn client_context_with(
    config: PageConfig,
    fetcher: &StaticFetcher,
    env: &ClientEnvironment,
) -> PageContext {
    PageContext::client(config, Arc::new(fetcher.clone()), env.clone())
}

pub fn server_context(fetcher: &StaticFetcher, path: &str) -> (PageContext, ResponseHandle) {
    server_context_with(PageConfig::default(), fetcher, path)
}

pub fn server_context_with(
    config: PageConfig,
    fetcher: &StaticFetcher,
    path: &str,
) -> (PageContext, ResponseHandle) {
    let response = ResponseHandle::new();
    let context = PageContext::server(
        config,
        Arc::new(fetcher.clone()),
        RequestContext::new(Method::GET, path),
        response.clone(),
    );
    (context, response)
}

pub fn hydrated_scope(state: Value) -> RequestScope {
    RequestScope::new().with_hydration(HydrationChannel::with_state(object(state)))
}
