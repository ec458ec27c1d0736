//! Per-request scope and the context handed to every controller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use edge_cache::PreloadCache;
use edge_core::{
    ClientEnvironment, ControllerId, CookieJar, Environment, EnvironmentKind, LifecycleObserver,
    PageConfig, Redirect, RequestContext, ResponseHandle, ServerEnvironment,
};
use edge_data::{FetchClient, ResourceFetcher, TimeoutConfig};

use crate::hydration::HydrationChannel;
use crate::store::{MemoryStoreFactory, StoreFactory};

/// State shared by the controllers of one request (server) or one page
/// session (client): the controller id sequence, the hydration channel and
/// the preload cache. Clones share everything.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    next_id: Arc<AtomicU64>,
    hydration: HydrationChannel,
    preload: PreloadCache,
}

impl RequestScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing hydration channel (e.g., rebuilt from server output).
    pub fn with_hydration(mut self, hydration: HydrationChannel) -> Self {
        self.hydration = hydration;
        self
    }

    /// Use an existing preload cache (e.g., transferred from the server).
    pub fn with_preload(mut self, preload: PreloadCache) -> Self {
        self.preload = preload;
        self
    }

    /// Next controller id, starting at 1.
    pub fn next_controller_id(&self) -> ControllerId {
        ControllerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// The hydration channel.
    pub fn hydration(&self) -> &HydrationChannel {
        &self.hydration
    }

    /// The preload cache.
    pub fn preload(&self) -> &PreloadCache {
        &self.preload
    }
}

/// Environment context supplied to every controller.
#[derive(Clone)]
pub struct PageContext {
    env: Arc<dyn Environment>,
    config: Arc<PageConfig>,
    scope: RequestScope,
    fetch: FetchClient,
    store_factory: Arc<dyn StoreFactory>,
    observers: Vec<Arc<dyn LifecycleObserver>>,
    cookies: CookieJar,
    request: Option<RequestContext>,
    response: Option<ResponseHandle>,
}

impl PageContext {
    /// Create a context for `env`. The fetch timeout comes from `config`.
    pub fn new(
        env: Arc<dyn Environment>,
        config: PageConfig,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        let timeout = config
            .fetch_timeout()
            .map(TimeoutConfig::from_total)
            .unwrap_or_default();
        Self {
            env,
            config: Arc::new(config),
            scope: RequestScope::new(),
            fetch: FetchClient::new(fetcher).with_timeout(timeout),
            store_factory: Arc::new(MemoryStoreFactory),
            observers: Vec::new(),
            cookies: CookieJar::new(),
            request: None,
            response: None,
        }
    }

    /// Context for a server render of `request`, writing to `response`.
    /// Cookies are read from the request's `Cookie` header.
    pub fn server(
        config: PageConfig,
        fetcher: Arc<dyn ResourceFetcher>,
        request: RequestContext,
        response: ResponseHandle,
    ) -> Self {
        let env = Arc::new(ServerEnvironment::new(response.clone()));
        let cookies = request
            .header("cookie")
            .map(CookieJar::from_header)
            .unwrap_or_default();
        let mut context = Self::new(env, config, fetcher);
        context.cookies = cookies;
        context.request = Some(request);
        context.response = Some(response);
        context
    }

    /// Context for an interactive client session.
    pub fn client(
        config: PageConfig,
        fetcher: Arc<dyn ResourceFetcher>,
        env: ClientEnvironment,
    ) -> Self {
        Self::new(Arc::new(env), config, fetcher)
    }

    /// Share a request scope.
    pub fn with_scope(mut self, scope: RequestScope) -> Self {
        self.scope = scope;
        self
    }

    /// Use a custom store factory.
    pub fn with_store_factory(mut self, factory: Arc<dyn StoreFactory>) -> Self {
        self.store_factory = factory;
        self
    }

    /// Add a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Use a cookie jar.
    pub fn with_cookies(mut self, cookies: CookieJar) -> Self {
        self.cookies = cookies;
        self
    }

    /// The environment capability.
    pub fn env(&self) -> &Arc<dyn Environment> {
        &self.env
    }

    /// Which side this context runs on.
    pub fn kind(&self) -> EnvironmentKind {
        self.env.kind()
    }

    /// True on the server.
    pub fn is_server(&self) -> bool {
        self.env.is_server()
    }

    /// True in the client.
    pub fn is_client(&self) -> bool {
        self.env.is_client()
    }

    /// Deployment configuration.
    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    /// App mount prefix.
    pub fn basename(&self) -> &str {
        &self.config.basename
    }

    /// Public static path.
    pub fn public_path(&self) -> &str {
        &self.config.public_path
    }

    /// REST API base.
    pub fn restapi(&self) -> &str {
        &self.config.restapi
    }

    /// Base path relative preload resources resolve against on this side.
    pub fn resource_base(&self) -> &str {
        match self.kind() {
            EnvironmentKind::Server => &self.config.server_public_path,
            EnvironmentKind::Client => &self.config.public_path,
        }
    }

    /// The request scope.
    pub fn scope(&self) -> &RequestScope {
        &self.scope
    }

    /// The shared preload cache.
    pub fn preload(&self) -> &PreloadCache {
        self.scope.preload()
    }

    /// The hydration channel.
    pub fn hydration(&self) -> &HydrationChannel {
        self.scope.hydration()
    }

    /// Fetch client for preloads.
    pub fn fetch(&self) -> &FetchClient {
        &self.fetch
    }

    /// Store factory.
    pub fn store_factory(&self) -> &Arc<dyn StoreFactory> {
        &self.store_factory
    }

    /// Lifecycle observers.
    pub fn observers(&self) -> &[Arc<dyn LifecycleObserver>] {
        &self.observers
    }

    /// Cookies.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// The server request, if rendering on the server.
    pub fn request(&self) -> Option<&RequestContext> {
        self.request.as_ref()
    }

    /// The server response, if rendering on the server.
    pub fn response(&self) -> Option<&ResponseHandle> {
        self.response.as_ref()
    }

    /// Redirect through the environment, resolved synchronously.
    pub fn redirect(&self, target: &str, replace: bool) -> Redirect {
        self.env.redirect(target, replace)
    }
}

impl fmt::Debug for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("env", &self.env)
            .field("config", &self.config)
            .field("scope", &self.scope)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
