//! Execution environment capability.
//!
//! A page runs either once on the server or indefinitely in an interactive
//! client. The difference is captured by one [`Environment`] object chosen at
//! construction, instead of flags tested throughout the controller.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use parking_lot::Mutex;

use crate::context::ResponseHandle;
use crate::disposer::Disposer;
use crate::location::Location;

/// Which side a page is executing on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentKind {
    /// One-shot render for a single request.
    Server,
    /// Long-lived interactive session.
    Client,
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// Answer of a navigation listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    /// Let the navigation proceed.
    Allow,
    /// Veto the navigation.
    Block,
}

/// Listener called before leaving the current page or closing the window.
pub type LeaveListener = Arc<dyn Fn(&Location) -> LeaveDecision + Send + Sync>;

/// A resolved redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Target path or URL.
    pub target: String,
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
}

/// Capabilities that differ between server and client.
pub trait Environment: Send + Sync + fmt::Debug {
    /// Which side this is.
    fn kind(&self) -> EnvironmentKind;

    /// True when rendering on the server.
    fn is_server(&self) -> bool {
        self.kind() == EnvironmentKind::Server
    }

    /// True when running in the interactive client.
    fn is_client(&self) -> bool {
        self.kind() == EnvironmentKind::Client
    }

    /// Register a listener fired before navigating away. `None` where
    /// navigation does not exist.
    fn on_before_leave(&self, listener: LeaveListener) -> Option<Disposer>;

    /// Register a listener fired before the window unloads. `None` where
    /// there is no window.
    fn on_before_unload(&self, listener: LeaveListener) -> Option<Disposer>;

    /// Redirect synchronously.
    fn redirect(&self, target: &str, replace: bool) -> Redirect;
}

/// Server environment: no navigation, redirects become HTTP responses.
#[derive(Debug, Clone, Default)]
pub struct ServerEnvironment {
    response: ResponseHandle,
}

impl ServerEnvironment {
    /// Create a server environment writing to `response`.
    pub fn new(response: ResponseHandle) -> Self {
        Self { response }
    }

    /// The response handle redirects are written to.
    pub fn response(&self) -> &ResponseHandle {
        &self.response
    }
}

impl Environment for ServerEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Server
    }

    fn on_before_leave(&self, _listener: LeaveListener) -> Option<Disposer> {
        None
    }

    fn on_before_unload(&self, _listener: LeaveListener) -> Option<Disposer> {
        None
    }

    /// Always a temporary redirect. `replace` only matters for client history.
    fn redirect(&self, target: &str, replace: bool) -> Redirect {
        self.response.set_status(StatusCode::FOUND);
        self.response.set_header("Location", target);
        Redirect {
            target: target.to_string(),
            replace,
        }
    }
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: BTreeMap<u64, LeaveListener>,
}

/// Ordered set of leave listeners with per-listener removal.
#[derive(Clone, Default)]
struct ListenerSet {
    inner: Arc<Mutex<ListenerTable>>,
}

impl ListenerSet {
    fn add(&self, listener: LeaveListener) -> Disposer {
        let id = {
            let mut table = self.inner.lock();
            let id = table.next_id;
            table.next_id += 1;
            table.listeners.insert(id, listener);
            id
        };
        let inner = Arc::clone(&self.inner);
        Disposer::new(move || {
            inner.lock().listeners.remove(&id);
        })
    }

    fn fire(&self, location: &Location) -> LeaveDecision {
        // Snapshot first: a listener may dispose itself.
        let listeners: Vec<LeaveListener> = self.inner.lock().listeners.values().cloned().collect();
        let mut decision = LeaveDecision::Allow;
        for listener in listeners {
            if listener(location) == LeaveDecision::Block {
                decision = LeaveDecision::Block;
            }
        }
        decision
    }

    fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

/// Client environment: navigation listeners and history redirects.
///
/// The embedding router drives [`ClientEnvironment::leave`] and
/// [`ClientEnvironment::unload`]; redirects are queued for it to apply.
#[derive(Clone, Default)]
pub struct ClientEnvironment {
    leave: ListenerSet,
    unload: ListenerSet,
    redirects: Arc<Mutex<Vec<Redirect>>>,
}

impl ClientEnvironment {
    /// Create a client environment with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire leave listeners for a navigation towards `to`.
    pub fn leave(&self, to: &Location) -> LeaveDecision {
        self.leave.fire(to)
    }

    /// Fire unload listeners for the current `location`.
    pub fn unload(&self, location: &Location) -> LeaveDecision {
        self.unload.fire(location)
    }

    /// Number of registered leave listeners.
    pub fn leave_listener_count(&self) -> usize {
        self.leave.len()
    }

    /// Number of registered unload listeners.
    pub fn unload_listener_count(&self) -> usize {
        self.unload.len()
    }

    /// Drain redirects requested since the last call.
    pub fn take_redirects(&self) -> Vec<Redirect> {
        std::mem::take(&mut *self.redirects.lock())
    }
}

impl fmt::Debug for ClientEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientEnvironment")
            .field("leave_listeners", &self.leave.len())
            .field("unload_listeners", &self.unload.len())
            .finish()
    }
}

impl Environment for ClientEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Client
    }

    fn on_before_leave(&self, listener: LeaveListener) -> Option<Disposer> {
        Some(self.leave.add(listener))
    }

    fn on_before_unload(&self, listener: LeaveListener) -> Option<Disposer> {
        Some(self.unload.add(listener))
    }

    fn redirect(&self, target: &str, replace: bool) -> Redirect {
        let redirect = Redirect {
            target: target.to_string(),
            replace,
        };
        self.redirects.lock().push(redirect.clone());
        redirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_environment_kind() {
        let env = ServerEnvironment::default();

        assert!(env.is_server());
        assert!(!env.is_client());
        assert_eq!(env.kind().to_string(), "server");
    }

    #[test]
    fn test_server_environment_has_no_listeners() {
        let env = ServerEnvironment::default();
        let listener: LeaveListener = Arc::new(|_: &Location| LeaveDecision::Block);

        assert!(env.on_before_leave(listener.clone()).is_none());
        assert!(env.on_before_unload(listener).is_none());
    }

    #[test]
    fn test_server_redirect_writes_response() {
        let response = ResponseHandle::new();
        let env = ServerEnvironment::new(response.clone());

        let redirect = env.redirect("/login", false);

        assert_eq!(redirect.target, "/login");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.header("location").as_deref(), Some("/login"));
    }

    #[test]
    fn test_server_replace_redirect_stays_temporary() {
        let response = ResponseHandle::new();
        let env = ServerEnvironment::new(response.clone());

        let redirect = env.redirect("/login", true);

        assert!(redirect.replace);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.header("location").as_deref(), Some("/login"));
    }

    #[test]
    fn test_client_leave_listener_veto() {
        let env = ClientEnvironment::new();
        let allow = env.on_before_leave(Arc::new(|_: &Location| LeaveDecision::Allow)).unwrap();
        let block = env.on_before_leave(Arc::new(|_: &Location| LeaveDecision::Block)).unwrap();

        assert_eq!(env.leave_listener_count(), 2);
        assert_eq!(env.leave(&Location::new("/next")), LeaveDecision::Block);

        block.dispose();
        assert_eq!(env.leave(&Location::new("/next")), LeaveDecision::Allow);

        allow.dispose();
        assert_eq!(env.leave_listener_count(), 0);
    }

    #[test]
    fn test_client_unload_listeners_separate() {
        let env = ClientEnvironment::new();
        let _d = env.on_before_unload(Arc::new(|_: &Location| LeaveDecision::Block)).unwrap();

        assert_eq!(env.unload_listener_count(), 1);
        assert_eq!(env.leave_listener_count(), 0);
        assert_eq!(env.unload(&Location::new("/")), LeaveDecision::Block);
    }

    #[test]
    fn test_client_redirect_queued() {
        let env = ClientEnvironment::new();
        env.redirect("/a", false);
        env.redirect("/b", true);

        let redirects = env.take_redirects();
        assert_eq!(redirects.len(), 2);
        assert!(redirects[1].replace);
        assert!(env.take_redirects().is_empty());
    }
}
