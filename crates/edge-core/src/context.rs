//! Request identity and server-side request/response handles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use http::{Method, StatusCode};
use parking_lot::Mutex;

use crate::location::Location;

/// Unique request identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID from the clock and a process-local sequence.
    pub fn generate() -> Self {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Self(format!("{:x}-{:x}", nanos, SEQ.fetch_add(1, Ordering::Relaxed)))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one controller, unique within its request or page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ControllerId(pub u64);

impl std::fmt::Display for ControllerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP headers.
pub type Headers = HashMap<String, String>;

/// Typed request context available to pages during a server render.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier.
    pub request_id: RequestId,
    /// HTTP method.
    pub method: Method,
    /// Request URL path including query string.
    pub url: String,
    /// HTTP headers.
    pub headers: Headers,
}

impl RequestContext {
    /// Create a new request context.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::generate(),
            method,
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The request URL as a location.
    pub fn location(&self) -> Location {
        Location::parse(&self.url)
    }
}

#[derive(Debug)]
struct ResponseState {
    status: StatusCode,
    headers: Vec<(String, String)>,
}

/// Shared handle on the response being produced by a server render.
///
/// Cloning yields another handle to the same response.
#[derive(Debug, Clone)]
pub struct ResponseHandle {
    inner: Arc<Mutex<ResponseState>>,
}

impl ResponseHandle {
    /// Create a `200 OK` response with no headers.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ResponseState {
                status: StatusCode::OK,
                headers: Vec::new(),
            })),
        }
    }

    /// Current status code.
    pub fn status(&self) -> StatusCode {
        self.inner.lock().status
    }

    /// Set the status code.
    pub fn set_status(&self, status: StatusCode) {
        self.inner.lock().status = status;
    }

    /// Append a header; repeated names are kept (e.g., `Set-Cookie`).
    pub fn append_header(&self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.lock().headers.push((name.into(), value.into()));
    }

    /// Replace every header of this name with a single value.
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let mut state = self.inner.lock();
        state.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        state.headers.push((name, value.into()));
    }

    /// First header value with this name.
    pub fn header(&self, name: &str) -> Option<String> {
        self.inner
            .lock()
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    /// All header values with this name, in insertion order.
    pub fn header_values(&self, name: &str) -> Vec<String> {
        self.inner
            .lock()
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl Default for ResponseHandle {
    fn default() -> Self {
        Self::new()
    }
}
