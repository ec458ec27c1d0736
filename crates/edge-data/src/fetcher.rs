//! Built-in transports.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{FetchError, ResourceFetcher};

/// In-memory transport (for development/testing).
///
/// Serves fixed bodies by exact URL and records every URL requested.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    resources: HashMap<String, String>,
    failures: HashMap<String, FetchError>,
    delay: Option<Duration>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StaticFetcher {
    /// Create an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` at `url`.
    pub fn with_resource(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.resources.insert(url.into(), body.into());
        self
    }

    /// Fail requests for `url` with `error`.
    pub fn with_failure(mut self, url: impl Into<String>, error: FetchError) -> Self {
        self.failures.insert(url.into(), error);
        self
    }

    /// Delay every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs requested so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ResourceFetcher for StaticFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failures.get(url) {
            return Err(err.clone());
        }
        self.resources
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

/// Filesystem transport serving server-local resources from a root directory.
///
/// A URL's path (query and fragment dropped) is resolved under the root;
/// `..` segments are rejected.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
    prefix: String,
}

impl FileFetcher {
    /// Serve files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: String::new(),
        }
    }

    /// Strip `prefix` (e.g., "http://localhost:3000/static") from URLs before
    /// resolving them.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn resolve(&self, url: &str) -> Result<PathBuf, FetchError> {
        let path = url.strip_prefix(self.prefix.as_str()).unwrap_or(url);
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let relative = Path::new(path.trim_start_matches('/'));

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::Request(format!("path escapes root: {}", url)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResourceFetcher for FileFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let path = self.resolve(url)?;
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(url.to_string()),
            _ => FetchError::Connection(format!("{}: {}", path.display(), e)),
        })
    }
}
