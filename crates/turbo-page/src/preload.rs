//! Preload resource loader.
//!
//! A page names the text resources it needs before rendering (stylesheets,
//! templates). The loader resolves each path against the side it runs on,
//! fetches everything the shared cache does not hold yet concurrently, and
//! stores the bodies by name. The first failure fails the whole load.

use edge_cache::PreloadCache;
use edge_data::{FetchClient, FetchError};
use futures::future::try_join_all;
use thiserror::Error;

use crate::context::PageContext;

/// Preload failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreloadError {
    #[error("Failed to preload `{name}` from {url}: {source}")]
    Fetch {
        name: String,
        url: String,
        #[source]
        source: FetchError,
    },
}

impl PreloadError {
    /// The underlying fetch error.
    pub fn fetch_error(&self) -> &FetchError {
        match self {
            Self::Fetch { source, .. } => source,
        }
    }
}

/// Ordered mapping from resource name to path or URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadManifest {
    entries: Vec<(String, String)>,
}

impl PreloadManifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource. An existing entry with the same name is replaced in place.
    pub fn with(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        let name = name.into();
        let path = path.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((name, path)),
        }
        self
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, p)| (n.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, P: Into<String>> FromIterator<(N, P)> for PreloadManifest {
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |manifest, (name, path)| manifest.with(name, path))
    }
}

/// True for `http://`, `https://` and protocol-relative `//` URLs.
pub fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
}

/// True when the path names a `.css` file, ignoring query and fragment.
pub fn is_stylesheet(path: &str) -> bool {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].to_ascii_lowercase().ends_with(".css")
}

/// Resolve a preload path. Absolute URLs are used as-is; anything else is
/// joined to `base` with exactly one `/`.
pub fn resolve_preload_path(base: &str, path: &str) -> String {
    if is_absolute_url(path) {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// What a load did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadReport {
    /// Names fetched and stored by this load.
    pub fetched: Vec<String>,
    /// Names already cached, not fetched.
    pub cached: Vec<String>,
}

/// Fetches manifest entries into a [`PreloadCache`].
#[derive(Debug, Clone)]
pub struct PreloadLoader {
    client: FetchClient,
    cache: PreloadCache,
    base: String,
}

impl PreloadLoader {
    /// Create a loader resolving relative paths against `base`.
    pub fn new(client: FetchClient, cache: PreloadCache, base: impl Into<String>) -> Self {
        Self {
            client,
            cache,
            base: base.into(),
        }
    }

    /// Loader for a page context: its fetch client, its shared cache, and the
    /// server or client public path depending on the environment.
    pub fn for_context(context: &PageContext) -> Self {
        Self::new(
            context.fetch().clone(),
            context.preload().clone(),
            context.resource_base(),
        )
    }

    /// Load every uncached entry concurrently.
    pub async fn load(&self, manifest: &PreloadManifest) -> Result<PreloadReport, PreloadError> {
        let mut report = PreloadReport::default();
        let mut pending = Vec::new();

        for (name, path) in manifest.entries() {
            if self.cache.contains(name) {
                report.cached.push(name.to_string());
            } else {
                pending.push(self.fetch_one(name, path));
            }
        }

        if pending.is_empty() {
            tracing::debug!(cached = report.cached.len(), "preload satisfied from cache");
            return Ok(report);
        }

        for (name, inserted) in try_join_all(pending).await? {
            if inserted {
                report.fetched.push(name);
            } else {
                // Another load stored it first.
                report.cached.push(name);
            }
        }

        tracing::debug!(
            fetched = report.fetched.len(),
            cached = report.cached.len(),
            "preload complete"
        );
        Ok(report)
    }

    async fn fetch_one(&self, name: &str, path: &str) -> Result<(String, bool), PreloadError> {
        let url = resolve_preload_path(&self.base, path);
        let body = self
            .client
            .fetch_text(&url)
            .await
            .map_err(|source| PreloadError::Fetch {
                name: name.to_string(),
                url: url.clone(),
                source,
            })?;

        let content = if is_stylesheet(path) {
            body.replace('\r', "")
        } else {
            body
        };
        let inserted = self.cache.insert_if_absent(name, content);
        Ok((name.to_string(), inserted))
    }
}
