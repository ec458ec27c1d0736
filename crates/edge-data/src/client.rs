//! Fetch client with timeout enforcement.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::timeout::{TimeoutConfig, TimeoutError};

/// Error type for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {status} for {url}")]
    Http { status: u16, url: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timeout: {url} after {after:?}")]
    Timeout { url: String, after: Duration },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request error: {0}")]
    Request(String),
}

/// Transport that retrieves a resource as text.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch `url` and return its body.
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Platform fetch client.
///
/// Wraps a transport and applies the configured timeout; a timeout surfaces as
/// [`FetchError::Timeout`].
#[derive(Clone)]
pub struct FetchClient {
    fetcher: Arc<dyn ResourceFetcher>,
    timeout: TimeoutConfig,
}

impl FetchClient {
    /// Create a new fetch client without a timeout.
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            timeout: TimeoutConfig::none(),
        }
    }

    /// Set the timeout for all fetches.
    pub fn with_timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    /// The configured timeout.
    pub fn timeout(&self) -> TimeoutConfig {
        self.timeout
    }

    /// Fetch a resource as text.
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        tracing::debug!(url, "fetching resource");
        match self.timeout.run(self.fetcher.fetch_text(url)).await {
            Ok(result) => result,
            Err(TimeoutError::Total(after)) => {
                tracing::warn!(url, ?after, "resource fetch timed out");
                Err(FetchError::Timeout {
                    url: url.to_string(),
                    after,
                })
            }
        }
    }
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::StaticFetcher;

    #[tokio::test]
    async fn test_fetch_client_passes_through() {
        let fetcher = StaticFetcher::new().with_resource("/a.txt", "hello");
        let client = FetchClient::new(Arc::new(fetcher));

        assert_eq!(client.fetch_text("/a.txt").await.unwrap(), "hello");
        assert_eq!(
            client.fetch_text("/missing").await.unwrap_err(),
            FetchError::NotFound("/missing".to_string())
        );
    }

    #[tokio::test]
    async fn test_fetch_client_timeout() {
        let fetcher = StaticFetcher::new()
            .with_resource("/slow.css", "body{}")
            .with_delay(Duration::from_secs(5));
        let client = FetchClient::new(Arc::new(fetcher))
            .with_timeout(TimeoutConfig::from_total(Duration::from_millis(20)));

        let err = client.fetch_text("/slow.css").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Timeout {
                url: "/slow.css".to_string(),
                after: Duration::from_millis(20),
            }
        );
    }
}
