//! Timeout configuration for fetch operations.

use std::future::Future;
use std::time::Duration;

/// Timeout configuration for a fetch operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeoutConfig {
    /// Total operation timeout. `None` waits indefinitely.
    pub total: Option<Duration>,
}

impl TimeoutConfig {
    /// No timeout.
    pub fn none() -> Self {
        Self { total: None }
    }

    /// Create from a single total timeout.
    pub fn from_total(total: Duration) -> Self {
        Self { total: Some(total) }
    }

    /// Run `fut`, failing with [`TimeoutError`] if it outlives the total timeout.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, TimeoutError> {
        match self.total {
            Some(total) => tokio::time::timeout(total, fut)
                .await
                .map_err(|_| TimeoutError::Total(total)),
            None => Ok(fut.await),
        }
    }
}

/// Error when a timeout is exceeded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeoutError {
    #[error("Total timeout after {0:?}")]
    Total(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_none_waits() {
        let config = TimeoutConfig::none();
        let value = config
            .run(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                7
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_timeout_total_exceeded() {
        let config = TimeoutConfig::from_total(Duration::from_millis(10));
        let err = config
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert_eq!(err, TimeoutError::Total(Duration::from_millis(10)));
    }

    #[tokio::test]
    async fn test_timeout_total_met() {
        let config = TimeoutConfig::from_total(Duration::from_secs(5));
        assert!(config.run(async { "ok" }).await.is_ok());
    }
}
