//! Page and deployment configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Deployment paths and fetch settings shared by every controller of an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Path prefix the app is mounted under (e.g., "/shop"). Empty for root.
    pub basename: String,
    /// Public base path for static resources, as seen by the browser.
    pub public_path: String,
    /// Base path for static resources when fetched from the server itself.
    pub server_public_path: String,
    /// Base URL of the REST API exposed to pages.
    pub restapi: String,
    /// Optional timeout for preload fetches, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch_timeout_ms: Option<u64>,
    /// Whether pages render on the server at all.
    pub ssr: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            basename: String::new(),
            public_path: "/static".to_string(),
            server_public_path: "http://localhost:3000/static".to_string(),
            restapi: "/api".to_string(),
            fetch_timeout_ms: None,
            ssr: true,
        }
    }
}

impl PageConfig {
    /// Create a configuration mounted under `basename`.
    pub fn new(basename: impl Into<String>) -> Self {
        Self {
            basename: basename.into(),
            ..Default::default()
        }
    }

    /// Load config from a file. `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check path invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.basename.is_empty() && !self.basename.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "basename",
                reason: format!("must start with '/', got {:?}", self.basename),
            });
        }
        if self.basename.ends_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "basename",
                reason: "must not end with '/'".to_string(),
            });
        }
        if self.fetch_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "fetch_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Set the public resource path.
    pub fn with_public_path(mut self, path: impl Into<String>) -> Self {
        self.public_path = path.into();
        self
    }

    /// Set the server-local resource path.
    pub fn with_server_public_path(mut self, path: impl Into<String>) -> Self {
        self.server_public_path = path.into();
        self
    }

    /// Set the REST API base.
    pub fn with_restapi(mut self, restapi: impl Into<String>) -> Self {
        self.restapi = restapi.into();
        self
    }

    /// Set the preload fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Enable or disable server rendering.
    pub fn with_ssr(mut self, enabled: bool) -> Self {
        self.ssr = enabled;
        self
    }

    /// Get the preload fetch timeout, if configured.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_config_default() {
        let config = PageConfig::default();

        assert_eq!(config.basename, "");
        assert_eq!(config.public_path, "/static");
        assert_eq!(config.restapi, "/api");
        assert!(config.ssr);
        assert!(config.fetch_timeout().is_none());
    }

    #[test]
    fn test_page_config_builder_chain() {
        let config = PageConfig::new("/shop")
            .with_public_path("/shop/static")
            .with_restapi("https://api.example.com")
            .with_fetch_timeout(Duration::from_millis(750))
            .with_ssr(false);

        assert_eq!(config.basename, "/shop");
        assert_eq!(config.public_path, "/shop/static");
        assert_eq!(config.restapi, "https://api.example.com");
        assert_eq!(config.fetch_timeout(), Some(Duration::from_millis(750)));
        assert!(!config.ssr);
    }

    #[test]
    fn test_page_config_from_toml_partial() {
        let config = PageConfig::from_toml_str(
            r#"
            basename = "/app"
            fetch_timeout_ms = 200
            "#,
        )
        .unwrap();

        assert_eq!(config.basename, "/app");
        assert_eq!(config.public_path, "/static");
        assert_eq!(config.fetch_timeout(), Some(Duration::from_millis(200)));
    }

    #[test]
    fn test_page_config_rejects_relative_basename() {
        let err = PageConfig::new("app").validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "basename", .. }));
    }

    #[test]
    fn test_page_config_rejects_zero_timeout() {
        let result = PageConfig::from_toml_str("fetch_timeout_ms = 0");
        assert!(result.is_err());
    }

    #[test]
    fn test_page_config_load_json_and_toml() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("page.json");
        std::fs::write(&json_path, r#"{"basename": "/j", "restapi": "/v2"}"#).unwrap();
        let json = PageConfig::load(&json_path).unwrap();
        assert_eq!(json.basename, "/j");
        assert_eq!(json.restapi, "/v2");

        let toml_path = dir.path().join("page.toml");
        std::fs::write(&toml_path, "public_path = \"/assets\"\nssr = false\n").unwrap();
        let toml = PageConfig::load(&toml_path).unwrap();
        assert_eq!(toml.public_path, "/assets");
        assert!(!toml.ssr);
    }

    #[test]
    fn test_page_config_load_missing_file() {
        let err = PageConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
