//! Structured logging setup.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Output format for logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "human" | "pretty" | "text" => Ok(Self::Human),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// Install a global subscriber at INFO, overridable through `RUST_LOG`.
///
/// Returns false if a subscriber was already installed.
pub fn init_logging(format: LogFormat) -> bool {
    init_logging_with_level(format, Level::INFO)
}

/// Install a global subscriber with a default level, overridable through `RUST_LOG`.
pub fn init_logging_with_level(format: LogFormat, level: Level) -> bool {
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let registry = Registry::default().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
            .is_ok(),
        LogFormat::Human => registry.with(fmt::layer().with_target(false)).try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_init_logging_only_once() {
        let _ = init_logging(LogFormat::Human);
        let second = init_logging(LogFormat::Json);

        assert!(!second);
        tracing::info!("logging initialised");
    }
}
