//! Configuration errors.

/// Errors raised while validating configuration, before any network effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid cookie expiry: {0}")]
    InvalidExpiry(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
