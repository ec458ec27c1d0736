//! Error types for page controllers.

use edge_core::{ConfigError, PagePhase};
use thiserror::Error;

use crate::preload::PreloadError;
use crate::store::StoreError;

/// Errors returned by [`PageController`](crate::PageController) operations.
#[derive(Error, Debug)]
pub enum PageError {
    /// A page hook returned an error.
    #[error("Hook `{hook}` failed: {source}")]
    Hook {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A preload resource could not be fetched.
    #[error(transparent)]
    Preload(#[from] PreloadError),

    /// A store dispatch was rejected.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The operation needs a store built by `init`.
    #[error("Controller has not been initialized")]
    NotInitialized,

    /// The operation is not allowed in the current phase.
    #[error("Cannot {operation} while {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: PagePhase,
    },

    /// No handler registered under this name.
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    /// A handler returned an error.
    #[error("Handler `{name}` failed: {source}")]
    Handler {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PageError {
    pub(crate) fn hook(hook: &'static str, source: anyhow::Error) -> Self {
        Self::Hook { hook, source }
    }
}

/// Result alias for page operations.
pub type Result<T, E = PageError> = std::result::Result<T, E>;
