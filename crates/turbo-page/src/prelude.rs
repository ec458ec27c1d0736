//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use turbo_page::prelude::*;
//! ```

pub use async_trait::async_trait;
pub use serde_json::{json, Value};

pub use edge_core::{
    ClientEnvironment, LeaveDecision, Location, PageConfig, RequestContext, ResponseHandle,
    ServerEnvironment,
};

pub use crate::{
    ActionTable, HandlerRegistry, InitOutcome, InitialState, Model, NavigationHooks, Page,
    PageContext, PageController, PageError, PreloadManifest, RequestScope, Scope, ServerRender,
    State, Store, ViewProps,
};
