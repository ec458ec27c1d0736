//! Per-navigation page controllers.
//!
//! A page is a unit of view and state that runs once on the server and then
//! indefinitely in an interactive client. This crate coordinates its setup on
//! both sides:
//! - `PageController` - Lifecycle coordinator: `init`, `restore`, `destroy`, `render`
//! - `Page` - The hook contract a page implements
//! - `HydrationChannel` - One-shot transfer of server state to the client
//! - `PreloadLoader` - Concurrent fetch of named text resources into the shared cache
//! - `Store` / `StoreBinder` - State container contract and change binding
//! - `DisposerList` - Subscriptions torn down exactly once
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use turbo_page::prelude::*;
//!
//! struct Counter;
//!
//! #[async_trait]
//! impl Page for Counter {
//!     type View = String;
//!
//!     fn actions(&self) -> Option<ActionTable> {
//!         Some(ActionTable::new().with("increment", |state, _| {
//!             let mut next = state.clone();
//!             let count = next.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
//!             next.insert("count".into(), (count + 1).into());
//!             next
//!         }))
//!     }
//!
//!     fn render(&self, props: ViewProps) -> String {
//!         format!("count = {}", props.state.get("count").cloned().unwrap_or_default())
//!     }
//!
//!     fn fallback(&self, _: &Location, _: &PageContext) -> String {
//!         String::new()
//!     }
//! }
//!
//! let controller = PageController::new(Counter, Location::new("/counter"), context);
//! let view = controller.init().await?.into_view();
//! ```

pub mod prelude;

mod context;
mod controller;
mod error;
mod handlers;
mod hydration;
mod meta;
mod model;
mod page;
mod preload;
mod store;
mod subscription;

pub use context::*;
pub use controller::*;
pub use error::{PageError, Result};
pub use handlers::*;
pub use hydration::*;
pub use meta::*;
pub use model::*;
pub use page::*;
pub use preload::*;
pub use store::*;
pub use subscription::*;

// Re-export the types pages touch most
pub use edge_cache::PreloadCache;
pub use edge_core::{
    ClientEnvironment, ControllerId, Environment, EnvironmentKind, LeaveDecision, Location,
    PageConfig, PagePhase, ServerEnvironment,
};
