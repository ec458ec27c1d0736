//! Core abstractions for the page controller platform.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Environment` - Server/client capability strategy, selected once per page
//! - `Location` - Navigation descriptor with its one-time history key
//! - `RequestContext` / `ResponseHandle` - Server-side request and response handles
//! - `PageConfig` - Deployment paths and fetch settings
//! - `CookieJar` - Cookie read/write adapter
//! - `PagePhase` / `LifecycleObserver` - Controller lifecycle tracking

mod config;
mod context;
mod cookie;
mod disposer;
mod environment;
mod error;
mod lifecycle;
mod location;

pub use config::*;
pub use context::*;
pub use cookie::*;
pub use disposer::*;
pub use environment::*;
pub use error::*;
pub use lifecycle::*;
pub use location::*;
