//! Observability infrastructure for the page controller.
//!
//! This crate provides:
//! - `init_logging` - tracing subscriber setup (JSON or human output)
//! - `TracingObserver` - Lifecycle observer emitting tracing events
//! - `RecordingObserver` - Lifecycle observer keeping phases for inspection

mod logging;
mod observer;

pub use logging::*;
pub use observer::*;
