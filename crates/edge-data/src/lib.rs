//! Resource fetching for page preloads.
//!
//! This crate provides:
//! - `ResourceFetcher` - Transport trait fetching a resource as text
//! - `FetchClient` - Fetcher wrapper enforcing the configured timeout
//! - `StaticFetcher` / `FileFetcher` - In-memory and filesystem transports
//! - `TimeoutConfig` - Total operation timeout

mod client;
mod fetcher;
mod timeout;

pub use client::*;
pub use fetcher::*;
pub use timeout::*;
