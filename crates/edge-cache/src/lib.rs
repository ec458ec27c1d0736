//! Caching infrastructure for page preloads.
//!
//! This crate provides:
//! - `PreloadCache` - Write-once, name-keyed cache of preloaded text resources
//! - `content_etag` - Content fingerprint used for conditional responses
//!
//! # Example
//!
//! ```
//! use edge_cache::PreloadCache;
//!
//! let cache = PreloadCache::new();
//! assert!(cache.insert_if_absent("theme", "body{}"));
//! assert!(!cache.insert_if_absent("theme", "ignored"));
//! assert_eq!(cache.get("theme").as_deref(), Some("body{}"));
//! ```

mod etag;
mod preload;

pub use etag::*;
pub use preload::*;
