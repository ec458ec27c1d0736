//! Write-once cache of preloaded resources.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::etag::content_etag;

/// Status of a preload cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Entry present.
    Hit,
    /// Entry absent.
    Miss,
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
        }
    }
}

/// Preloaded text resources keyed by logical name.
///
/// Shared by every controller of one request or page session; clones are
/// handles to the same entries. An entry is written at most once: the first
/// insert for a name wins and later inserts are ignored.
#[derive(Debug, Clone, Default)]
pub struct PreloadCache {
    entries: Arc<RwLock<BTreeMap<String, Arc<str>>>>,
}

impl PreloadCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cache from transferred entries.
    pub fn from_map(entries: BTreeMap<String, String>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (k, Arc::<str>::from(v)))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Look up an entry.
    pub fn get(&self, name: &str) -> Option<Arc<str>> {
        self.entries.read().get(name).cloned()
    }

    /// Hit or miss for `name`.
    pub fn status(&self, name: &str) -> CacheStatus {
        if self.entries.read().contains_key(name) {
            CacheStatus::Hit
        } else {
            CacheStatus::Miss
        }
    }

    /// True when `name` is cached.
    pub fn contains(&self, name: &str) -> bool {
        self.status(name) == CacheStatus::Hit
    }

    /// Store `content` under `name` unless already present. Returns whether
    /// this call wrote the entry.
    pub fn insert_if_absent(&self, name: impl Into<String>, content: impl Into<Arc<str>>) -> bool {
        let mut entries = self.entries.write();
        match entries.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(content.into());
                true
            }
        }
    }

    /// Fingerprint of a cached entry.
    pub fn etag(&self, name: &str) -> Option<String> {
        self.get(name).map(|content| content_etag(&content))
    }

    /// Cached names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy the entries out, e.g. to embed them in a server response.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

impl Serialize for PreloadCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PreloadCache {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, String>::deserialize(deserializer).map(Self::from_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preload_cache_first_write_wins() {
        let cache = PreloadCache::new();

        assert!(cache.insert_if_absent("a", "first"));
        assert!(!cache.insert_if_absent("a", "second"));
        assert_eq!(cache.get("a").as_deref(), Some("first"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_preload_cache_clones_share_entries() {
        let cache = PreloadCache::new();
        let handle = cache.clone();

        handle.insert_if_absent("b", "x");

        assert_eq!(cache.status("b"), CacheStatus::Hit);
        assert_eq!(cache.status("c"), CacheStatus::Miss);
        assert_eq!(CacheStatus::Miss.to_string(), "MISS");
    }

    #[test]
    fn test_preload_cache_serde_transfer() {
        let cache = PreloadCache::new();
        cache.insert_if_absent("style", "a{}");
        cache.insert_if_absent("icons", "<svg/>");

        let json = serde_json::to_string(&cache).unwrap();
        assert_eq!(json, r#"{"icons":"<svg/>","style":"a{}"}"#);

        let restored: PreloadCache = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.names(), vec!["icons", "style"]);
        assert_eq!(restored.etag("style"), cache.etag("style"));
    }

    #[test]
    fn test_preload_cache_empty() {
        let cache = PreloadCache::new();
        assert!(cache.is_empty());
        assert!(cache.etag("none").is_none());
    }
}
