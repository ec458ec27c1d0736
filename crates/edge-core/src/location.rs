//! Navigation descriptor.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a navigation points, plus its one-time history identity.
///
/// The `key` is random per navigation. It must never reach serialized page
/// state, otherwise two identical requests would render different output.
/// Controllers move it out with [`Location::take_key`] before composing state,
/// and a key-less location serializes without the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Path component (e.g., "/products/42").
    pub pathname: String,
    /// Query string including the leading `?`, or empty.
    #[serde(default)]
    pub search: String,
    /// Fragment including the leading `#`, or empty.
    #[serde(default)]
    pub hash: String,
    /// History state attached by the navigation, if any.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub state: Value,
    /// One-time history key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Location {
    /// Create a location for a bare path.
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            ..Default::default()
        }
    }

    /// Split a path such as `/a/b?x=1#top` into its components.
    pub fn parse(path: &str) -> Self {
        let (rest, hash) = match path.find('#') {
            Some(i) => (&path[..i], &path[i..]),
            None => (path, ""),
        };
        let (pathname, search) = match rest.find('?') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, ""),
        };

        Self {
            pathname: if pathname.is_empty() { "/" } else { pathname }.to_string(),
            search: search.to_string(),
            hash: hash.to_string(),
            ..Default::default()
        }
    }

    /// Attach a history key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach history state.
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = state;
        self
    }

    /// Remove and return the history key.
    pub fn take_key(&mut self) -> Option<String> {
        self.key.take()
    }

    /// Reassemble the full path.
    pub fn path(&self) -> String {
        format!("{}{}{}", self.pathname, self.search, self.hash)
    }

    /// Look up a query parameter (first occurrence, no percent-decoding).
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Serialize to a JSON value. A taken key is absent from the output.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parse_full() {
        let loc = Location::parse("/products/42?color=red&size=m#reviews");

        assert_eq!(loc.pathname, "/products/42");
        assert_eq!(loc.search, "?color=red&size=m");
        assert_eq!(loc.hash, "#reviews");
        assert_eq!(loc.path(), "/products/42?color=red&size=m#reviews");
    }

    #[test]
    fn test_location_parse_empty_path() {
        let loc = Location::parse("?q=1");
        assert_eq!(loc.pathname, "/");
        assert_eq!(loc.search, "?q=1");
    }

    #[test]
    fn test_location_query_param() {
        let loc = Location::parse("/search?q=shoes&flag&page=2");

        assert_eq!(loc.query_param("q"), Some("shoes"));
        assert_eq!(loc.query_param("page"), Some("2"));
        assert_eq!(loc.query_param("flag"), Some(""));
        assert_eq!(loc.query_param("missing"), None);
    }

    #[test]
    fn test_location_take_key_removes_from_json() {
        let mut loc = Location::new("/").with_key("k3y9");
        assert!(loc.to_value().get("key").is_some());

        let key = loc.take_key();
        assert_eq!(key.as_deref(), Some("k3y9"));
        assert!(loc.to_value().get("key").is_none());
        assert!(!loc.to_value().to_string().contains("k3y9"));
    }

    #[test]
    fn test_location_null_state_skipped() {
        let json = Location::new("/a").to_value();
        assert!(json.get("state").is_none());

        let json = Location::new("/a")
            .with_state(serde_json::json!({"from": "cart"}))
            .to_value();
        assert_eq!(json["state"]["from"], "cart");
    }
}
