//! Cookie read/write adapter.
//!
//! Cookies are read from the request (or document) once and written back as
//! `Set-Cookie` strings. Nothing here touches controller lifecycle state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::ConfigError;

/// Attributes of a written cookie.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    /// `Path` attribute.
    pub path: Option<String>,
    /// `Domain` attribute.
    pub domain: Option<String>,
    /// `Expires` attribute.
    pub expires: Option<DateTime<Utc>>,
    /// `Max-Age` attribute, in seconds.
    pub max_age: Option<i64>,
    /// `Secure` flag.
    pub secure: bool,
    /// `HttpOnly` flag.
    pub http_only: bool,
}

impl CookieOptions {
    /// Options scoped to `path`.
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Build options from a loosely typed JSON object.
    ///
    /// `expires` must be an RFC 3339 string or a millisecond timestamp; any
    /// other value is rejected before a cookie is written.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let mut options = Self::default();
        let Some(map) = value.as_object() else {
            return Ok(options);
        };

        options.path = map.get("path").and_then(Value::as_str).map(String::from);
        options.domain = map.get("domain").and_then(Value::as_str).map(String::from);
        options.max_age = map.get("maxAge").and_then(Value::as_i64);
        options.secure = map.get("secure").and_then(Value::as_bool).unwrap_or(false);
        options.http_only = map.get("httpOnly").and_then(Value::as_bool).unwrap_or(false);
        options.expires = match map.get("expires") {
            None | Some(Value::Null) => None,
            Some(v) => Some(parse_expiry(v)?),
        };

        Ok(options)
    }

    fn render(&self, name: &str, value: &str) -> String {
        let mut out = format!("{}={}", name, value);
        if let Some(path) = &self.path {
            out.push_str(&format!("; Path={}", path));
        }
        if let Some(domain) = &self.domain {
            out.push_str(&format!("; Domain={}", domain));
        }
        if let Some(expires) = &self.expires {
            out.push_str(&format!("; Expires={}", expires.format("%a, %d %b %Y %H:%M:%S GMT")));
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }
}

fn parse_expiry(value: &Value) -> Result<DateTime<Utc>, ConfigError> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ConfigError::InvalidExpiry(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| ConfigError::InvalidExpiry(n.to_string())),
        other => Err(ConfigError::InvalidExpiry(other.to_string())),
    }
}

#[derive(Debug, Default)]
struct JarState {
    values: BTreeMap<String, String>,
    written: Vec<String>,
}

/// Cookies visible to a page, plus the writes it made.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    inner: Arc<Mutex<JarState>>,
}

impl CookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header (`a=1; b=2`).
    pub fn from_header(header: &str) -> Self {
        let values = header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Self {
            inner: Arc::new(Mutex::new(JarState {
                values,
                written: Vec::new(),
            })),
        }
    }

    /// Read a cookie.
    pub fn get(&self, name: &str) -> Option<String> {
        self.inner.lock().values.get(name).cloned()
    }

    /// Write a cookie.
    pub fn set(&self, name: &str, value: &str, options: &CookieOptions) {
        let mut state = self.inner.lock();
        state.values.insert(name.to_string(), value.to_string());
        state.written.push(options.render(name, value));
    }

    /// Expire a cookie.
    pub fn remove(&self, name: &str, options: &CookieOptions) {
        let expired = CookieOptions {
            expires: Utc.timestamp_opt(0, 0).single(),
            max_age: None,
            ..options.clone()
        };
        let mut state = self.inner.lock();
        state.values.remove(name);
        state.written.push(expired.render(name, ""));
    }

    /// `Set-Cookie` header values written so far.
    pub fn set_cookie_headers(&self) -> Vec<String> {
        self.inner.lock().written.clone()
    }
}
