//! Content fingerprints for conditional responses.

use sha2::{Digest, Sha256};

/// Strong ETag for `content`: quoted hex of the first 16 bytes of its SHA-256.
///
/// Identical bytes give identical tags on server and client, so any
/// normalization (such as carriage-return stripping) must happen before this.
pub fn content_etag(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!("\"{}\"", hex::encode(&digest[..16]))
}

/// True when an `If-None-Match` header value matches `etag`.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match.trim() == "*"
        || if_none_match
            .split(',')
            .map(|t| t.trim().trim_start_matches("W/"))
            .any(|t| t == etag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_etag_stable() {
        let a = content_etag("body { color: red; }\n");
        let b = content_etag("body { color: red; }\n");

        assert_eq!(a, b);
        assert_eq!(a.len(), 34);
        assert!(a.starts_with('"') && a.ends_with('"'));
    }

    #[test]
    fn test_content_etag_differs_on_carriage_return() {
        assert_ne!(content_etag("a{}\r\n"), content_etag("a{}\n"));
    }

    #[test]
    fn test_etag_matches() {
        let tag = content_etag("x");

        assert!(etag_matches(&tag, &tag));
        assert!(etag_matches(&format!("\"zzz\", W/{}", tag), &tag));
        assert!(etag_matches("*", &tag));
        assert!(!etag_matches("\"zzz\"", &tag));
    }
}
