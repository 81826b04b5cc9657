//! Conditional request support
//!
//! `ETag` derived from content, `Last-Modified` from file mtime.

use chrono::{DateTime, Utc};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::SystemTime;

/// `Cache-Control` sent with stored images
pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=3600";

const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Quoted strong `ETag` for a blob, e.g. `"5-1f0c9a..."`
pub fn generate_etag(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:x}-{:x}\"", content.len(), hasher.finish())
}

/// `If-None-Match` holds our `ETag` (in a comma list) or `*`
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|header| {
        header.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate == etag || candidate.strip_prefix("W/") == Some(etag)
        })
    })
}

/// IMF-fixdate rendering of a modification time
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// The resource has not changed since the client's `If-Modified-Since`.
/// Unparseable dates never match.
pub fn not_modified_since(if_modified_since: Option<&str>, modified: Option<SystemTime>) -> bool {
    let (Some(header), Some(modified)) = (if_modified_since, modified) else {
        return false;
    };
    let Ok(since) = DateTime::parse_from_rfc2822(header.trim()) else {
        return false;
    };
    DateTime::<Utc>::from(modified).timestamp() <= since.timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_etag_shape_and_stability() {
        let etag = generate_etag(b"hello");
        assert!(etag.starts_with("\"5-"));
        assert!(etag.ends_with('"'));
        assert_eq!(etag, generate_etag(b"hello"));
        assert_ne!(etag, generate_etag(b"hellp"));
    }

    #[test]
    fn test_check_etag_match() {
        let etag = "\"5-abc\"";
        assert!(check_etag_match(Some("\"5-abc\""), etag));
        assert!(check_etag_match(Some("\"x\", \"5-abc\""), etag));
        assert!(check_etag_match(Some("W/\"5-abc\""), etag));
        assert!(check_etag_match(Some("*"), etag));
        assert!(!check_etag_match(Some("\"other\""), etag));
        assert!(!check_etag_match(None, etag));
    }

    #[test]
    fn test_http_date_round_trip() {
        let t = UNIX_EPOCH + Duration::from_secs(784_111_777);
        let formatted = format_http_date(t);
        assert_eq!(formatted, "Sun, 06 Nov 1994 08:49:37 GMT");
        assert!(not_modified_since(Some(&formatted), Some(t)));
    }

    #[test]
    fn test_not_modified_since() {
        let t = UNIX_EPOCH + Duration::from_secs(784_111_777);
        assert!(not_modified_since(
            Some("Mon, 07 Nov 1994 00:00:00 GMT"),
            Some(t)
        ));
        assert!(!not_modified_since(
            Some("Sat, 05 Nov 1994 00:00:00 GMT"),
            Some(t)
        ));
        assert!(!not_modified_since(Some("yesterday"), Some(t)));
        assert!(!not_modified_since(None, Some(t)));
        assert!(!not_modified_since(
            Some("Mon, 07 Nov 1994 00:00:00 GMT"),
            None
        ));
    }
}
