//! Page URL normalization.
//!
//! Annotations are keyed by the page address with its query string removed,
//! so `/b?query=1` and `/b?query=2` share one record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized page URL used as the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageUrl(String);

impl PageUrl {
    /// Normalizes a full location href: everything from the first `?` on is dropped.
    pub fn normalize(href: &str) -> Self {
        let base = match href.find('?') {
            Some(idx) => &href[..idx],
            None => href,
        };
        Self(base.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Host name without scheme, credentials or port. `None` for URLs
    /// without an authority (e.g. `file:` or `about:` pages).
    pub fn host(&self) -> Option<&str> {
        let (_, rest) = self.0.split_once("://")?;
        let authority = rest
            .split(['/', '#'])
            .next()
            .unwrap_or_default();
        let host_port = authority.rsplit('@').next().unwrap_or_default();
        let host = if host_port.starts_with('[') {
            // IPv6 literal keeps its brackets
            host_port.split_inclusive(']').next().unwrap_or_default()
        } else {
            host_port.split(':').next().unwrap_or_default()
        };

        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }
}

impl fmt::Display for PageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageUrl {
    fn from(href: &str) -> Self {
        Self::normalize(href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_stripped() {
        assert_eq!(
            PageUrl::normalize("https://x/b?query=1"),
            PageUrl::normalize("https://x/b?query=2")
        );
        assert_eq!(PageUrl::normalize("https://x/b?query=1").as_str(), "https://x/b");
    }

    #[test]
    fn test_paths_differ() {
        assert_ne!(PageUrl::normalize("https://x/a"), PageUrl::normalize("https://x/b"));
    }

    #[test]
    fn test_without_query_is_unchanged() {
        assert_eq!(
            PageUrl::normalize("https://example.com/docs/page").as_str(),
            "https://example.com/docs/page"
        );
    }

    #[test]
    fn test_host() {
        assert_eq!(PageUrl::normalize("https://example.com/a").host(), Some("example.com"));
        assert_eq!(
            PageUrl::normalize("http://user:pw@example.com:8080/a").host(),
            Some("example.com")
        );
        assert_eq!(PageUrl::normalize("http://[::1]:3000/").host(), Some("[::1]"));
        assert_eq!(PageUrl::normalize("file:///tmp/page.html").host(), None);
        assert_eq!(PageUrl::normalize("about:blank").host(), None);
    }
}
