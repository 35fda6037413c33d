//! Request classification and canonical media identities
//!
//! A request is either a playlist link, a direct media link or free text to
//! search for. Links are reduced to a canonical identity used as the cache key,
//! so that `watch?v=ID&t=10` and `youtu.be/ID` land on the same entry.

use crate::error::{Result, SourceError};
use once_cell::sync::Lazy;
use regex::Regex;
use sha1::{Digest, Sha1};

static PLAYLIST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://www\.youtube\.com/playlist").expect("playlist pattern is valid")
});

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https://www\.youtube\.com/watch|https://youtu\.be/)")
        .expect("link pattern is valid")
});

static WATCH_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]v=([^&?#]+)").expect("watch id pattern is valid"));

static SHORT_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://youtu\.be/([^?&#/]+)").expect("short link pattern is valid")
});

/// A classified enqueue request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRequest {
    /// Link to a playlist: every entry gets enqueued
    Playlist(String),
    /// Direct link to one media
    Link(String),
    /// Free text to search for
    Text(String),
}

impl MediaRequest {
    /// Classifies raw request text
    ///
    /// Fails with `NotFound` on empty input.
    pub fn classify(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SourceError::not_found("empty request"));
        }

        let request = if PLAYLIST_RE.is_match(input) {
            Self::Playlist(input.to_string())
        } else if LINK_RE.is_match(input) {
            Self::Link(input.to_string())
        } else {
            Self::Text(input.to_string())
        };
        Ok(request)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Playlist(s) | Self::Link(s) | Self::Text(s) => s,
        }
    }
}

/// Canonical identity of a media link
///
/// The video id for YouTube links, a SHA1 of the link otherwise.
pub fn canonical_identity(link: &str) -> String {
    let link = link.trim();

    if let Some(caps) = WATCH_ID_RE.captures(link) {
        return caps[1].to_string();
    }
    if let Some(caps) = SHORT_ID_RE.captures(link) {
        return caps[1].to_string();
    }

    let mut hasher = Sha1::new();
    hasher.update(link.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_playlist() {
        let req = MediaRequest::classify("https://www.youtube.com/playlist?list=PL123").unwrap();
        assert_eq!(
            req,
            MediaRequest::Playlist("https://www.youtube.com/playlist?list=PL123".to_string())
        );
    }

    #[test]
    fn test_classify_links() {
        assert!(matches!(
            MediaRequest::classify("https://www.youtube.com/watch?v=abc").unwrap(),
            MediaRequest::Link(_)
        ));
        assert!(matches!(
            MediaRequest::classify("  https://youtu.be/abc  ").unwrap(),
            MediaRequest::Link(l) if l == "https://youtu.be/abc"
        ));
    }

    #[test]
    fn test_classify_text() {
        assert_eq!(
            MediaRequest::classify("daft punk around the world").unwrap(),
            MediaRequest::Text("daft punk around the world".to_string())
        );
        // un lien d'un autre site est une recherche texte
        assert!(matches!(
            MediaRequest::classify("https://example.com/watch?v=abc").unwrap(),
            MediaRequest::Text(_)
        ));
    }

    #[test]
    fn test_classify_empty() {
        assert!(MediaRequest::classify("   ").unwrap_err().is_not_found());
    }

    #[test]
    fn test_canonical_identity() {
        assert_eq!(canonical_identity("https://www.youtube.com/watch?v=abc123"), "abc123");
        assert_eq!(
            canonical_identity("https://www.youtube.com/watch?v=abc123&list=PL9&t=10"),
            "abc123"
        );
        assert_eq!(canonical_identity("https://youtu.be/abc123?t=5"), "abc123");
        assert_eq!(
            canonical_identity("https://www.youtube.com/watch?feature=share&v=abc123"),
            "abc123"
        );
    }

    #[test]
    fn test_canonical_identity_fallback_is_stable() {
        let a = canonical_identity("https://example.com/track.mp3");
        let b = canonical_identity(" https://example.com/track.mp3 ");
        assert_eq!(a, b);
        assert_eq!(a.len(), 40);
    }
}
