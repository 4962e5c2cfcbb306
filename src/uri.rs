//! Post identifier handling
//!
//! Posts are addressed by AT URIs of the form
//! `at://<authority>/app.bsky.feed.post/<rkey>`. Users usually paste web links
//! (`https://bsky.app/profile/<authority>/post/<rkey>`), so both forms are
//! accepted and normalised to the AT URI. Resolving a handle authority to a
//! DID is left to the caller.

use crate::{UriError, UriResult};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Collection NSID of post records
pub const POST_COLLECTION: &str = "app.bsky.feed.post";

const AT_SCHEME: &str = "at://";

/// A parsed AT URI pointing at a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AtUri {
    pub authority: String,
    pub collection: String,
    pub rkey: String,
}

impl AtUri {
    /// Parses an `at://authority/collection/rkey` URI
    pub fn parse(input: &str) -> UriResult<Self> {
        let rest = input
            .trim()
            .strip_prefix(AT_SCHEME)
            .ok_or_else(|| UriError::InvalidScheme(input.to_string()))?;

        let mut parts = rest.split('/');
        let authority = parts.next().unwrap_or_default();
        if authority.is_empty() {
            return Err(UriError::MissingAuthority);
        }

        let collection = parts.next().filter(|s| !s.is_empty());
        let rkey = parts.next().filter(|s| !s.is_empty());
        match (collection, rkey, parts.next()) {
            (Some(collection), Some(rkey), None) => Ok(Self {
                authority: authority.to_string(),
                collection: collection.to_string(),
                rkey: rkey.to_string(),
            }),
            _ => Err(UriError::Parse(input.to_string())),
        }
    }

    /// Builds the AT URI of a post record
    pub fn post(authority: &str, rkey: &str) -> Self {
        Self {
            authority: authority.to_string(),
            collection: POST_COLLECTION.to_string(),
            rkey: rkey.to_string(),
        }
    }

    /// Returns true if this URI points at a post record
    pub fn is_post(&self) -> bool {
        self.collection == POST_COLLECTION
    }
}

impl fmt::Display for AtUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}/{}", AT_SCHEME, self.authority, self.collection, self.rkey)
    }
}

impl FromStr for AtUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Normalises a post identifier into its canonical AT URI
///
/// Accepts either an AT URI or a web link of the form
/// `https://<host>/profile/<authority>/post/<rkey>`.
///
/// # Examples
///
/// ```
/// use thread_weaver::uri::normalize_post_uri;
///
/// let uri = normalize_post_uri("https://bsky.app/profile/did:plc:abc/post/3kxyz").unwrap();
/// assert_eq!(uri, "at://did:plc:abc/app.bsky.feed.post/3kxyz");
/// ```
pub fn normalize_post_uri(input: &str) -> UriResult<String> {
    let input = input.trim();

    let at_uri = if input.starts_with(AT_SCHEME) {
        AtUri::parse(input)?
    } else {
        parse_web_link(input)?
    };

    if !at_uri.is_post() {
        return Err(UriError::NotAPost(input.to_string()));
    }

    Ok(at_uri.to_string())
}

fn parse_web_link(input: &str) -> UriResult<AtUri> {
    let url = Url::parse(input).map_err(|e| UriError::Parse(format!("{}: {}", input, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(UriError::InvalidScheme(url.scheme().to_string()));
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        ["profile", authority, "post", rkey] => Ok(AtUri::post(authority, rkey)),
        ["profile"] => Err(UriError::MissingAuthority),
        _ => Err(UriError::NotAPost(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_at_uri() {
        let uri = AtUri::parse("at://did:plc:abc123/app.bsky.feed.post/3kabc").unwrap();
        assert_eq!(uri.authority, "did:plc:abc123");
        assert_eq!(uri.collection, POST_COLLECTION);
        assert_eq!(uri.rkey, "3kabc");
        assert!(uri.is_post());
    }

    #[test]
    fn test_at_uri_round_trips_through_display() {
        let raw = "at://alice.bsky.social/app.bsky.feed.post/3kabc";
        let uri: AtUri = raw.parse().unwrap();
        assert_eq!(uri.to_string(), raw);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            AtUri::parse("https://example.com"),
            Err(UriError::InvalidScheme("https://example.com".to_string()))
        );
        assert_eq!(AtUri::parse("at:///x/y"), Err(UriError::MissingAuthority));
        assert!(AtUri::parse("at://did:plc:abc/app.bsky.feed.post").is_err());
        assert!(AtUri::parse("at://did:plc:abc/app.bsky.feed.post/rkey/extra").is_err());
    }

    #[test]
    fn test_normalize_web_link() {
        let uri = normalize_post_uri("https://bsky.app/profile/alice.bsky.social/post/3kabc")
            .unwrap();
        assert_eq!(uri, "at://alice.bsky.social/app.bsky.feed.post/3kabc");

        let uri = normalize_post_uri("  https://bsky.app/profile/did:plc:xyz/post/3kdef/  ")
            .unwrap();
        assert_eq!(uri, "at://did:plc:xyz/app.bsky.feed.post/3kdef");
    }

    #[test]
    fn test_normalize_rejects_non_post() {
        assert!(matches!(
            normalize_post_uri("at://did:plc:abc/app.bsky.feed.like/3kabc"),
            Err(UriError::NotAPost(_))
        ));
        assert!(matches!(
            normalize_post_uri("https://bsky.app/profile/alice.bsky.social"),
            Err(UriError::NotAPost(_))
        ));
        assert!(matches!(
            normalize_post_uri("ftp://bsky.app/profile/a/post/b"),
            Err(UriError::InvalidScheme(_))
        ));
    }
}
