//! MIME type parsing.
//!
//! Registries key serializers by the *base* form of a MIME type, so
//! `application/json; charset=utf-8` and `application/json` are the same
//! entry. Parsing is done by the [`mime`](::mime) crate; [`MimeType`] adds
//! the lowercase base form on top.

use std::fmt;
use std::str::FromStr;

/// `application/json`
pub const APPLICATION_JSON: &str = "application/json";
/// `application/problem+json`
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";
/// `application/x-ndjson`
pub const APPLICATION_NDJSON: &str = "application/x-ndjson";
/// `application/stream+json`
pub const APPLICATION_STREAM_JSON: &str = "application/stream+json";
/// `application/json-stream`
pub const APPLICATION_JSON_STREAM: &str = "application/json-stream";
/// `application/x-www-form-urlencoded`
pub const APPLICATION_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A parsed MIME type.
///
/// # Example
///
/// ```rust
/// use restapi_core::MimeType;
///
/// let mime: MimeType = "Application/JSON; charset=utf-8".parse().unwrap();
/// assert_eq!(mime.base(), "application/json");
/// assert_eq!(mime.param("charset"), Some("utf-8"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MimeType {
    mime: ::mime::Mime,
    base: String,
}

/// Error returned when a MIME type cannot be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid MIME type {raw:?}: {source}")]
pub struct InvalidMimeType {
    raw: String,
    #[source]
    source: ::mime::FromStrError,
}

impl InvalidMimeType {
    /// Returns the input that failed to parse.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl MimeType {
    /// Returns the base form: `type/subtype`, lowercase, without parameters.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the value of a parameter, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.mime.get_param(name).map(|value| value.as_str())
    }

    /// Returns the parsed [`mime::Mime`](::mime::Mime).
    pub fn as_mime(&self) -> &::mime::Mime {
        &self.mime
    }

    /// Returns `true` if `other` parses to the same base form.
    pub fn same_base(&self, other: &str) -> bool {
        base_of(other).is_some_and(|base| base == self.base)
    }
}

/// Returns the base form of a raw MIME string, or `None` if it does not
/// parse.
///
/// ```rust
/// use restapi_core::mime::base_of;
///
/// assert_eq!(base_of(" text/HTML; q=0.9").as_deref(), Some("text/html"));
/// assert_eq!(base_of("html"), None);
/// ```
pub fn base_of(raw: &str) -> Option<String> {
    raw.parse::<MimeType>().ok().map(|mime| mime.base)
}

impl FromStr for MimeType {
    type Err = InvalidMimeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mime: ::mime::Mime = s.trim().parse().map_err(|source| InvalidMimeType {
            raw: s.to_string(),
            source,
        })?;
        let base = mime.essence_str().to_ascii_lowercase();
        Ok(Self { mime, base })
    }
}

impl From<::mime::Mime> for MimeType {
    fn from(mime: ::mime::Mime) -> Self {
        let base = mime.essence_str().to_ascii_lowercase();
        Self { mime, base }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.mime, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_only() {
        let mime: MimeType = "application/json".parse().unwrap();
        assert_eq!(mime.base(), APPLICATION_JSON);
        assert_eq!(mime.param("charset"), None);
    }

    #[test]
    fn test_parse_with_params() {
        let mime: MimeType = "Application/X-NDJSON; charset=utf-8; q=0.5".parse().unwrap();
        assert_eq!(mime.base(), APPLICATION_NDJSON);
        assert_eq!(mime.param("charset"), Some("utf-8"));
        assert_eq!(mime.param("q"), Some("0.5"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("json".parse::<MimeType>().is_err());
        assert!("/json".parse::<MimeType>().is_err());
        assert!("".parse::<MimeType>().is_err());

        let err = "json".parse::<MimeType>().unwrap_err();
        assert_eq!(err.raw(), "json");
    }

    #[test]
    fn test_same_base() {
        let mime: MimeType = APPLICATION_JSON.parse().unwrap();
        assert!(mime.same_base("application/json;charset=utf-8"));
        assert!(!mime.same_base("application/problem+json"));
        assert!(!mime.same_base("garbage"));
    }

    #[test]
    fn test_from_mime_constant() {
        let mime = MimeType::from(::mime::APPLICATION_WWW_FORM_URLENCODED);
        assert_eq!(mime.base(), APPLICATION_FORM_URLENCODED);
    }

    #[test]
    fn test_base_of() {
        assert_eq!(base_of("APPLICATION/JSON; q=1").as_deref(), Some(APPLICATION_JSON));
        assert_eq!(base_of(""), None);
    }
}
