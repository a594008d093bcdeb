//! Content negotiation.
//!
//! The registry maps base MIME types to serializers. The request serializer
//! follows `Content-Type`; the response serializer follows `Accept` and falls
//! back to the request serializer, so a client that sends JSON and asks for
//! nothing in particular gets JSON back.

use crate::serializer::Serializer;
use http::header::{ACCEPT, CONTENT_TYPE};
use http::HeaderMap;
use restapi_core::mime::{
    self, APPLICATION_FORM_URLENCODED, APPLICATION_JSON, APPLICATION_JSON_STREAM,
    APPLICATION_NDJSON, APPLICATION_PROBLEM_JSON, APPLICATION_STREAM_JSON,
};
use restapi_core::MimeType;
use std::collections::HashMap;

static FALLBACK: Serializer = Serializer::json();

/// A serializer chosen for one side of an exchange.
#[derive(Debug, Clone, Copy)]
pub struct Negotiated<'a> {
    /// Base MIME type to send as `Content-Type`.
    pub mime: &'a str,
    /// The serializer registered for `mime`.
    pub serializer: &'a Serializer,
}

/// Serializers indexed by base MIME type.
///
/// A new registry holds the built-in serializers; user registrations shadow
/// them for both request and response negotiation.
///
/// # Example
///
/// ```rust
/// use http::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
/// use restapi_codec::SerializerRegistry;
///
/// let registry = SerializerRegistry::new();
///
/// let mut headers = HeaderMap::new();
/// headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json; charset=utf-8"));
/// headers.insert(ACCEPT, HeaderValue::from_static("text/html, application/x-ndjson"));
///
/// assert_eq!(registry.request_serializer(&headers).mime, "application/json");
/// assert_eq!(registry.response_serializer(&headers).mime, "application/x-ndjson");
/// ```
#[derive(Debug, Clone)]
pub struct SerializerRegistry {
    serializers: HashMap<String, Serializer>,
    default_mime: String,
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SerializerRegistry {
    /// Creates a registry holding the built-in serializers, with JSON as
    /// the default.
    pub fn new() -> Self {
        let mut serializers = HashMap::new();
        serializers.insert(APPLICATION_JSON.to_string(), Serializer::json());
        serializers.insert(APPLICATION_PROBLEM_JSON.to_string(), Serializer::json());
        serializers.insert(APPLICATION_NDJSON.to_string(), Serializer::json_lines());
        serializers.insert(APPLICATION_STREAM_JSON.to_string(), Serializer::json_lines());
        serializers.insert(APPLICATION_JSON_STREAM.to_string(), Serializer::json_lines());
        serializers.insert(APPLICATION_FORM_URLENCODED.to_string(), Serializer::form());

        Self {
            serializers,
            default_mime: APPLICATION_JSON.to_string(),
        }
    }

    /// Registers `serializer` under the base form of `mime`, replacing any
    /// previous entry. An unparseable `mime` is logged and ignored.
    pub fn register(&mut self, mime: &str, serializer: Serializer) {
        match mime.parse::<MimeType>() {
            Ok(parsed) => {
                tracing::debug!(mime = %parsed.base(), "registered serializer");
                self.serializers.insert(parsed.base().to_string(), serializer);
            }
            Err(err) => tracing::warn!(error = %err, "serializer not registered"),
        }
    }

    /// Sets the MIME type used when a request names none.
    ///
    /// An unparseable `mime` leaves the current default in place.
    pub fn set_default_mime(&mut self, mime: &str) {
        match mime::base_of(mime) {
            Some(base) => self.default_mime = base,
            None => tracing::warn!(mime, "ignoring invalid default MIME type"),
        }
    }

    /// Returns the MIME type used when a request names none.
    pub fn default_mime(&self) -> &str {
        &self.default_mime
    }

    /// Returns the serializer registered for the base form of `mime`.
    pub fn get(&self, mime: &str) -> Option<&Serializer> {
        mime::base_of(mime).and_then(|base| self.serializers.get(&base))
    }

    /// Returns `true` if a serializer is registered for `mime`.
    pub fn contains(&self, mime: &str) -> bool {
        self.get(mime).is_some()
    }

    /// Chooses the serializer for the request body from `Content-Type`.
    pub fn request_serializer(&self, headers: &HeaderMap) -> Negotiated<'_> {
        headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.parse::<MimeType>().ok())
            .and_then(|parsed| self.lookup(parsed.base()))
            .unwrap_or_else(|| self.fallback())
    }

    /// Chooses the serializer for the response body from `Accept`.
    ///
    /// Candidates are tried in order; parameters such as `q` are ignored.
    /// With no usable candidate the request serializer is used.
    pub fn response_serializer(&self, headers: &HeaderMap) -> Negotiated<'_> {
        headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(accept_candidates)
            .find_map(|candidate| self.lookup(candidate.base()))
            .unwrap_or_else(|| self.request_serializer(headers))
    }

    fn lookup(&self, base: &str) -> Option<Negotiated<'_>> {
        self.serializers
            .get_key_value(base)
            .map(|(mime, serializer)| Negotiated {
                mime: mime.as_str(),
                serializer,
            })
    }

    fn fallback(&self) -> Negotiated<'_> {
        self.lookup(&self.default_mime).unwrap_or(Negotiated {
            mime: APPLICATION_JSON,
            serializer: &FALLBACK,
        })
    }
}

/// Splits an `Accept` value into media types.
///
/// Ranges are separated by commas; a range that does not parse as a whole is
/// split again on whitespace.
fn accept_candidates(raw: &str) -> Vec<MimeType> {
    raw.split(',')
        .map(str::trim)
        .filter(|range| !range.is_empty())
        .flat_map(|range| match range.parse::<MimeType>() {
            Ok(parsed) => vec![parsed],
            Err(_) => range
                .split_whitespace()
                .filter_map(|token| token.parse().ok())
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(content_type: Option<&'static str>, accept: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        }
        if let Some(value) = accept {
            headers.insert(ACCEPT, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_defaults_registered() {
        let registry = SerializerRegistry::new();
        for mime in [
            APPLICATION_JSON,
            APPLICATION_PROBLEM_JSON,
            APPLICATION_NDJSON,
            APPLICATION_STREAM_JSON,
            APPLICATION_JSON_STREAM,
            APPLICATION_FORM_URLENCODED,
        ] {
            assert!(registry.contains(mime), "{mime} missing");
        }
        assert!(registry.get(APPLICATION_NDJSON).unwrap().supports_lists());
        assert!(!registry.get(APPLICATION_FORM_URLENCODED).unwrap().supports_lists());
    }

    #[test]
    fn test_request_without_content_type_uses_default() {
        let registry = SerializerRegistry::new();
        assert_eq!(registry.request_serializer(&headers(None, None)).mime, APPLICATION_JSON);
    }

    #[test]
    fn test_request_unknown_content_type_uses_default() {
        let registry = SerializerRegistry::new();
        let negotiated = registry.request_serializer(&headers(Some("text/csv"), None));
        assert_eq!(negotiated.mime, APPLICATION_JSON);
    }

    #[test]
    fn test_request_content_type_params_ignored() {
        let registry = SerializerRegistry::new();
        let negotiated = registry
            .request_serializer(&headers(Some("Application/X-NDJSON; charset=utf-8"), None));
        assert_eq!(negotiated.mime, APPLICATION_NDJSON);
    }

    #[test]
    fn test_response_first_supported_accept_wins() {
        let registry = SerializerRegistry::new();
        let negotiated = registry.response_serializer(&headers(
            None,
            Some("text/html,application/stream+json;q=0.9 application/json"),
        ));
        assert_eq!(negotiated.mime, APPLICATION_STREAM_JSON);
    }

    #[test]
    fn test_accept_with_spaced_params() {
        let registry = SerializerRegistry::new();
        let accept = "text/html; q=1.0, application/x-ndjson; q=0.8";
        let negotiated = registry.response_serializer(&headers(None, Some(accept)));
        assert_eq!(negotiated.mime, APPLICATION_NDJSON);
    }

    #[test]
    fn test_response_falls_back_to_request() {
        let registry = SerializerRegistry::new();
        let form = headers(Some(APPLICATION_FORM_URLENCODED), None);
        assert_eq!(
            registry.response_serializer(&form).mime,
            APPLICATION_FORM_URLENCODED
        );

        let unmatched = headers(Some(APPLICATION_NDJSON), Some("text/html"));
        assert_eq!(registry.response_serializer(&unmatched).mime, APPLICATION_NDJSON);
    }

    #[test]
    fn test_user_serializer_shadows_default() {
        let mut registry = SerializerRegistry::new();
        registry.register("application/json; charset=utf-8", Serializer::json_lines());

        let negotiated = registry.response_serializer(&headers(None, Some(APPLICATION_JSON)));
        assert_eq!(negotiated.mime, APPLICATION_JSON);
        let mut encoder = negotiated.serializer.list_encoder().unwrap();
        assert_eq!(&encoder.encode(&1).unwrap()[..], b"1\n");

        let negotiated = registry.request_serializer(&headers(Some(APPLICATION_JSON), None));
        let mut encoder = negotiated.serializer.list_encoder().unwrap();
        assert_eq!(&encoder.encode(&1).unwrap()[..], b"1\n");
    }

    #[test]
    fn test_user_mime_registered() {
        let mut registry = SerializerRegistry::new();
        registry.register("application/vnd.foo+json", Serializer::json());
        let negotiated =
            registry.response_serializer(&headers(None, Some("application/vnd.foo+json")));
        assert_eq!(negotiated.mime, "application/vnd.foo+json");
    }

    #[test]
    fn test_default_mime_override() {
        let mut registry = SerializerRegistry::new();
        registry.set_default_mime(APPLICATION_NDJSON);
        assert_eq!(registry.default_mime(), APPLICATION_NDJSON);
        assert_eq!(registry.request_serializer(&headers(None, None)).mime, APPLICATION_NDJSON);

        registry.set_default_mime("text/unknown");
        assert_eq!(registry.request_serializer(&headers(None, None)).mime, APPLICATION_JSON);

        registry.set_default_mime("not a mime");
        assert_eq!(registry.default_mime(), "text/unknown");
    }
}
