//! Pattern-based fallback multiplexer.
//!
//! A [`ServeMux`] can be embedded in any router node with
//! [`Router::handle`](crate::Router::handle). It serves requests the trie
//! could not route, using the familiar multiplexer patterns:
//!
//! - `/exact` matches only that path;
//! - `/prefix/` matches the whole subtree (and `/prefix` itself);
//! - an optional method prefix, `GET /path`, restricts the method.
//!
//! The longest matching pattern wins; at equal length a method-specific
//! pattern beats a method-less one.

use crate::path;
use http::Method;
use restapi_core::{
    BoxFuture, BoxedHandler, ErrorHandler, Handler, ProblemWriter, Request, Response, RestError,
};
use std::sync::Arc;

#[derive(Clone)]
struct MuxEntry {
    method: Option<Method>,
    pattern: String,
    subtree: bool,
    handler: BoxedHandler,
}

impl MuxEntry {
    fn matches(&self, method: &Method, path: &str) -> bool {
        if self.method.as_ref().is_some_and(|m| m != method) {
            return false;
        }
        if self.subtree {
            path.starts_with(&self.pattern) || path == self.pattern.trim_end_matches('/')
        } else {
            path == self.pattern
        }
    }
}

/// A pattern-matching request multiplexer.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use restapi_core::{full, handler_fn, Request, Response};
/// use restapi_router::ServeMux;
///
/// let mut mux = ServeMux::new();
/// mux.handle("/static/", handler_fn(|_req: Request| async { Response::new(full("file")) }));
/// mux.handle("GET /health", handler_fn(|_req: Request| async { Response::new(full("ok")) }));
///
/// assert!(mux.route(&Method::GET, "/static/css/site.css").is_some());
/// assert!(mux.route(&Method::POST, "/health").is_none());
/// ```
#[derive(Clone, Default)]
pub struct ServeMux {
    entries: Vec<MuxEntry>,
    errors: Option<Arc<dyn ErrorHandler>>,
}

impl ServeMux {
    /// Creates an empty multiplexer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the handler that writes `path-not-found` when no pattern
    /// matches. Defaults to a plain [`ProblemWriter`].
    #[must_use]
    pub fn with_error_handler(mut self, errors: impl ErrorHandler) -> Self {
        self.errors = Some(Arc::new(errors));
        self
    }

    /// Registers `handler` for `pattern`.
    ///
    /// Re-registering an identical pattern replaces the previous handler.
    pub fn handle(&mut self, pattern: &str, handler: impl Handler) {
        self.handle_boxed(pattern, Arc::new(handler));
    }

    /// Registers an already shared handler for `pattern`.
    pub fn handle_boxed(&mut self, pattern: &str, handler: BoxedHandler) {
        let (method, raw_path) = parse_pattern(pattern);
        let pattern = path::canonical(raw_path);
        let entry = MuxEntry {
            method,
            subtree: pattern.ends_with('/'),
            pattern,
            handler,
        };

        match self
            .entries
            .iter_mut()
            .find(|e| e.method == entry.method && e.pattern == entry.pattern)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Returns the handler that serves `method` on `path`.
    pub fn route(&self, method: &Method, path: &str) -> Option<&BoxedHandler> {
        self.entries
            .iter()
            .filter(|entry| entry.matches(method, path))
            .max_by_key(|entry| (entry.pattern.len(), entry.method.is_some()))
            .map(|entry| &entry.handler)
    }

    /// Returns `true` if no pattern is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds every pattern of `other`, replacing identical ones.
    pub fn merge(&mut self, other: &ServeMux) {
        for entry in &other.entries {
            match self
                .entries
                .iter_mut()
                .find(|e| e.method == entry.method && e.pattern == entry.pattern)
            {
                Some(existing) => *existing = entry.clone(),
                None => self.entries.push(entry.clone()),
            }
        }
    }
}

impl std::fmt::Debug for ServeMux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let patterns: Vec<String> = self
            .entries
            .iter()
            .map(|e| match &e.method {
                Some(method) => format!("{method} {}", e.pattern),
                None => e.pattern.clone(),
            })
            .collect();
        f.debug_struct("ServeMux").field("patterns", &patterns).finish()
    }
}

impl Handler for ServeMux {
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Response> {
        let path = path::canonical(request.uri().path());
        match self.route(request.method(), &path) {
            Some(handler) => handler.call(request),
            None => Box::pin(async move {
                let (parts, _) = request.into_parts();
                let not_found = RestError::path_not_found();
                match &self.errors {
                    Some(errors) => errors.handle_error(&parts, &not_found),
                    None => ProblemWriter::default().handle_error(&parts, &not_found),
                }
            }),
        }
    }
}

/// Splits an optional `METHOD ` prefix off a pattern.
fn parse_pattern(pattern: &str) -> (Option<Method>, &str) {
    let pattern = pattern.trim();
    if let Some((head, rest)) = pattern.split_once(' ') {
        let is_token = !head.is_empty() && head.bytes().all(|b| b.is_ascii_uppercase());
        if is_token {
            if let Ok(method) = Method::from_bytes(head.as_bytes()) {
                return (Some(method), rest.trim_start());
            }
        }
    }
    (None, pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use http_body_util::BodyExt;
    use restapi_core::{empty, handler_fn};

    fn named(name: &'static str) -> impl Handler {
        handler_fn(move |_req: Request| async move {
            let mut response = http::Response::new(empty());
            response
                .headers_mut()
                .insert("x-handler", http::HeaderValue::from_static(name));
            response
        })
    }

    async fn serve(mux: &ServeMux, method: Method, uri: &str) -> (StatusCode, Option<String>) {
        let request = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(empty())
            .unwrap();
        let response = mux.call(request).await;
        let name = response
            .headers()
            .get("x-handler")
            .map(|v| v.to_str().unwrap().to_string());
        (response.status(), name)
    }

    #[tokio::test]
    async fn test_miss_uses_configured_error_handler() {
        let mut mux = ServeMux::new()
            .with_error_handler(ProblemWriter::new().base_url("https://errors.example.com"));
        mux.handle("/known", named("known"));

        let request = http::Request::builder().uri("/unknown").body(empty()).unwrap();
        let response = mux.call(request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let problem: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(problem["type"], "https://errors.example.com/path-not-found");
        assert_eq!(problem["instance"], "/unknown");
    }

    #[test]
    fn test_parse_pattern() {
        assert_eq!(parse_pattern("GET /a"), (Some(Method::GET), "/a"));
        assert_eq!(parse_pattern("/a b"), (None, "/a b"));
        assert_eq!(parse_pattern("/a"), (None, "/a"));
    }

    #[tokio::test]
    async fn test_exact_and_subtree() {
        let mut mux = ServeMux::new();
        mux.handle("/files/", named("files"));
        mux.handle("/files/special", named("special"));
        mux.handle("/about", named("about"));

        assert_eq!(
            serve(&mux, Method::GET, "/files/a/b").await.1.as_deref(),
            Some("files")
        );
        assert_eq!(
            serve(&mux, Method::GET, "/files").await.1.as_deref(),
            Some("files")
        );
        assert_eq!(
            serve(&mux, Method::GET, "/files/special").await.1.as_deref(),
            Some("special")
        );
        assert_eq!(
            serve(&mux, Method::GET, "/about").await.1.as_deref(),
            Some("about")
        );
        assert_eq!(
            serve(&mux, Method::GET, "/about/me").await.0,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_root_is_catch_all() {
        let mut mux = ServeMux::new();
        mux.handle("/", named("root"));
        mux.handle("/api/", named("api"));

        assert_eq!(
            serve(&mux, Method::GET, "/anything").await.1.as_deref(),
            Some("root")
        );
        assert_eq!(
            serve(&mux, Method::GET, "/api/x").await.1.as_deref(),
            Some("api")
        );
    }

    #[tokio::test]
    async fn test_method_patterns() {
        let mut mux = ServeMux::new();
        mux.handle("/items", named("any"));
        mux.handle("POST /items", named("post"));

        assert_eq!(
            serve(&mux, Method::POST, "/items").await.1.as_deref(),
            Some("post")
        );
        assert_eq!(
            serve(&mux, Method::GET, "/items").await.1.as_deref(),
            Some("any")
        );
    }

    #[tokio::test]
    async fn test_replace_and_merge() {
        let mut mux = ServeMux::new();
        mux.handle("/a", named("first"));
        mux.handle("/a", named("second"));

        let mut other = ServeMux::new();
        other.handle("/b", named("b"));
        mux.merge(&other);

        assert_eq!(
            serve(&mux, Method::GET, "/a").await.1.as_deref(),
            Some("second")
        );
        assert_eq!(serve(&mux, Method::GET, "/b").await.1.as_deref(), Some("b"));
    }
}
