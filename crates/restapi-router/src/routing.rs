//! Per-request routing cursor.
//!
//! A [`RoutingContext`] lives in the request extensions. The outermost
//! router creates it from the request path; every router or resource that
//! consumes segments advances it with [`RoutingContext::travel`]. Nested
//! handlers always reason in terms of [`RoutingContext::path_left`].

use crate::path;
use http::request::Parts;
use http::{Extensions, Uri};

/// The consumed and remaining parts of the request path.
///
/// `current` joined with `path_left` always reconstructs the canonical
/// request path.
///
/// ```rust
/// use restapi_router::RoutingContext;
///
/// let mut routing = RoutingContext::new("/users/42/posts");
/// routing.travel("/users/42");
/// assert_eq!(routing.current(), "/users/42");
/// assert_eq!(routing.path_left(), "/posts");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingContext {
    current: String,
    path_left: String,
}

impl RoutingContext {
    /// Creates a context for a fresh request path.
    pub fn new(request_path: &str) -> Self {
        Self {
            current: "/".to_string(),
            path_left: path::canonical(request_path),
        }
    }

    /// Returns the context stored in `parts`, creating it on first access.
    pub fn from_parts(parts: &mut Parts) -> &mut Self {
        parts
            .extensions
            .get_or_insert_with(|| Self::new(parts.uri.path()))
    }

    /// Returns the context stored in `extensions`, if any.
    pub fn get(extensions: &Extensions) -> Option<&Self> {
        extensions.get::<Self>()
    }

    /// Returns the already consumed prefix.
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Returns the remaining path, always starting with `/`.
    pub fn path_left(&self) -> &str {
        &self.path_left
    }

    /// Returns `current` joined with `path_left`, without a trailing slash.
    pub fn full_path(&self) -> String {
        path::clean(&path::join(&[self.current.as_str(), self.path_left.as_str()]))
    }

    /// Moves `consumed` from the front of `path_left` onto `current`.
    ///
    /// `consumed` is compared segment-wise; segments that do not match the
    /// front of `path_left` end the move.
    pub fn travel(&mut self, consumed: &str) {
        let mut rest = self.path_left.as_str();
        let mut moved: Vec<&str> = Vec::new();

        for segment in path::split(consumed) {
            let (head, tail) = path::unshift(rest);
            if head != segment {
                break;
            }
            moved.push(head);
            rest = tail;
        }

        if moved.is_empty() {
            return;
        }

        let mut current = std::mem::take(&mut self.current);
        for segment in moved {
            if !current.ends_with('/') {
                current.push('/');
            }
            current.push_str(segment);
        }
        self.path_left = if rest.is_empty() { "/".to_string() } else { rest.to_string() };
        self.current = current;
    }
}

/// The request URI as received by the outermost router.
///
/// Stored in the extensions before a router rewrites the URI for an
/// embedded [`ServeMux`](crate::ServeMux).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalUri(pub Uri);
