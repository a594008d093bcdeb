//! Per-request context handed to resource operations.

use http::{Extensions, HeaderMap, Method, Uri};
use restapi_router::{path_params, RoutingContext};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Parsed resource IDs published along the request chain, by context key.
#[derive(Clone, Default)]
struct ResourceIds(Arc<HashMap<String, Arc<dyn Any + Send + Sync>>>);

/// Publishes `id` under `key` in the request extensions.
///
/// IDs published earlier under other keys stay visible, so a nested
/// resource can read every ancestor's ID.
pub fn publish_id<ID>(extensions: &mut Extensions, key: &str, id: ID)
where
    ID: Send + Sync + 'static,
{
    let mut ids = extensions
        .get::<ResourceIds>()
        .map(|ids| HashMap::clone(&ids.0))
        .unwrap_or_default();
    ids.insert(key.to_string(), Arc::new(id));
    extensions.insert(ResourceIds(Arc::new(ids)));
}

/// Returns the ID published under `key`, if it has type `ID`.
///
/// # Example
///
/// ```rust
/// use restapi_resource::{publish_id, resource_id};
///
/// let mut extensions = http::Extensions::new();
/// publish_id(&mut extensions, "user", 42_u64);
///
/// assert_eq!(resource_id::<u64>(&extensions, "user"), Some(42));
/// assert_eq!(resource_id::<String>(&extensions, "user"), None);
/// ```
pub fn resource_id<ID>(extensions: &Extensions, key: &str) -> Option<ID>
where
    ID: Clone + 'static,
{
    extensions
        .get::<ResourceIds>()?
        .0
        .get(key)?
        .downcast_ref::<ID>()
        .cloned()
}

/// What a resource operation knows about the request it serves.
///
/// The body is not part of the context; operations receive decoded
/// entities instead.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
}

impl RequestContext {
    /// Creates a context from request parts.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, extensions: Extensions) -> Self {
        Self {
            method,
            uri,
            headers,
            extensions,
        }
    }

    pub(crate) fn from_parts(parts: &http::request::Parts) -> Self {
        Self::new(
            parts.method.clone(),
            parts.uri.clone(),
            parts.headers.clone(),
            parts.extensions.clone(),
        )
    }

    /// Returns the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the raw query string, or `""`.
    pub fn query(&self) -> &str {
        self.uri.query().unwrap_or_default()
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request extensions.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the routing cursor, if the request went through a router.
    pub fn routing(&self) -> Option<&RoutingContext> {
        RoutingContext::get(&self.extensions)
    }

    /// Returns all path parameters; later bindings win.
    pub fn path_params(&self) -> HashMap<String, String> {
        path_params(&self.extensions)
    }

    /// Returns one path parameter.
    pub fn param(&self, name: &str) -> Option<String> {
        self.path_params().remove(name)
    }

    /// Returns the ID a resource published under `key`.
    pub fn id<ID: Clone + 'static>(&self, key: &str) -> Option<ID> {
        resource_id(&self.extensions, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restapi_router::with_path_param;

    #[test]
    fn test_publish_keeps_earlier_keys() {
        let mut extensions = Extensions::new();
        publish_id(&mut extensions, "org", "acme".to_string());
        publish_id(&mut extensions, "user", 7_i64);

        assert_eq!(
            resource_id::<String>(&extensions, "org").as_deref(),
            Some("acme")
        );
        assert_eq!(resource_id::<i64>(&extensions, "user"), Some(7));
        assert_eq!(resource_id::<i64>(&extensions, "missing"), None);
    }

    #[test]
    fn test_republish_shadows_without_touching_clones() {
        let mut extensions = Extensions::new();
        publish_id(&mut extensions, "user", 1_u32);
        let snapshot = extensions.clone();
        publish_id(&mut extensions, "user", 2_u32);

        assert_eq!(resource_id::<u32>(&extensions, "user"), Some(2));
        assert_eq!(resource_id::<u32>(&snapshot, "user"), Some(1));
    }

    #[test]
    fn test_context_accessors() {
        let mut extensions = Extensions::new();
        with_path_param(&mut extensions, "id", "42");
        publish_id(&mut extensions, "foo", 42_u64);

        let ctx = RequestContext::new(
            Method::DELETE,
            Uri::from_static("/foos?color=red&size=2"),
            HeaderMap::new(),
            extensions,
        );

        assert_eq!(ctx.method(), Method::DELETE);
        assert_eq!(ctx.query(), "color=red&size=2");
        assert_eq!(ctx.param("id").as_deref(), Some("42"));
        assert_eq!(ctx.id::<u64>("foo"), Some(42));
        assert!(ctx.routing().is_none());
    }
}
