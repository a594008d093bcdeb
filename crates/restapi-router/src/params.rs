//! Path parameter bindings.
//!
//! Bindings form an immutable linked list: extending a scope allocates one
//! new node pointing at the previous scope, so a handler holding an older
//! [`PathParams`] never observes bindings added further down the chain.

use http::Extensions;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
struct Binding {
    key: String,
    value: String,
    prev: Option<Arc<Binding>>,
}

/// An immutable scope of `name -> value` path bindings.
///
/// # Example
///
/// ```rust
/// use restapi_router::PathParams;
///
/// let outer = PathParams::new().with("id", "1");
/// let inner = outer.with("id", "2").with("post", "7");
///
/// assert_eq!(outer.get("id"), Some("1"));
/// assert_eq!(inner.get("id"), Some("2"));
/// assert_eq!(inner.to_map()["post"], "7");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathParams {
    head: Option<Arc<Binding>>,
}

impl PathParams {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new scope extended by one binding.
    #[must_use]
    pub fn with(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            head: Some(Arc::new(Binding {
                key: key.into(),
                value: value.into(),
                prev: self.head.clone(),
            })),
        }
    }

    /// Returns the most recent value bound to `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    /// Iterates over every binding, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::successors(self.head.as_deref(), |binding| binding.prev.as_deref())
            .map(|binding| (binding.key.as_str(), binding.value.as_str()))
    }

    /// Flattens the scope; later bindings override earlier ones.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for (key, value) in self.iter() {
            map.entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
        map
    }

    /// Returns the number of bindings, counting shadowed ones.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

/// Extends the path parameters stored in `extensions` by one binding.
pub fn with_path_param(extensions: &mut Extensions, key: &str, value: &str) {
    let params = extensions
        .get::<PathParams>()
        .map_or_else(PathParams::new, Clone::clone)
        .with(key, value);
    extensions.insert(params);
}

/// Returns the flattened path parameters stored in `extensions`.
pub fn path_params(extensions: &Extensions) -> HashMap<String, String> {
    extensions
        .get::<PathParams>()
        .map(PathParams::to_map)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let params = PathParams::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
        assert_eq!(params.get("id"), None);
        assert!(params.to_map().is_empty());
    }

    #[test]
    fn test_shadowing_does_not_mutate_parent() {
        let parent = PathParams::new().with("id", "1");
        let child = parent.with("id", "2");

        assert_eq!(parent.get("id"), Some("1"));
        assert_eq!(child.get("id"), Some("2"));
        assert_eq!(child.len(), 2);
        assert_eq!(child.to_map().len(), 1);
    }

    #[test]
    fn test_monotonic() {
        let mut params = PathParams::new();
        let keys = ["a", "b", "c", "a"];
        for (i, key) in keys.iter().enumerate() {
            let before = params.to_map();
            params = params.with(*key, i.to_string());
            let after = params.to_map();
            for existing in before.keys() {
                assert!(after.contains_key(existing));
            }
        }
        assert_eq!(params.get("a"), Some("3"));
        assert_eq!(params.get("b"), Some("1"));
    }

    #[test]
    fn test_extensions_helpers() {
        let mut extensions = Extensions::new();
        assert!(path_params(&extensions).is_empty());

        with_path_param(&mut extensions, "user", "42");
        with_path_param(&mut extensions, "post", "7");

        let params = path_params(&extensions);
        assert_eq!(params["user"], "42");
        assert_eq!(params["post"], "7");
    }
}
