//! HTTP method-based dispatch.
//!
//! This module provides [`MethodRouter`], which maps HTTP methods to
//! handlers for a single trie node.

use http::Method;
use restapi_core::BoxedHandler;

/// Maps HTTP methods to handlers for a single route.
///
/// Registering a method twice keeps the last handler.
#[derive(Clone, Default)]
pub struct MethodRouter {
    get: Option<BoxedHandler>,
    post: Option<BoxedHandler>,
    put: Option<BoxedHandler>,
    delete: Option<BoxedHandler>,
    patch: Option<BoxedHandler>,
    head: Option<BoxedHandler>,
    options: Option<BoxedHandler>,
    trace: Option<BoxedHandler>,
    connect: Option<BoxedHandler>,
    /// Extension methods, in registration order
    other: Vec<(Method, BoxedHandler)>,
}

impl MethodRouter {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<BoxedHandler>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::HEAD => Some(&mut self.head),
            Method::OPTIONS => Some(&mut self.options),
            Method::TRACE => Some(&mut self.trace),
            Method::CONNECT => Some(&mut self.connect),
            _ => None,
        }
    }

    /// Registers the handler for `method`.
    pub fn set(&mut self, method: Method, handler: BoxedHandler) {
        if let Some(slot) = self.slot_mut(&method) {
            *slot = Some(handler);
            return;
        }
        match self.other.iter_mut().find(|(m, _)| *m == method) {
            Some(entry) => entry.1 = handler,
            None => self.other.push((method, handler)),
        }
    }

    /// Returns the handler for `method`.
    pub fn get(&self, method: &Method) -> Option<&BoxedHandler> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            Method::TRACE => self.trace.as_ref(),
            Method::CONNECT => self.connect.as_ref(),
            _ => self
                .other
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, handler)| handler),
        }
    }

    /// Returns the methods with a registered handler.
    pub fn allowed_methods(&self) -> Vec<Method> {
        let standard = [
            (Method::GET, &self.get),
            (Method::POST, &self.post),
            (Method::PUT, &self.put),
            (Method::DELETE, &self.delete),
            (Method::PATCH, &self.patch),
            (Method::HEAD, &self.head),
            (Method::OPTIONS, &self.options),
            (Method::TRACE, &self.trace),
            (Method::CONNECT, &self.connect),
        ];

        standard
            .into_iter()
            .filter(|(_, slot)| slot.is_some())
            .map(|(method, _)| method)
            .chain(self.other.iter().map(|(method, _)| method.clone()))
            .collect()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.allowed_methods().is_empty()
    }

    /// Merges another method router into this one.
    ///
    /// Handlers from `other` replace handlers registered here.
    pub fn merge(&mut self, other: MethodRouter) {
        let MethodRouter {
            get,
            post,
            put,
            delete,
            patch,
            head,
            options,
            trace,
            connect,
            other,
        } = other;

        let incoming = [
            (Method::GET, get),
            (Method::POST, post),
            (Method::PUT, put),
            (Method::DELETE, delete),
            (Method::PATCH, patch),
            (Method::HEAD, head),
            (Method::OPTIONS, options),
            (Method::TRACE, trace),
            (Method::CONNECT, connect),
        ];
        for (method, handler) in incoming {
            if let Some(handler) = handler {
                self.set(method, handler);
            }
        }
        for (method, handler) in other {
            self.set(method, handler);
        }
    }
}

impl std::fmt::Debug for MethodRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRouter")
            .field("methods", &self.allowed_methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restapi_core::{empty, handler_fn, Handler, Request};
    use std::sync::Arc;

    fn named(name: &'static str) -> BoxedHandler {
        Arc::new(handler_fn(move |_req: Request| async move {
            let mut response = http::Response::new(empty());
            response
                .headers_mut()
                .insert("x-handler", http::HeaderValue::from_static(name));
            response
        }))
    }

    async fn which(router: &MethodRouter, method: &Method) -> Option<String> {
        let handler = router.get(method)?;
        let response = handler.call(http::Request::new(empty())).await;
        Some(response.headers()["x-handler"].to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let mut router = MethodRouter::new();
        router.set(Method::GET, named("list"));
        router.set(Method::POST, named("create"));

        assert_eq!(which(&router, &Method::GET).await.as_deref(), Some("list"));
        assert_eq!(which(&router, &Method::POST).await.as_deref(), Some("create"));
        assert!(router.get(&Method::DELETE).is_none());
    }

    #[tokio::test]
    async fn test_extension_method() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let mut router = MethodRouter::new();
        router.set(purge.clone(), named("purge"));

        assert_eq!(which(&router, &purge).await.as_deref(), Some("purge"));
        assert_eq!(router.allowed_methods(), vec![purge]);
    }

    #[tokio::test]
    async fn test_merge_last_writer_wins() {
        let mut first = MethodRouter::new();
        first.set(Method::GET, named("old"));
        first.set(Method::DELETE, named("delete"));

        let mut second = MethodRouter::new();
        second.set(Method::GET, named("new"));

        first.merge(second);
        assert_eq!(which(&first, &Method::GET).await.as_deref(), Some("new"));
        assert_eq!(which(&first, &Method::DELETE).await.as_deref(), Some("delete"));
        assert_eq!(first.allowed_methods(), vec![Method::GET, Method::DELETE]);
    }

    #[test]
    fn test_empty() {
        assert!(MethodRouter::new().is_empty());
    }
}
