//! High-level router API.
//!
//! This module provides the main [`Router`] struct, the primary interface
//! for registering handlers and dispatching requests.

use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::mux::ServeMux;
use crate::node::Node;
use crate::params::with_path_param;
use crate::path;
use crate::routing::{OriginalUri, RoutingContext};
use http::{Method, Uri};
use parking_lot::RwLock;
use restapi_core::{
    set_allow, BoxFuture, BoxedHandler, ErrorHandler, ErrorKind, Handler, HandlerService,
    ProblemWriter, Request, Response, RestError,
};
use smallvec::SmallVec;
use std::any::Any;
use std::sync::Arc;

/// How a request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A method-specific handler at the deepest matched node.
    Method,
    /// The default handler at the deepest matched node.
    Default,
    /// A pattern of the deepest embedded [`ServeMux`].
    Mux,
    /// The path matched but no handler accepts the method.
    MethodNotAllowed,
    /// Nothing matched.
    NotFound,
}

/// The outcome of routing a method and path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// How the request was resolved
    pub kind: MatchKind,
    /// The path prefix the selected handler consumed
    pub consumed: String,
    /// Path parameter bindings, in binding order
    pub params: Vec<(String, String)>,
}

struct Resolved {
    route: RouteMatch,
    handler: BoxedHandler,
    middleware: SmallVec<[BoxedMiddleware; 4]>,
}

/// Terminal handler producing routing failures.
struct RoutingFailure {
    errors: Arc<dyn ErrorHandler>,
    kind: ErrorKind,
    allow: Vec<Method>,
}

impl Handler for RoutingFailure {
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let (parts, _) = request.into_parts();
            let mut response = self.errors.handle_error(&parts, &RestError::new(self.kind));
            set_allow(&mut response, &self.allow);
            response
        })
    }
}

/// A composable HTTP router.
///
/// Routes live in a trie shared by every clone of the router. Registration
/// takes `&self` and may happen concurrently with dispatch; the trie is
/// guarded by a reader-writer lock that dispatch holds only while walking.
///
/// # Example
///
/// ```rust
/// use restapi_core::{full, handler_fn, Request, Response};
/// use restapi_router::{path_params, Router};
///
/// let router = Router::new();
/// router
///     .get("/users/me", handler_fn(|_req: Request| async { Response::new(full("me")) }))
///     .get("/users/:id", handler_fn(|req: Request| async move {
///         let id = path_params(req.extensions())["id"].clone();
///         Response::new(full(id))
///     }));
///
/// router.namespace("/admin", |admin| {
///     admin.get("/stats", handler_fn(|_req: Request| async { Response::new(full("{}")) }));
/// });
/// ```
///
/// # Route Priority
///
/// 1. **Fixed segments** (e.g., `/users/me`) beat the dynamic segment
///    (`/users/:id`) at the same position.
/// 2. A **method handler** on the deepest matched node beats that node's
///    default (mounted) handler. Segments the trie could not match stay in
///    the handler's `path_left`.
/// 3. The **deepest embedded mux** serves whatever the trie left over.
#[derive(Clone)]
pub struct Router {
    /// Root node of the shared trie
    root: Arc<RwLock<Node>>,
    /// Scope of this router view within the trie
    prefix: String,
    /// Writes routing failures
    errors: Arc<dyn ErrorHandler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("prefix", &self.prefix)
            .field("root", &*self.root.read())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Arc::new(RwLock::new(Node::root())),
            prefix: "/".to_string(),
            errors: Arc::new(ProblemWriter::default()),
        }
    }

    /// Replaces the writer used for 404 and 405 responses.
    #[must_use]
    pub fn with_error_handler(mut self, errors: impl ErrorHandler) -> Self {
        self.errors = Arc::new(errors);
        self
    }

    /// Returns the path this router view is rooted at.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn scoped(&self, path: &str) -> String {
        path::clean(&path::join(&[self.prefix.as_str(), path]))
    }

    fn with_node<R>(&self, path: &str, f: impl FnOnce(&mut Node) -> R) -> R {
        let path = self.scoped(path);
        let mut root = self.root.write();
        f(root.descend_mut(&path))
    }

    /// Registers `handler` for `method` on `path`.
    ///
    /// Segments of the form `:name` match any single segment and bind it
    /// to `name`.
    pub fn on(&self, method: Method, path: &str, handler: impl Handler) -> &Self {
        let handler: BoxedHandler = Arc::new(handler);
        self.with_node(path, |node| node.methods.set(method, handler));
        self
    }

    /// Registers a GET handler.
    pub fn get(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::GET, path, handler)
    }

    /// Registers a POST handler.
    pub fn post(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::POST, path, handler)
    }

    /// Registers a PUT handler.
    pub fn put(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::PUT, path, handler)
    }

    /// Registers a PATCH handler.
    pub fn patch(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::PATCH, path, handler)
    }

    /// Registers a DELETE handler.
    pub fn delete(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Registers a HEAD handler.
    pub fn head(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::HEAD, path, handler)
    }

    /// Registers a CONNECT handler.
    pub fn connect(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::CONNECT, path, handler)
    }

    /// Registers an OPTIONS handler.
    pub fn options(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::OPTIONS, path, handler)
    }

    /// Registers a TRACE handler.
    pub fn trace(&self, path: &str, handler: impl Handler) -> &Self {
        self.on(Method::TRACE, path, handler)
    }

    /// Registers a multiplexer pattern at this router's scope.
    ///
    /// See [`ServeMux`] for the pattern syntax. The mux sees request paths
    /// with this scope's prefix stripped.
    pub fn handle(&self, pattern: &str, handler: impl Handler) -> &Self {
        let handler: BoxedHandler = Arc::new(handler);
        self.with_node("/", |node| node.mux_mut().handle_boxed(pattern, handler));
        self
    }

    /// Mounts `handler` at `path`, serving every method and sub-path.
    ///
    /// If `handler` is itself a [`Router`], its trie is merged into this
    /// one at `path` instead: middleware, children, method handlers, and
    /// mux patterns of both routers end up on the same nodes. The merge
    /// copies the other router's routes as they are at this moment.
    pub fn mount<H: Handler>(&self, path: &str, handler: H) -> &Self {
        let any: &dyn Any = &handler;
        if let Some(other) = any.downcast_ref::<Router>() {
            let snapshot = {
                let other_root = other.root.read();
                other_root
                    .descend(&other.prefix)
                    .cloned()
                    .unwrap_or_default()
            };
            self.with_node(path, |node| node.merge(snapshot));
            return self;
        }

        let handler: BoxedHandler = Arc::new(handler);
        self.with_node(path, |node| node.default = Some(handler));
        self
    }

    /// Mounts a resource at `path`.
    pub fn resource(&self, path: &str, resource: impl Handler) -> &Self {
        self.mount(path, resource)
    }

    /// Runs `configure` with a router view rooted at `path`.
    ///
    /// Registrations made through the view land in this router's trie
    /// under `path`.
    pub fn namespace(&self, path: &str, configure: impl FnOnce(&Router)) -> &Self {
        let prefix = self.scoped(path);
        self.with_node(path, |_| ());
        let view = Router {
            root: Arc::clone(&self.root),
            prefix,
            errors: Arc::clone(&self.errors),
        };
        configure(&view);
        self
    }

    /// Adds middleware at this router's scope.
    pub fn use_middleware(&self, middleware: impl Middleware) -> &Self {
        let middleware: BoxedMiddleware = Arc::new(middleware);
        self.with_node("/", |node| node.middleware.push(middleware));
        self
    }

    /// Resolves `method` and `path` without dispatching.
    ///
    /// `path` is interpreted relative to this router's scope.
    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch {
        self.resolve(method, &path::canonical(path)).route
    }

    /// Wraps the router in a hyper service.
    pub fn into_service(self) -> HandlerService<Router> {
        HandlerService::new(self)
    }

    fn resolve(&self, method: &Method, path_left: &str) -> Resolved {
        let root = self.root.read();
        let Some(start) = root.descend(&self.prefix) else {
            return self.failure(ErrorKind::PathNotFound, Vec::new(), SmallVec::new());
        };

        let segments: SmallVec<[&str; 8]> = path_left
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        let mut node = start;
        let mut middleware: SmallVec<[BoxedMiddleware; 4]> =
            start.middleware.iter().cloned().collect();
        let mut fallback: Option<(Arc<ServeMux>, usize)> =
            start.mux.as_ref().map(|mux| (Arc::clone(mux), 0));
        let mut params: Vec<(String, String)> = Vec::new();
        let mut depth = 0;

        for segment in &segments {
            let Some(child) = node.match_segment(segment) else {
                break;
            };
            for alias in child.aliases() {
                params.push((alias.clone(), (*segment).to_string()));
            }
            depth += 1;
            node = child;
            middleware.extend(child.middleware.iter().cloned());
            if let Some(mux) = &child.mux {
                fallback = Some((Arc::clone(mux), depth));
            }
        }

        let consumed = |count: usize| format!("/{}", segments[..count].join("/"));

        if let Some(handler) = node.methods.get(method).cloned() {
            return Resolved {
                route: RouteMatch {
                    kind: MatchKind::Method,
                    consumed: consumed(depth),
                    params,
                },
                handler,
                middleware,
            };
        }

        if let Some(handler) = node.default.clone() {
            return Resolved {
                route: RouteMatch {
                    kind: MatchKind::Default,
                    consumed: consumed(depth),
                    params,
                },
                handler,
                middleware,
            };
        }

        if let Some((mux, at)) = fallback {
            let rest = path::canonical(&format!("/{}", segments[at..].join("/")));
            if let Some(handler) = mux.route(method, &rest).cloned() {
                return Resolved {
                    route: RouteMatch {
                        kind: MatchKind::Mux,
                        consumed: consumed(at),
                        params,
                    },
                    handler,
                    middleware,
                };
            }
        }

        let allowed = node.methods.allowed_methods();
        if allowed.is_empty() {
            self.failure(ErrorKind::PathNotFound, Vec::new(), middleware)
        } else {
            self.failure(ErrorKind::MethodNotAllowed, allowed, middleware)
        }
    }

    fn failure(
        &self,
        kind: ErrorKind,
        allow: Vec<Method>,
        middleware: SmallVec<[BoxedMiddleware; 4]>,
    ) -> Resolved {
        let match_kind = if kind == ErrorKind::MethodNotAllowed {
            MatchKind::MethodNotAllowed
        } else {
            MatchKind::NotFound
        };
        Resolved {
            route: RouteMatch {
                kind: match_kind,
                consumed: "/".to_string(),
                params: Vec::new(),
            },
            handler: Arc::new(RoutingFailure {
                errors: Arc::clone(&self.errors),
                kind,
                allow,
            }),
            middleware,
        }
    }
}

impl Handler for Router {
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Response> {
        let (mut parts, body) = request.into_parts();
        let path_left = RoutingContext::from_parts(&mut parts).path_left().to_string();
        let Resolved {
            route,
            handler,
            middleware,
        } = self.resolve(&parts.method, &path_left);

        tracing::debug!(
            method = %parts.method,
            path = %path_left,
            kind = ?route.kind,
            consumed = %route.consumed,
            "routed request"
        );

        for (key, value) in &route.params {
            with_path_param(&mut parts.extensions, key, value);
        }

        if matches!(route.kind, MatchKind::Method | MatchKind::Default | MatchKind::Mux) {
            let routing = RoutingContext::from_parts(&mut parts);
            routing.travel(&route.consumed);
            let rewritten = routing.path_left().to_string();

            if route.kind == MatchKind::Mux {
                if parts.extensions.get::<OriginalUri>().is_none() {
                    let original = OriginalUri(parts.uri.clone());
                    parts.extensions.insert(original);
                }
                let target = match parts.uri.query() {
                    Some(query) => format!("{rewritten}?{query}"),
                    None => rewritten,
                };
                if let Ok(uri) = target.parse::<Uri>() {
                    parts.uri = uri;
                }
            }
        }

        let request = Request::from_parts(parts, body);
        Box::pin(async move { Next::new(&middleware, &*handler).run(request).await })
    }
}
