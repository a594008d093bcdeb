//! Composable HTTP router for restapi.
//!
//! This crate routes requests through a trie of path segments. Each node
//! may carry method handlers, a default handler serving any method and
//! sub-path, an embedded [`ServeMux`] for pattern-based fallback, and the
//! middleware registered at that scope.
//!
//! # Features
//!
//! - **Dynamic segments**: `:name` matches one segment and binds it
//! - **Namespaces**: register routes relative to a sub-path
//! - **Mounting**: hand whole sub-trees to another handler, or merge routers
//! - **Scoped middleware**: collected root-first along the matched path
//! - **Routing context**: nested routers share one cursor over the path
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use restapi_core::{full, handler_fn, Request, Response};
//! use restapi_router::{MatchKind, Router};
//!
//! let router = Router::new();
//! router.get("/users/:id/posts", handler_fn(|_req: Request| async {
//!     Response::new(full("[]"))
//! }));
//!
//! let route = router.lookup(&Method::GET, "/users/42/posts");
//! assert_eq!(route.kind, MatchKind::Method);
//! assert_eq!(route.params, vec![("id".to_string(), "42".to_string())]);
//! ```
//!
//! # Architecture
//!
//! ```text
//!                    (root) ── mux: "/"
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!           "users"         "assets" ── mux: "/img/"
//!              │
//!        ┌─────┴─────┐
//!        │           │
//!      "me"        ":id"  (aliases: id)
//!     [GET]          │
//!                 "posts"
//!                 [GET]
//! ```

#![doc(html_root_url = "https://docs.rs/restapi-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod method_router;
mod middleware;
mod mux;
mod node;
mod params;
pub mod path;
mod router;
mod routing;

pub use method_router::MethodRouter;
pub use middleware::{BoxedMiddleware, FnMiddleware, Middleware, Next};
pub use mux::ServeMux;
pub use params::{path_params, with_path_param, PathParams};
pub use router::{MatchKind, RouteMatch, Router};
pub use routing::{OriginalUri, RoutingContext};
