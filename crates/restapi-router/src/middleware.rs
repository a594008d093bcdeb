//! Middleware chains.
//!
//! Middleware registered on a router node wraps every handler reached
//! through that node. During dispatch the router collects the middleware of
//! each node it walks, outermost (closest to the root) first.
//!
//! # Example
//!
//! ```rust
//! use restapi_core::{BoxFuture, Request, Response};
//! use restapi_router::{Middleware, Next};
//!
//! struct Tagging;
//!
//! impl Middleware for Tagging {
//!     fn name(&self) -> &'static str {
//!         "tagging"
//!     }
//!
//!     fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let mut response = next.run(request).await;
//!             response
//!                 .headers_mut()
//!                 .insert("x-tagged", http::HeaderValue::from_static("1"));
//!             response
//!         })
//!     }
//! }
//! ```

use restapi_core::{BoxFuture, Handler, Request, Response};
use std::sync::Arc;

/// Wraps handlers with extra behavior.
///
/// Middleware SHOULD call [`Next::run`] exactly once; returning without
/// calling it short-circuits the chain.
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware, used in logs.
    fn name(&self) -> &'static str;

    /// Processes the request, usually by delegating to `next`.
    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// A shareable, type-erased middleware.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The rest of a middleware chain, ending in the selected handler.
pub struct Next<'a> {
    chain: &'a [BoxedMiddleware],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Creates a chain running `chain` in order, then `handler`.
    pub fn new(chain: &'a [BoxedMiddleware], handler: &'a dyn Handler) -> Self {
        Self { chain, handler }
    }

    /// Invokes the next middleware, or the handler at the end of the chain.
    pub async fn run(self, request: Request) -> Response {
        match self.chain.split_first() {
            Some((middleware, rest)) => {
                tracing::trace!(middleware = middleware.name(), "entering middleware");
                middleware
                    .process(request, Next::new(rest, self.handler))
                    .await
            }
            None => self.handler.call(request).await,
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field(
                "chain",
                &self.chain.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// A middleware defined by a closure.
///
/// ```rust
/// use restapi_router::FnMiddleware;
///
/// let timing = FnMiddleware::new("timing", |request, next| {
///     Box::pin(async move {
///         let started = std::time::Instant::now();
///         let response = next.run(request).await;
///         tracing::debug!(elapsed = ?started.elapsed(), "request done");
///         response
///     })
/// });
/// # let _ = timing;
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Response> + Send + Sync + 'static,
{
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(Request, Next<'a>) -> BoxFuture<'a, Response> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(&'a self, request: Request, next: Next<'a>) -> BoxFuture<'a, Response> {
        (self.func)(request, next)
    }
}
