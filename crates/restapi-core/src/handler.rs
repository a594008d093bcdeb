//! Handler trait for request processing.
//!
//! The [`Handler`] trait is the single seam between routers, resources, and
//! user code. Routers are handlers, resources are handlers, and plain async
//! closures become handlers through [`handler_fn`].

use crate::body::{Request, Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed future that returns `T`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A shareable, type-erased handler.
pub type BoxedHandler = Arc<dyn Handler>;

/// Serves HTTP requests.
///
/// A handler always produces a [`Response`]. Failures are reported as
/// responses (usually problem documents), never as `Err`.
///
/// # Example
///
/// ```rust
/// use restapi_core::{full, BoxFuture, Handler, Request, Response};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn call<'a>(&'a self, _request: Request) -> BoxFuture<'a, Response> {
///         Box::pin(async { Response::new(full("hello")) })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles a request and returns a response.
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Response>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Response> {
        (**self).call(request)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Response> {
        (**self).call(request)
    }
}

/// A handler backed by an async function.
///
/// Created with [`handler_fn`].
pub struct HandlerFn<F> {
    func: F,
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Wraps an async function as a [`Handler`].
///
/// # Example
///
/// ```rust
/// use restapi_core::{full, handler_fn, Request, Response};
///
/// let handler = handler_fn(|_req: Request| async { Response::new(full("pong")) });
/// # let _ = handler;
/// ```
pub fn handler_fn<F, Fut>(func: F) -> HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    HandlerFn { func }
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Response> {
        Box::pin((self.func)(request))
    }
}
