//! Adapter from [`Handler`] to `hyper`'s `Service` trait.

use crate::body::{boxed, BoxError, Response};
use crate::handler::{BoxFuture, Handler};
use bytes::Bytes;
use std::convert::Infallible;
use std::sync::Arc;

/// Serves a [`Handler`] on a hyper connection.
///
/// # Example
///
/// ```rust,no_run
/// use hyper_util::rt::TokioIo;
/// use restapi_core::{full, handler_fn, HandlerService, Request, Response};
///
/// # async fn run() -> std::io::Result<()> {
/// let service = HandlerService::new(handler_fn(|_req: Request| async {
///     Response::new(full("ok"))
/// }));
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// let (stream, _) = listener.accept().await?;
/// let _ = hyper::server::conn::http1::Builder::new()
///     .serve_connection(TokioIo::new(stream), service)
///     .await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HandlerService<H: ?Sized> {
    handler: Arc<H>,
}

impl<H: ?Sized> Clone for HandlerService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: Handler> HandlerService<H> {
    /// Wraps a handler.
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl<H: Handler + ?Sized> HandlerService<H> {
    /// Wraps a shared handler.
    pub fn from_arc(handler: Arc<H>) -> Self {
        Self { handler }
    }
}

impl<H, B> hyper::service::Service<http::Request<B>> for HandlerService<H>
where
    H: Handler + ?Sized,
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn call(&self, request: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let request = request.map(boxed);
        Box::pin(async move { Ok(handler.call(request).await) })
    }
}
