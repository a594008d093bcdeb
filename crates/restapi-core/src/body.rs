//! HTTP request and response types shared by every restapi crate.
//!
//! Bodies are boxed so that a single [`Response`] type can carry either a
//! fully buffered payload (a problem document, a single entity) or a lazily
//! produced stream (an index listing).

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body::Frame;
use http_body_util::{BodyExt, Empty, Full, StreamBody};

/// Boxed error type carried by bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The body type used for requests and responses.
pub type Body = http_body_util::combinators::UnsyncBoxBody<Bytes, BoxError>;

/// The HTTP request type handled by routers and resources.
pub type Request = http::Request<Body>;

/// The HTTP response type produced by routers and resources.
pub type Response = http::Response<Body>;

/// Creates a body holding the given bytes.
pub fn full(bytes: impl Into<Bytes>) -> Body {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Creates an empty body.
pub fn empty() -> Body {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Creates a body that yields each chunk of `stream` as a data frame.
///
/// The stream is dropped as soon as the body is dropped, which is how a
/// cancelled request releases whatever the stream holds.
pub fn from_stream<S>(stream: S) -> Body
where
    S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
{
    StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
}

/// Wraps any compatible body, e.g. `hyper::body::Incoming`.
pub fn boxed<B>(body: B) -> Body
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    body.map_err(Into::into).boxed_unsync()
}

/// Convenience constructors for [`Response`].
pub trait ResponseExt {
    /// Creates a response with the given status and an empty body.
    fn with_status(status: StatusCode) -> Response;

    /// Creates a response with a status, a `Content-Type`, and a body.
    fn with_body(status: StatusCode, content_type: &str, body: Body) -> Response;
}

impl ResponseExt for Response {
    fn with_status(status: StatusCode) -> Response {
        let mut response = http::Response::new(empty());
        *response.status_mut() = status;
        response
    }

    fn with_body(status: StatusCode, content_type: &str, body: Body) -> Response {
        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        if let Ok(value) = HeaderValue::from_str(content_type) {
            response.headers_mut().insert(CONTENT_TYPE, value);
        }
        response
    }
}

/// Sets the `Allow` header to the given methods.
///
/// Leaves the response untouched when `methods` is empty.
pub fn set_allow(response: &mut Response, methods: &[Method]) {
    if methods.is_empty() {
        return;
    }
    let value = methods
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&value) {
        response.headers_mut().insert(ALLOW, value);
    }
}
