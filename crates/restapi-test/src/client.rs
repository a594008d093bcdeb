//! Test client for in-memory HTTP testing.

use crate::error::TestError;
use crate::request::{TestRequest, TestRequestBuilder};
use crate::response::TestResponse;
use bytes::Bytes;
use http::Method;
use restapi_core::{BoxedHandler, Handler};
use serde::Serialize;
use std::sync::Arc;

/// Sends requests straight into a [`Handler`] without a server.
///
/// The client works with anything that serves requests: a router, a
/// resource, or a `handler_fn`.
///
/// # Example
///
/// ```
/// use restapi_core::{full, handler_fn, Request, Response};
/// use restapi_test::TestClient;
///
/// # tokio_test_block_on(async {
/// let client = TestClient::new(handler_fn(|req: Request| async move {
///     Response::new(full(req.uri().path().to_string()))
/// }));
///
/// let response = client.get("/foos").send().await;
/// response.assert_body_eq("/foos");
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[must_use]
#[derive(Clone)]
pub struct TestClient {
    handler: BoxedHandler,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client serving requests with `handler`.
    pub fn new(handler: impl Handler) -> Self {
        Self::from_boxed(Arc::new(handler))
    }

    /// Creates a client from a shared handler.
    pub fn from_boxed(handler: BoxedHandler) -> Self {
        Self {
            handler,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Creates a GET request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::get(uri))
    }

    /// Creates a POST request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::post(uri))
    }

    /// Creates a PUT request.
    pub fn put(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::put(uri))
    }

    /// Creates a PATCH request.
    pub fn patch(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::patch(uri))
    }

    /// Creates a DELETE request.
    pub fn delete(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequest::delete(uri))
    }

    /// Creates a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest::new(self, TestRequestBuilder::new(method, uri))
    }

    /// Serves `request` and reads the whole response.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the response body fails.
    pub async fn execute(&self, request: TestRequest) -> Result<TestResponse, TestError> {
        let response = self.handler.call(request.into_request()).await;
        TestResponse::from_response(response).await
    }
}

impl std::fmt::Debug for TestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestClient")
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// A request builder bound to a test client.
#[must_use]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl<'a> TestClientRequest<'a> {
    fn new(client: &'a TestClient, builder: TestRequestBuilder) -> Self {
        let mut builder = builder;
        for (name, value) in &client.default_headers {
            builder = builder.header(name, value);
        }
        Self { client, builder }
    }

    /// Sets a header on the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the Content-Type header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets the Accept header.
    pub fn accept(mut self, accept: impl AsRef<str>) -> Self {
        self.builder = self.builder.accept(accept);
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets the request body as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sets the request body as form-urlencoded.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the response body fails;
    /// use [`try_send`](Self::try_send) to get the error instead.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("test request failed: {err}"),
        }
    }

    /// Sends the request and returns a Result.
    ///
    /// # Errors
    ///
    /// Returns [`TestError`] if the request cannot be built or the
    /// response body fails.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use restapi_core::{full, handler_fn, Request, Response, ResponseExt};
    use serde_json::json;

    fn echo() -> TestClient {
        TestClient::new(handler_fn(|req: Request| async move {
            let body = json!({
                "method": req.method().as_str(),
                "path": req.uri().path(),
                "query": req.uri().query(),
                "accept": req.headers().get("accept").and_then(|v| v.to_str().ok()),
                "custom": req.headers().get("x-custom").and_then(|v| v.to_str().ok()),
            });
            Response::with_body(StatusCode::OK, "application/json", full(body.to_string()))
        }))
    }

    #[tokio::test]
    async fn test_echo() {
        let response = echo().get("/foos?foo=1").accept("application/json").send().await;

        response.assert_status(StatusCode::OK);
        response.assert_json_field("path", &json!("/foos"));
        response.assert_json_field("query", &json!("foo=1"));
        response.assert_json_field("accept", &json!("application/json"));
    }

    #[tokio::test]
    async fn test_all_methods() {
        let client = echo();
        for (request, method) in [
            (client.get("/x"), "GET"),
            (client.post("/x"), "POST"),
            (client.put("/x"), "PUT"),
            (client.patch("/x"), "PATCH"),
            (client.delete("/x"), "DELETE"),
            (client.request(Method::OPTIONS, "/x"), "OPTIONS"),
        ] {
            request.send().await.assert_json_field("method", &json!(method));
        }
    }

    #[tokio::test]
    async fn test_default_headers() {
        let client = echo().with_default_header("X-Custom", "default-value");
        let response = client.get("/test").send().await;
        response.assert_json_field("custom", &json!("default-value"));
    }

    #[tokio::test]
    async fn test_json_body_reaches_handler() {
        let client = TestClient::new(handler_fn(|req: Request| async move {
            let content_type = req.headers()[http::header::CONTENT_TYPE].clone();
            let mut response = Response::new(req.into_body());
            response
                .headers_mut()
                .insert(http::header::CONTENT_TYPE, content_type);
            response
        }));

        let response = client.post("/foos").json(&json!({"foo": 1})).send().await;
        response.assert_content_type("application/json");
        response.assert_json_eq(&json!({"foo": 1}));
    }

    #[tokio::test]
    async fn test_try_send_reports_build_errors() {
        let result = echo().get("/x").header("bad header", "v").try_send().await;
        assert!(matches!(result, Err(TestError::InvalidHeader(_))));
    }
}
