//! # restapi-test
//!
//! In-memory testing for restapi routers and resources. Requests go
//! straight into a [`Handler`](restapi_core::Handler), so no port is bound
//! and no server runs.
//!
//! - [`TestClient`] sends requests and collects whole responses
//! - [`TestResponse`] carries assertions for status, headers, JSON, NDJSON
//!   and problem documents
//! - [`MemoryRepository`] backs `Resource::with_crud` with every capability
//!
//! ## Example
//!
//! ```ignore
//! use restapi_core::ErrorKind;
//! use restapi_resource::Resource;
//! use restapi_test::{MemoryRepository, TestClient};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_foos() {
//!     let foos = Resource::<Foo, u64>::new().with_crud(MemoryRepository::sequential());
//!     let client = TestClient::new(foos);
//!
//!     client
//!         .post("/")
//!         .json(&json!({"foo": 42}))
//!         .send()
//!         .await
//!         .assert_status(http::StatusCode::CREATED);
//!
//!     client.get("/7").send().await.assert_problem(ErrorKind::EntityNotFound);
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/restapi-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod memory;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use memory::MemoryRepository;
pub use request::{TestRequest, TestRequestBuilder};
pub use response::TestResponse;
