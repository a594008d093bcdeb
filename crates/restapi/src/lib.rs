//! # restapi
//!
//! **HTTP resource routing and RESTful resources with RFC 7807 errors**
//!
//! restapi provides:
//!
//! - A trie [`Router`](router::Router) with fixed and `:dynamic` segments,
//!   namespaces, middleware and a pattern-matching fallback
//! - [`Resource`](resource::Resource) handlers that map HTTP verbs onto
//!   index, create, show, update, destroy and destroy-all operations
//! - Content negotiation over JSON, NDJSON and form bodies, with streamed
//!   list responses
//! - Problem documents (`application/problem+json`) for every failure
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use restapi::prelude::*;
//!
//! #[derive(Clone, serde::Serialize, serde::Deserialize)]
//! struct Foo {
//!     #[serde(default)]
//!     id: Option<u64>,
//!     foo: i64,
//! }
//!
//! impl ExternalId<u64> for Foo {
//!     fn external_id(&self) -> Option<u64> { self.id }
//!     fn set_external_id(&mut self, id: u64) { self.id = Some(id); }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::new();
//!     router.resource("/foos", Resource::<Foo, u64>::new().with_crud(my_repository()));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let service = router.clone().into_service();
//!         tokio::spawn(async move {
//!             let _ = hyper::server::conn::http1::Builder::new()
//!                 .serve_connection(hyper_util::rt::TokioIo::new(stream), service)
//!                 .await;
//!         });
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → Router (trie → middleware → method / default / mux) → Resource
//!                                                                    ↓
//! Response ← ProblemWriter ← Mapping + Serializer ← operation ←──────┘
//! ```

#![doc(html_root_url = "https://docs.rs/restapi/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use restapi_core as core;

// Re-export router types
pub use restapi_router as router;

// Re-export serializers
pub use restapi_codec as codec;

// Re-export resource types
pub use restapi_resource as resource;

// Re-export configuration
pub use restapi_config as config;

// Re-export logging setup
pub use restapi_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use restapi::prelude::*;
///
/// let router = Router::new();
/// router.get("/ping", handler_fn(|_req: Request| async { Response::new(full("pong")) }));
/// ```
pub mod prelude {
    pub use restapi_core::{
        empty, full, handler_fn, mime, ErrorHandler, ErrorKind, Handler, Problem, ProblemWriter,
        Request, Response, ResponseExt, RestError, RestResult, UserError,
    };

    pub use restapi_router::{
        path_params, FnMiddleware, Middleware, Next, PathParams, RoutingContext, ServeMux, Router,
    };

    pub use restapi_codec::{Serializer, SerializerRegistry};

    pub use restapi_resource::{
        entities, resource_id, AllDeleter, AllFinder, ByIdDeleter, ByIdFinder, Creator, Dto,
        EntityStream, ExternalId, IdConverter, Mapping, Repository, RepositoryError,
        RequestContext, Resource, Updater,
    };

    pub use restapi_config::{ConfigLoader, RestApiConfig};

    pub use restapi_telemetry::{init_logging, LogConfig};
}
