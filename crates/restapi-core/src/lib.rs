//! # restapi core
//!
//! Core types and traits shared by the restapi crates.
//!
//! - [`Handler`] - the request handler trait, with [`handler_fn`] for closures
//! - [`Request`], [`Response`], [`Body`] - HTTP types with a boxed, streamable body
//! - [`MimeType`] - MIME parsing with base-form comparison
//! - [`ErrorKind`], [`RestError`], [`UserError`] - the error taxonomy
//! - [`Problem`], [`ProblemWriter`], [`ErrorHandler`] - RFC 7807 error responses
//! - [`HandlerService`] - serves any handler with hyper

#![doc(html_root_url = "https://docs.rs/restapi-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod error;
mod handler;
pub mod mime;
mod problem;
mod service;

pub use body::{
    boxed, empty, from_stream, full, set_allow, Body, BoxError, Request, Response, ResponseExt,
};
pub use error::{ErrorKind, RestError, RestResult, UserError};
pub use handler::{handler_fn, BoxFuture, BoxedHandler, Handler, HandlerFn};
pub use self::mime::{InvalidMimeType, MimeType};
pub use problem::{ErrorHandler, Problem, ProblemError, ProblemType, ProblemWriter};
pub use service::HandlerService;
