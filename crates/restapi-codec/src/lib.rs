//! # restapi codec
//!
//! Serializers, list encoders, and content negotiation for restapi
//! resources.
//!
//! ## Built-in serializers
//!
//! | MIME type | Serializer | Lists |
//! |-----------|------------|-------|
//! | `application/json` | JSON | JSON array |
//! | `application/problem+json` | JSON | JSON array |
//! | `application/x-ndjson` | JSON lines | one per line |
//! | `application/stream+json` | JSON lines | one per line |
//! | `application/json-stream` | JSON lines | one per line |
//! | `application/x-www-form-urlencoded` | form | no |
//!
//! Additional formats are added with [`SerializerRegistry::register`],
//! usually through a [`ValueCodec`].
//!
//! ## Example
//!
//! ```rust
//! use http::HeaderMap;
//! use restapi_codec::SerializerRegistry;
//!
//! let registry = SerializerRegistry::new();
//! let negotiated = registry.response_serializer(&HeaderMap::new());
//! assert_eq!(negotiated.mime, "application/json");
//!
//! let mut list = negotiated.serializer.list_encoder().unwrap();
//! let mut out = Vec::new();
//! out.extend_from_slice(&list.begin());
//! out.extend_from_slice(&list.encode(&1).unwrap());
//! out.extend_from_slice(&list.encode(&2).unwrap());
//! out.extend_from_slice(&list.finish());
//! assert_eq!(out, b"[1,2]");
//! ```

#![doc(html_root_url = "https://docs.rs/restapi-codec/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod body;
mod error;
mod registry;
mod serializer;

pub use body::{read_body, DEFAULT_BODY_LIMIT};
pub use error::{BodyError, SerializeError};
pub use registry::{Negotiated, SerializerRegistry};
pub use serializer::{ListEncoder, ListFraming, Serializer, ValueCodec};
