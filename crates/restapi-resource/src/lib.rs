//! # restapi resource
//!
//! A [`Resource`] turns a set of async operations on entities into a
//! RESTful handler that can be mounted on a [`Router`](restapi_router::Router).
//!
//! ## Operations
//!
//! | Request | Operation | Success |
//! |---------|-----------|---------|
//! | `GET /` | index | 200, streamed list |
//! | `POST /` | create | 201, created entity |
//! | `DELETE /` | destroy_all | 204 |
//! | `GET /:id` | show | 200, entity |
//! | `PUT /:id`, `PATCH /:id` | update | 204 |
//! | `DELETE /:id` | destroy | 204 |
//! | `* /:id/...` | sub routes | whatever they answer |
//!
//! Operations can be set one by one or wired from a [`Repository`] with
//! [`Resource::with_crud`].
//!
//! ## Wire format
//!
//! Request bodies are decoded with the serializer matching `Content-Type`;
//! responses use the first `Accept` entry with a registered serializer.
//! What goes over the wire is decided by a [`Mapping`]: entities are sent
//! as is unless a [`Dto`] mapping is configured.
//!
//! ## Errors
//!
//! Failures are reported as RFC 7807 problem documents written by the
//! resource's error handler. Repositories signal the common cases with
//! [`RepositoryError::NotFound`] and [`RepositoryError::AlreadyExists`].

#![doc(html_root_url = "https://docs.rs/restapi-resource/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod crud;
mod id;
mod mapping;
mod repository;
mod resource;

pub use context::{publish_id, resource_id, RequestContext};
pub use id::{DefaultIdConverter, FnIdConverter, IdConverter, IdError};
pub use mapping::{AnyDto, Dto, Mapping, MappingError, PassThrough};
pub use repository::{
    entities, AllDeleter, AllFinder, ByIdDeleter, ByIdFinder, Creator, EntityStream, ExternalId,
    Repository, RepositoryError, Updater,
};
pub use resource::Resource;
