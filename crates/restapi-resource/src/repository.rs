//! Repository capabilities used by [`Resource::with_crud`](crate::Resource::with_crud).
//!
//! A repository implements whichever capability traits it supports and
//! advertises them through the [`Repository`] accessors. Capabilities that
//! are not advertised leave the matching resource operation unset.

use crate::context::RequestContext;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use restapi_core::{ErrorKind, RestError, UserError};

/// A lazily produced, finite sequence of entities.
///
/// Dropping the stream releases whatever it holds.
pub type EntityStream<E> = BoxStream<'static, Result<E, RepositoryError>>;

/// Builds an [`EntityStream`] over already loaded entities.
pub fn entities<E, I>(items: I) -> EntityStream<E>
where
    E: Send + 'static,
    I: IntoIterator<Item = E>,
    I::IntoIter: Send + 'static,
{
    stream::iter(items.into_iter().map(Ok)).boxed()
}

/// Error reported by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The entity does not exist.
    #[error("entity not found")]
    NotFound,

    /// An entity with the same identity already exists.
    #[error("entity already exists")]
    AlreadyExists,

    /// A named error meant for the client.
    #[error(transparent)]
    User(#[from] UserError),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for RestError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => RestError::entity_not_found(),
            RepositoryError::AlreadyExists => RestError::entity_already_exist(),
            RepositoryError::User(user) => match user.kind() {
                Some(kind) if kind != ErrorKind::InternalServerError => {
                    RestError::new(kind).with_detail(user.message)
                }
                _ => RestError::internal().with_source(user),
            },
            RepositoryError::Other(source) => RestError::internal().with_source(source),
        }
    }
}

/// Stores new entities.
#[async_trait]
pub trait Creator<E>: Send + Sync {
    /// Stores `entity` and returns it as stored, with its ID assigned.
    async fn create(&self, ctx: &RequestContext, entity: E) -> Result<E, RepositoryError>;
}

/// Lists entities.
#[async_trait]
pub trait AllFinder<E>: Send + Sync {
    /// Returns every entity matching the raw query string.
    async fn find_all(
        &self,
        ctx: &RequestContext,
        query: &str,
    ) -> Result<EntityStream<E>, RepositoryError>;
}

/// Loads one entity.
#[async_trait]
pub trait ByIdFinder<E, ID>: Send + Sync {
    /// Returns the entity with `id`, or [`RepositoryError::NotFound`].
    async fn find_by_id(&self, ctx: &RequestContext, id: &ID) -> Result<E, RepositoryError>;
}

/// Replaces entities.
#[async_trait]
pub trait Updater<E>: Send + Sync {
    /// Replaces the stored entity carrying the same ID as `entity`.
    async fn update(&self, ctx: &RequestContext, entity: E) -> Result<(), RepositoryError>;
}

/// Deletes every entity matching a query.
#[async_trait]
pub trait AllDeleter: Send + Sync {
    /// Deletes every entity matching the raw query string.
    async fn delete_all(&self, ctx: &RequestContext, query: &str) -> Result<(), RepositoryError>;
}

/// Deletes one entity.
#[async_trait]
pub trait ByIdDeleter<ID>: Send + Sync {
    /// Deletes the entity with `id`, or fails with [`RepositoryError::NotFound`].
    async fn delete_by_id(&self, ctx: &RequestContext, id: &ID) -> Result<(), RepositoryError>;
}

/// Advertises the capabilities a repository supports.
///
/// Every accessor defaults to `None`; implement the ones backed by a
/// capability trait.
///
/// ```rust
/// use async_trait::async_trait;
/// use restapi_resource::{ByIdFinder, Repository, RepositoryError, RequestContext};
///
/// struct Users;
///
/// #[async_trait]
/// impl ByIdFinder<String, u64> for Users {
///     async fn find_by_id(&self, _ctx: &RequestContext, id: &u64) -> Result<String, RepositoryError> {
///         if *id == 1 { Ok("root".into()) } else { Err(RepositoryError::NotFound) }
///     }
/// }
///
/// impl Repository<String, u64> for Users {
///     fn by_id_finder(&self) -> Option<&dyn ByIdFinder<String, u64>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Repository<E, ID>: Send + Sync + 'static {
    /// Returns the create capability.
    fn creator(&self) -> Option<&dyn Creator<E>> {
        None
    }

    /// Returns the list capability.
    fn all_finder(&self) -> Option<&dyn AllFinder<E>> {
        None
    }

    /// Returns the load-by-ID capability.
    fn by_id_finder(&self) -> Option<&dyn ByIdFinder<E, ID>> {
        None
    }

    /// Returns the update capability.
    fn updater(&self) -> Option<&dyn Updater<E>> {
        None
    }

    /// Returns the delete-all capability.
    fn all_deleter(&self) -> Option<&dyn AllDeleter> {
        None
    }

    /// Returns the delete-by-ID capability.
    fn by_id_deleter(&self) -> Option<&dyn ByIdDeleter<ID>> {
        None
    }
}

/// Entities that carry their own ID.
pub trait ExternalId<ID> {
    /// Returns the entity's ID, if assigned.
    fn external_id(&self) -> Option<ID>;

    /// Assigns the entity's ID.
    fn set_external_id(&mut self, id: ID);
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    #[tokio::test]
    async fn test_entities_stream() {
        let items: Vec<u32> = entities(vec![1, 2, 3]).try_collect().await.unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_rest_error_mapping() {
        assert_eq!(
            RestError::from(RepositoryError::NotFound).kind(),
            ErrorKind::EntityNotFound
        );
        assert_eq!(
            RestError::from(RepositoryError::AlreadyExists).kind(),
            ErrorKind::EntityAlreadyExist
        );
        assert_eq!(
            RestError::from(RepositoryError::Other(anyhow::anyhow!("disk full"))).kind(),
            ErrorKind::InternalServerError
        );
    }

    #[test]
    fn test_user_error_mapping() {
        let known = RepositoryError::User(UserError::new("entity-not-found", "no such foo"));
        let err = RestError::from(known);
        assert_eq!(err.kind(), ErrorKind::EntityNotFound);
        assert_eq!(err.detail(), Some("no such foo"));

        let custom = RepositoryError::User(UserError::new("quota-exceeded", "too many foos"));
        let err = RestError::from(custom);
        assert_eq!(err.kind(), ErrorKind::InternalServerError);
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<UserError>().is_some());
    }
}
