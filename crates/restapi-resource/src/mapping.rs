//! Entity to DTO mapping.
//!
//! Resources never serialize entities directly. A [`Mapping`] decides what
//! goes over the wire: [`PassThrough`] sends the entity itself, [`Dto`]
//! converts to and from a dedicated transfer type.

use crate::context::RequestContext;
use bytes::Bytes;
use restapi_codec::{ListEncoder, SerializeError, Serializer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A decoded DTO whose concrete type only its mapping knows.
pub type AnyDto = Box<dyn Any + Send>;

/// Error raised while mapping between entities and DTOs.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// The request body could not be decoded into the DTO.
    #[error("invalid request body")]
    Decode(#[source] SerializeError),

    /// The DTO could not be encoded.
    #[error("failed to encode response")]
    Encode(#[source] SerializeError),

    /// A DTO of another type was handed to the mapping.
    #[error("implementation error: expected DTO of type {expected}")]
    WrongDto {
        /// The DTO type the mapping works with
        expected: &'static str,
    },

    /// The conversion itself failed.
    #[error("mapping failed")]
    Convert(#[source] anyhow::Error),
}

/// Two-way conversion between an entity and its wire form.
pub trait Mapping<E>: Send + Sync + 'static {
    /// Decodes `bytes` into a fresh DTO.
    fn new_dto(&self, serializer: &Serializer, bytes: &[u8]) -> Result<AnyDto, MappingError>;

    /// Converts a DTO produced by [`new_dto`](Self::new_dto) into an entity.
    ///
    /// Fails with [`MappingError::WrongDto`] for any other DTO type.
    fn to_entity(&self, ctx: &RequestContext, dto: AnyDto) -> Result<E, MappingError>;

    /// Converts `entity` to its DTO and encodes it.
    fn encode(
        &self,
        ctx: &RequestContext,
        entity: E,
        serializer: &Serializer,
    ) -> Result<Bytes, MappingError>;

    /// Converts `entity` to its DTO and encodes it as the next list element.
    fn encode_item(
        &self,
        ctx: &RequestContext,
        entity: E,
        list: &mut ListEncoder,
    ) -> Result<Bytes, MappingError>;

    /// Decodes `bytes` straight into an entity.
    fn decode(
        &self,
        ctx: &RequestContext,
        serializer: &Serializer,
        bytes: &[u8],
    ) -> Result<E, MappingError> {
        let dto = self.new_dto(serializer, bytes)?;
        self.to_entity(ctx, dto)
    }
}

fn unmarshal<D>(serializer: &Serializer, bytes: &[u8]) -> Result<AnyDto, MappingError>
where
    D: DeserializeOwned + Send + 'static,
{
    let dto: D = serializer.unmarshal(bytes).map_err(MappingError::Decode)?;
    Ok(Box::new(dto))
}

fn downcast<D: 'static>(dto: AnyDto) -> Result<D, MappingError> {
    dto.downcast::<D>()
        .map(|dto| *dto)
        .map_err(|_| MappingError::WrongDto {
            expected: type_name::<D>(),
        })
}

/// The mapping used when none is configured: the entity is its own DTO.
pub struct PassThrough<E> {
    _entity: PhantomData<fn() -> E>,
}

impl<E> PassThrough<E> {
    /// Creates the mapping.
    pub fn new() -> Self {
        Self {
            _entity: PhantomData,
        }
    }
}

impl<E> Default for PassThrough<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for PassThrough<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassThrough")
            .field("entity", &type_name::<E>())
            .finish()
    }
}

impl<E> Mapping<E> for PassThrough<E>
where
    E: Serialize + DeserializeOwned + Send + 'static,
{
    fn new_dto(&self, serializer: &Serializer, bytes: &[u8]) -> Result<AnyDto, MappingError> {
        unmarshal::<E>(serializer, bytes)
    }

    fn to_entity(&self, _ctx: &RequestContext, dto: AnyDto) -> Result<E, MappingError> {
        downcast::<E>(dto)
    }

    fn encode(
        &self,
        _ctx: &RequestContext,
        entity: E,
        serializer: &Serializer,
    ) -> Result<Bytes, MappingError> {
        serializer.marshal(&entity).map_err(MappingError::Encode)
    }

    fn encode_item(
        &self,
        _ctx: &RequestContext,
        entity: E,
        list: &mut ListEncoder,
    ) -> Result<Bytes, MappingError> {
        list.encode(&entity).map_err(MappingError::Encode)
    }
}

type ToDtoFn<E, D> = Arc<dyn Fn(&RequestContext, E) -> anyhow::Result<D> + Send + Sync>;
type ToEntityFn<E, D> = Arc<dyn Fn(&RequestContext, D) -> anyhow::Result<E> + Send + Sync>;

/// A mapping through a dedicated DTO type `D`.
///
/// # Example
///
/// ```rust
/// use restapi_resource::Dto;
/// use serde::{Deserialize, Serialize};
///
/// struct Foo { id: u64, secret: String, foo: i64 }
///
/// #[derive(Serialize, Deserialize)]
/// struct PublicFoo { id: u64, foo: i64 }
///
/// let mapping = Dto::new(
///     |_ctx, foo: Foo| Ok(PublicFoo { id: foo.id, foo: foo.foo }),
///     |_ctx, dto: PublicFoo| Ok(Foo { id: dto.id, secret: String::new(), foo: dto.foo }),
/// );
/// # let _ = mapping;
/// ```
pub struct Dto<E, D> {
    to_dto: ToDtoFn<E, D>,
    to_entity: ToEntityFn<E, D>,
}

impl<E, D> Clone for Dto<E, D> {
    fn clone(&self) -> Self {
        Self {
            to_dto: Arc::clone(&self.to_dto),
            to_entity: Arc::clone(&self.to_entity),
        }
    }
}

impl<E, D> fmt::Debug for Dto<E, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dto")
            .field("entity", &type_name::<E>())
            .field("dto", &type_name::<D>())
            .finish()
    }
}

impl<E, D> Dto<E, D> {
    /// Creates a mapping from two conversion functions.
    pub fn new<T, U>(to_dto: T, to_entity: U) -> Self
    where
        T: Fn(&RequestContext, E) -> anyhow::Result<D> + Send + Sync + 'static,
        U: Fn(&RequestContext, D) -> anyhow::Result<E> + Send + Sync + 'static,
    {
        Self {
            to_dto: Arc::new(to_dto),
            to_entity: Arc::new(to_entity),
        }
    }
}

impl<E, D> Mapping<E> for Dto<E, D>
where
    E: Send + 'static,
    D: Serialize + DeserializeOwned + Send + 'static,
{
    fn new_dto(&self, serializer: &Serializer, bytes: &[u8]) -> Result<AnyDto, MappingError> {
        unmarshal::<D>(serializer, bytes)
    }

    fn to_entity(&self, ctx: &RequestContext, dto: AnyDto) -> Result<E, MappingError> {
        let dto = downcast::<D>(dto)?;
        (self.to_entity)(ctx, dto).map_err(MappingError::Convert)
    }

    fn encode(
        &self,
        ctx: &RequestContext,
        entity: E,
        serializer: &Serializer,
    ) -> Result<Bytes, MappingError> {
        let dto = (self.to_dto)(ctx, entity).map_err(MappingError::Convert)?;
        serializer.marshal(&dto).map_err(MappingError::Encode)
    }

    fn encode_item(
        &self,
        ctx: &RequestContext,
        entity: E,
        list: &mut ListEncoder,
    ) -> Result<Bytes, MappingError> {
        let dto = (self.to_dto)(ctx, entity).map_err(MappingError::Convert)?;
        list.encode(&dto).map_err(MappingError::Encode)
    }
}
