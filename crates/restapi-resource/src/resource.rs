//! The RESTful resource handler.
//!
//! A [`Resource`] serves one collection and its members:
//!
//! ```text
//! GET    /        index        POST   /        create
//! DELETE /        destroy_all
//! GET    /:id     show         PUT    /:id     update
//! PATCH  /:id     update       DELETE /:id     destroy
//! *      /:id/... sub routes
//! ```
//!
//! Every failure before the response body is committed is written by the
//! resource's [`ErrorHandler`].

use crate::context::{publish_id, RequestContext};
use crate::id::{DefaultIdConverter, IdConverter, IdError};
use crate::mapping::{Mapping, MappingError, PassThrough};
use crate::repository::{EntityStream, RepositoryError};
use bytes::{Bytes, BytesMut};
use futures_util::future::{self, FutureExt};
use futures_util::stream::{self, StreamExt};
use http::request::Parts;
use http::{Method, StatusCode};
use restapi_codec::{read_body, ListEncoder, Serializer, SerializerRegistry, DEFAULT_BODY_LIMIT};
use restapi_config::RestApiConfig;
use restapi_core::{
    from_stream, full, set_allow, Body, BoxError, BoxFuture, BoxedHandler, ErrorHandler, Handler,
    MimeType, ProblemWriter, Request, Response, ResponseExt, RestError,
};
use restapi_router::{path, RoutingContext};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

type OpFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

type IndexFn<E> = Arc<dyn Fn(RequestContext) -> OpFuture<EntityStream<E>> + Send + Sync>;
type CreateFn<E> = Arc<dyn Fn(RequestContext, E) -> OpFuture<E> + Send + Sync>;
type ShowFn<E, ID> = Arc<dyn Fn(RequestContext, ID) -> OpFuture<E> + Send + Sync>;
type UpdateFn<E, ID> = Arc<dyn Fn(RequestContext, ID, E) -> OpFuture<()> + Send + Sync>;
type DestroyFn<ID> = Arc<dyn Fn(RequestContext, ID) -> OpFuture<()> + Send + Sync>;
type DestroyAllFn = Arc<dyn Fn(RequestContext, String) -> OpFuture<()> + Send + Sync>;

/// A RESTful handler for entities of type `E` identified by `ID`.
///
/// Operations are plain async closures; any operation left unset answers
/// 405 with an `Allow` header listing the ones that are set.
///
/// # Example
///
/// ```rust
/// use restapi_resource::{entities, RepositoryError, Resource};
/// use restapi_router::Router;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Foo {
///     id: u64,
///     foo: i64,
/// }
///
/// let foos = Resource::<Foo, u64>::new()
///     .index(|_ctx| async { Ok(entities(vec![Foo { id: 1, foo: 42 }])) })
///     .show(|_ctx, id| async move {
///         if id == 1 {
///             Ok(Foo { id, foo: 42 })
///         } else {
///             Err(RepositoryError::NotFound)
///         }
///     });
///
/// let router = Router::new();
/// router.resource("/foos", foos);
/// ```
pub struct Resource<E, ID> {
    pub(crate) index: Option<IndexFn<E>>,
    pub(crate) create: Option<CreateFn<E>>,
    pub(crate) show: Option<ShowFn<E, ID>>,
    pub(crate) update: Option<UpdateFn<E, ID>>,
    pub(crate) destroy: Option<DestroyFn<ID>>,
    pub(crate) destroy_all: Option<DestroyAllFn>,
    sub_routes: Option<BoxedHandler>,

    serializers: SerializerRegistry,
    ids: Arc<dyn IdConverter<ID>>,
    default_mapping: Arc<dyn Mapping<E>>,
    mappings: HashMap<String, Arc<dyn Mapping<E>>>,
    errors: Arc<dyn ErrorHandler>,
    id_key: String,
    body_limit: usize,
}

impl<E, ID> Resource<E, ID>
where
    E: Serialize + DeserializeOwned + Send + 'static,
    ID: Clone + Send + Sync + 'static,
{
    /// Creates a resource whose entities are their own DTOs.
    #[must_use]
    pub fn new() -> Self {
        Self::mapped(PassThrough::new())
    }
}

impl<E, ID> Default for Resource<E, ID>
where
    E: Serialize + DeserializeOwned + Send + 'static,
    ID: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, ID> Resource<E, ID>
where
    E: Send + 'static,
    ID: Clone + Send + Sync + 'static,
{
    /// Creates a resource using `mapping` for every MIME type without a
    /// mapping of its own.
    #[must_use]
    pub fn mapped(mapping: impl Mapping<E>) -> Self {
        Self {
            index: None,
            create: None,
            show: None,
            update: None,
            destroy: None,
            destroy_all: None,
            sub_routes: None,
            serializers: SerializerRegistry::new(),
            ids: Arc::new(DefaultIdConverter),
            default_mapping: Arc::new(mapping),
            mappings: HashMap::new(),
            errors: Arc::new(ProblemWriter::default()),
            id_key: type_name::<E>().to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Sets the list operation (`GET /`).
    #[must_use]
    pub fn index<F, Fut>(mut self, op: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<EntityStream<E>, RepositoryError>> + Send + 'static,
    {
        let op: IndexFn<E> =
            Arc::new(move |ctx: RequestContext| -> OpFuture<EntityStream<E>> { Box::pin(op(ctx)) });
        self.index = Some(op);
        self
    }

    /// Sets the create operation (`POST /`).
    ///
    /// The operation returns the stored entity, which is sent back with
    /// status 201.
    #[must_use]
    pub fn create<F, Fut>(mut self, op: F) -> Self
    where
        F: Fn(RequestContext, E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<E, RepositoryError>> + Send + 'static,
    {
        let op: CreateFn<E> = Arc::new(move |ctx: RequestContext, entity: E| -> OpFuture<E> {
            Box::pin(op(ctx, entity))
        });
        self.create = Some(op);
        self
    }

    /// Sets the load operation (`GET /:id`).
    ///
    /// When set, it also guards update and destroy against missing IDs.
    #[must_use]
    pub fn show<F, Fut>(mut self, op: F) -> Self
    where
        F: Fn(RequestContext, ID) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<E, RepositoryError>> + Send + 'static,
    {
        let op: ShowFn<E, ID> =
            Arc::new(move |ctx: RequestContext, id: ID| -> OpFuture<E> { Box::pin(op(ctx, id)) });
        self.show = Some(op);
        self
    }

    /// Sets the replace operation (`PUT /:id` and `PATCH /:id`).
    #[must_use]
    pub fn update<F, Fut>(mut self, op: F) -> Self
    where
        F: Fn(RequestContext, ID, E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RepositoryError>> + Send + 'static,
    {
        let op: UpdateFn<E, ID> =
            Arc::new(move |ctx: RequestContext, id: ID, entity: E| -> OpFuture<()> {
                Box::pin(op(ctx, id, entity))
            });
        self.update = Some(op);
        self
    }

    /// Sets the delete operation (`DELETE /:id`).
    #[must_use]
    pub fn destroy<F, Fut>(mut self, op: F) -> Self
    where
        F: Fn(RequestContext, ID) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RepositoryError>> + Send + 'static,
    {
        let op: DestroyFn<ID> =
            Arc::new(move |ctx: RequestContext, id: ID| -> OpFuture<()> { Box::pin(op(ctx, id)) });
        self.destroy = Some(op);
        self
    }

    /// Sets the bulk delete operation (`DELETE /`), which receives the raw
    /// query string.
    #[must_use]
    pub fn destroy_all<F, Fut>(mut self, op: F) -> Self
    where
        F: Fn(RequestContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), RepositoryError>> + Send + 'static,
    {
        let op: DestroyAllFn =
            Arc::new(move |ctx: RequestContext, query: String| -> OpFuture<()> {
                Box::pin(op(ctx, query))
            });
        self.destroy_all = Some(op);
        self
    }

    /// Serves `/:id/...` with `handler`, typically a [`Router`](restapi_router::Router).
    ///
    /// The parsed ID is published under the resource's context key and the
    /// routing cursor has already moved past the ID segment.
    #[must_use]
    pub fn sub_routes(mut self, handler: impl Handler) -> Self {
        self.sub_routes = Some(Arc::new(handler));
        self
    }

    /// Registers a serializer, shadowing the built-in one for `mime`.
    #[must_use]
    pub fn with_serializer(mut self, mime: &str, serializer: Serializer) -> Self {
        self.serializers.register(mime, serializer);
        self
    }

    /// Uses `mapping` for requests and responses of the given MIME type.
    #[must_use]
    pub fn with_mapping(mut self, mime: &str, mapping: impl Mapping<E>) -> Self {
        match mime.parse::<MimeType>() {
            Ok(parsed) => {
                self.mappings
                    .insert(parsed.base().to_string(), Arc::new(mapping));
            }
            Err(err) => tracing::warn!(error = %err, "mapping not registered"),
        }
        self
    }

    /// Replaces the error handler.
    #[must_use]
    pub fn with_error_handler(mut self, errors: impl ErrorHandler) -> Self {
        self.errors = Arc::new(errors);
        self
    }

    /// Replaces the ID converter.
    #[must_use]
    pub fn with_id_converter(mut self, ids: impl IdConverter<ID>) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Sets the key the parsed ID is published under.
    ///
    /// Defaults to the entity's type name.
    #[must_use]
    pub fn with_id_context_key(mut self, key: impl Into<String>) -> Self {
        self.id_key = key.into();
        self
    }

    /// Caps request bodies at `limit` bytes.
    #[must_use]
    pub fn body_read_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Applies the resource and problem sections of `config`.
    #[must_use]
    pub fn with_config(mut self, config: &RestApiConfig) -> Self {
        self.body_limit = config.resource.body_read_limit;
        self.serializers
            .set_default_mime(&config.resource.default_mime);
        self.errors = Arc::new(config.problem.writer());
        self
    }

    /// Returns the key the parsed ID is published under.
    pub fn id_context_key(&self) -> &str {
        &self.id_key
    }

    /// Returns the serializer registry.
    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }

    fn collection_methods(&self) -> Vec<Method> {
        let mut allowed = Vec::new();
        if self.index.is_some() {
            allowed.push(Method::GET);
        }
        if self.create.is_some() {
            allowed.push(Method::POST);
        }
        if self.destroy_all.is_some() {
            allowed.push(Method::DELETE);
        }
        allowed
    }

    fn item_methods(&self) -> Vec<Method> {
        let mut allowed = Vec::new();
        if self.show.is_some() {
            allowed.push(Method::GET);
        }
        if self.update.is_some() {
            allowed.push(Method::PUT);
            allowed.push(Method::PATCH);
        }
        if self.destroy.is_some() {
            allowed.push(Method::DELETE);
        }
        allowed
    }

    fn mapping_for(&self, mime: &str) -> Arc<dyn Mapping<E>> {
        self.mappings
            .get(mime)
            .map_or_else(|| Arc::clone(&self.default_mapping), Arc::clone)
    }

    fn fail(&self, parts: &Parts, error: &(dyn StdError + 'static)) -> Response {
        self.errors.handle_error(parts, error)
    }

    fn fail_repository(&self, parts: &Parts, error: RepositoryError) -> Response {
        self.fail(parts, &RestError::from(error))
    }

    fn fail_mapping(&self, parts: &Parts, error: MappingError) -> Response {
        let rest = match error {
            MappingError::Decode(_) => RestError::invalid_request_body(),
            _ => RestError::internal(),
        };
        self.fail(parts, &rest.with_source(error))
    }

    fn method_not_allowed(&self, parts: &Parts, allowed: &[Method]) -> Response {
        let mut response = self.fail(parts, &RestError::method_not_allowed());
        set_allow(&mut response, allowed);
        response
    }

    fn respond_entity(
        &self,
        parts: &Parts,
        ctx: &RequestContext,
        status: StatusCode,
        entity: E,
    ) -> Response {
        let negotiated = self.serializers.response_serializer(&parts.headers);
        match self
            .mapping_for(negotiated.mime)
            .encode(ctx, entity, negotiated.serializer)
        {
            Ok(bytes) => Response::with_body(status, negotiated.mime, full(bytes)),
            Err(err) => self.fail_mapping(parts, err),
        }
    }

    async fn dispatch(&self, request: Request) -> Response {
        let (mut parts, body) = request.into_parts();
        let path_left = RoutingContext::from_parts(&mut parts).path_left().to_string();

        if path_left.is_empty() || path_left == "/" {
            match parts.method {
                Method::GET => {
                    if let Some(index) = &self.index {
                        return self.serve_index(index, parts).await;
                    }
                }
                Method::POST => {
                    if let Some(create) = &self.create {
                        return self.serve_create(create, parts, body).await;
                    }
                }
                Method::DELETE => {
                    if let Some(destroy_all) = &self.destroy_all {
                        return self.serve_destroy_all(destroy_all, parts).await;
                    }
                }
                _ => {}
            }
            return self.method_not_allowed(&parts, &self.collection_methods());
        }

        let (segment, rest) = path::unshift(&path_left);
        let id = match self.ids.parse(segment) {
            Ok(id) => id,
            Err(err @ IdError::Malformed { .. }) => {
                return self.fail(&parts, &RestError::malformed_id().with_source(err));
            }
            Err(err) => return self.fail(&parts, &RestError::internal().with_source(err)),
        };
        publish_id(&mut parts.extensions, &self.id_key, id.clone());
        RoutingContext::from_parts(&mut parts).travel(segment);

        if rest != "/" {
            return match &self.sub_routes {
                Some(sub_routes) => sub_routes.call(Request::from_parts(parts, body)).await,
                None => self.fail(&parts, &RestError::path_not_found()),
            };
        }

        match parts.method {
            Method::GET => {
                if let Some(show) = &self.show {
                    return self.serve_show(show, parts, id).await;
                }
            }
            Method::PUT | Method::PATCH => {
                if let Some(update) = &self.update {
                    return self.serve_update(update, parts, body, id).await;
                }
            }
            Method::DELETE => {
                if let Some(destroy) = &self.destroy {
                    return self.serve_destroy(destroy, parts, id).await;
                }
            }
            _ => {}
        }
        self.method_not_allowed(&parts, &self.item_methods())
    }

    async fn serve_index(&self, index: &IndexFn<E>, parts: Parts) -> Response {
        let negotiated = self.serializers.response_serializer(&parts.headers);
        let Some(mut list) = negotiated.serializer.list_encoder() else {
            let err = RestError::not_acceptable()
                .with_detail(format!("{} cannot encode lists", negotiated.mime));
            return self.fail(&parts, &err);
        };
        let content_type = negotiated.mime.to_string();
        let mapping = self.mapping_for(negotiated.mime);
        let ctx = RequestContext::from_parts(&parts);

        let mut entities = match index(ctx.clone()).await {
            Ok(entities) => entities,
            Err(err) => return self.fail_repository(&parts, err),
        };

        let mut head = BytesMut::new();
        head.extend_from_slice(&list.begin());
        match entities.next().await {
            None => {
                head.extend_from_slice(&list.finish());
                return Response::with_body(StatusCode::OK, &content_type, full(head.freeze()));
            }
            Some(Err(err)) => {
                return self.fail(&parts, &RestError::internal().with_source(err));
            }
            Some(Ok(entity)) => match mapping.encode_item(&ctx, entity, &mut list) {
                Ok(chunk) => head.extend_from_slice(&chunk),
                Err(err) => return self.fail_mapping(&parts, err),
            },
        }

        let tail = IndexTail {
            entities,
            list,
            mapping,
            ctx,
        };
        let body = stream::once(future::ready(Ok::<Bytes, BoxError>(head.freeze())))
            .chain(tail.into_stream());
        Response::with_body(StatusCode::OK, &content_type, from_stream(body))
    }

    async fn serve_create(&self, create: &CreateFn<E>, parts: Parts, body: Body) -> Response {
        let bytes = match read_body(body, self.body_limit).await {
            Ok(bytes) => bytes,
            Err(err) => return self.fail(&parts, &RestError::from(err)),
        };
        let ctx = RequestContext::from_parts(&parts);
        let request = self.serializers.request_serializer(&parts.headers);
        let entity = match self
            .mapping_for(request.mime)
            .decode(&ctx, request.serializer, &bytes)
        {
            Ok(entity) => entity,
            Err(err) => return self.fail_mapping(&parts, err),
        };

        match create(ctx.clone(), entity).await {
            Ok(created) => self.respond_entity(&parts, &ctx, StatusCode::CREATED, created),
            Err(err) => self.fail_repository(&parts, err),
        }
    }

    async fn serve_show(&self, show: &ShowFn<E, ID>, parts: Parts, id: ID) -> Response {
        let ctx = RequestContext::from_parts(&parts);
        match show(ctx.clone(), id).await {
            Ok(entity) => self.respond_entity(&parts, &ctx, StatusCode::OK, entity),
            Err(err) => self.fail_repository(&parts, err),
        }
    }

    async fn serve_update(
        &self,
        update: &UpdateFn<E, ID>,
        parts: Parts,
        body: Body,
        id: ID,
    ) -> Response {
        let bytes = match read_body(body, self.body_limit).await {
            Ok(bytes) => bytes,
            Err(err) => return self.fail(&parts, &RestError::from(err)),
        };
        let ctx = RequestContext::from_parts(&parts);
        let request = self.serializers.request_serializer(&parts.headers);
        let mapping = self.mapping_for(request.mime);
        let dto = match mapping.new_dto(request.serializer, &bytes) {
            Ok(dto) => dto,
            Err(err) => return self.fail_mapping(&parts, err),
        };

        if let Some(show) = &self.show {
            if let Err(err) = show(ctx.clone(), id.clone()).await {
                return self.fail_repository(&parts, err);
            }
        }

        let entity = match mapping.to_entity(&ctx, dto) {
            Ok(entity) => entity,
            Err(err) => return self.fail_mapping(&parts, err),
        };
        match update(ctx, id, entity).await {
            Ok(()) => Response::with_status(StatusCode::NO_CONTENT),
            Err(err) => self.fail_repository(&parts, err),
        }
    }

    async fn serve_destroy(&self, destroy: &DestroyFn<ID>, parts: Parts, id: ID) -> Response {
        let ctx = RequestContext::from_parts(&parts);
        if let Some(show) = &self.show {
            if let Err(err) = show(ctx.clone(), id.clone()).await {
                return self.fail_repository(&parts, err);
            }
        }
        match destroy(ctx, id).await {
            Ok(()) => Response::with_status(StatusCode::NO_CONTENT),
            Err(err) => self.fail_repository(&parts, err),
        }
    }

    async fn serve_destroy_all(&self, destroy_all: &DestroyAllFn, parts: Parts) -> Response {
        let ctx = RequestContext::from_parts(&parts);
        let query = ctx.query().to_string();
        match destroy_all(ctx, query).await {
            Ok(()) => Response::with_status(StatusCode::NO_CONTENT),
            Err(err) => self.fail_repository(&parts, err),
        }
    }
}

/// The part of an index listing produced after the response was committed.
struct IndexTail<E> {
    entities: EntityStream<E>,
    list: ListEncoder,
    mapping: Arc<dyn Mapping<E>>,
    ctx: RequestContext,
}

impl<E: Send + 'static> IndexTail<E> {
    /// Streams the remaining elements, then the list terminator.
    ///
    /// Any failure ends the list early; the status is already sent. The
    /// entity stream is dropped as soon as the list closes.
    fn into_stream(self) -> impl futures_util::Stream<Item = Result<Bytes, BoxError>> + Send {
        stream::unfold(Some(self), |state| async move {
            let mut state = state?;
            let chunk = match state.next_element().await {
                Some(chunk) => return Some((Ok::<Bytes, BoxError>(chunk), Some(state))),
                None => state.list.finish(),
            };
            Some((Ok::<Bytes, BoxError>(chunk), None))
        })
    }

    /// Encodes the next element, or returns `None` once the list must close.
    async fn next_element(&mut self) -> Option<Bytes> {
        let written = self.list.written();
        let entity = match AssertUnwindSafe(self.entities.next()).catch_unwind().await {
            Ok(Some(Ok(entity))) => entity,
            Ok(Some(Err(err))) => {
                tracing::warn!(error = %err, written, "index stream failed, closing list");
                return None;
            }
            Ok(None) => return None,
            Err(panic) => {
                tracing::error!(
                    panic = panic_message(&*panic),
                    written,
                    "index stream panicked, closing list"
                );
                return None;
            }
        };

        let (mapping, ctx, list) = (&self.mapping, &self.ctx, &mut self.list);
        match std::panic::catch_unwind(AssertUnwindSafe(|| {
            mapping.encode_item(ctx, entity, list)
        })) {
            Ok(Ok(chunk)) => Some(chunk),
            Ok(Err(err)) => {
                tracing::warn!(
                    error = %err,
                    written,
                    "failed to encode index element, closing list"
                );
                None
            }
            Err(panic) => {
                tracing::error!(
                    panic = panic_message(&*panic),
                    written,
                    "index element encoding panicked, closing list"
                );
                None
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl<E, ID> Handler for Resource<E, ID>
where
    E: Send + 'static,
    ID: Clone + Send + Sync + 'static,
{
    fn call<'a>(&'a self, request: Request) -> BoxFuture<'a, Response> {
        let method = request.method().clone();
        let uri = request.uri().clone();
        Box::pin(async move {
            match AssertUnwindSafe(self.dispatch(request)).catch_unwind().await {
                Ok(response) => response,
                Err(panic) => {
                    tracing::error!(
                        method = %method,
                        path = %uri.path(),
                        panic = panic_message(&*panic),
                        "resource handler panicked"
                    );
                    let mut request = http::Request::new(());
                    *request.method_mut() = method;
                    *request.uri_mut() = uri;
                    let (parts, ()) = request.into_parts();
                    self.errors.handle_error(&parts, &RestError::internal())
                }
            }
        })
    }
}

impl<E, ID> fmt::Debug for Resource<E, ID> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("entity", &type_name::<E>())
            .field("id", &type_name::<ID>())
            .field("index", &self.index.is_some())
            .field("create", &self.create.is_some())
            .field("show", &self.show.is_some())
            .field("update", &self.update.is_some())
            .field("destroy", &self.destroy.is_some())
            .field("destroy_all", &self.destroy_all.is_some())
            .field("sub_routes", &self.sub_routes.is_some())
            .field("id_key", &self.id_key)
            .field("body_limit", &self.body_limit)
            .finish_non_exhaustive()
    }
}
