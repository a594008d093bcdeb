//! In-memory repository for tests and prototypes.

use async_trait::async_trait;
use parking_lot::Mutex;
use restapi_resource::{
    entities, AllDeleter, AllFinder, ByIdDeleter, ByIdFinder, Creator, EntityStream, ExternalId,
    Repository, RepositoryError, RequestContext, Updater,
};
use serde::Serialize;
use std::sync::Arc;

type IdGenerator<ID> = Arc<dyn Fn(u64) -> ID + Send + Sync>;

struct State<E, ID> {
    entries: Vec<(ID, E)>,
    next: u64,
}

/// A repository keeping entities in insertion order in memory.
///
/// It supports every capability, so `Resource::with_crud` wires all six
/// operations. Queries for list and delete-all are `key=value` pairs
/// matched against the entity's serialized fields; an empty query
/// matches everything.
///
/// Clones share the same storage.
///
/// ```
/// use restapi_resource::ExternalId;
/// use restapi_test::MemoryRepository;
///
/// #[derive(Clone, serde::Serialize)]
/// struct Foo {
///     id: Option<u64>,
///     foo: i64,
/// }
///
/// impl ExternalId<u64> for Foo {
///     fn external_id(&self) -> Option<u64> {
///         self.id
///     }
///
///     fn set_external_id(&mut self, id: u64) {
///         self.id = Some(id);
///     }
/// }
///
/// let repo = MemoryRepository::<Foo, u64>::sequential();
/// let stored = repo.insert(Foo { id: None, foo: 1 });
/// assert_eq!(stored.id, Some(1));
/// assert_eq!(repo.len(), 1);
/// ```
pub struct MemoryRepository<E, ID> {
    state: Arc<Mutex<State<E, ID>>>,
    generator: IdGenerator<ID>,
}

impl<E, ID> Clone for MemoryRepository<E, ID> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<E, ID> std::fmt::Debug for MemoryRepository<E, ID> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRepository")
            .field("len", &self.state.lock().entries.len())
            .finish_non_exhaustive()
    }
}

impl<E> MemoryRepository<E, u64>
where
    E: ExternalId<u64> + Clone + Serialize + Send + Sync + 'static,
{
    /// Creates a repository assigning IDs 1, 2, 3, ...
    #[must_use]
    pub fn sequential() -> Self {
        Self::new(|n| n)
    }
}

impl<E, ID> MemoryRepository<E, ID>
where
    E: ExternalId<ID> + Clone + Serialize + Send + Sync + 'static,
    ID: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates an empty repository.
    ///
    /// `generator` turns a counter starting at 1 into the ID of an
    /// entity created without one.
    pub fn new(generator: impl Fn(u64) -> ID + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                entries: Vec::new(),
                next: 1,
            })),
            generator: Arc::new(generator),
        }
    }

    /// Stores `entity`, assigning an ID if it has none, and returns it.
    ///
    /// An entity with an existing ID replaces the stored one.
    pub fn insert(&self, mut entity: E) -> E {
        let mut state = self.state.lock();
        let id = match entity.external_id() {
            Some(id) => id,
            None => {
                let id = self.next_id(&mut state);
                entity.set_external_id(id.clone());
                id
            }
        };
        match state.entries.iter_mut().find(|(key, _)| *key == id) {
            Some(slot) => slot.1 = entity.clone(),
            None => state.entries.push((id, entity.clone())),
        }
        entity
    }

    /// Returns the number of stored entities.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the stored entities in insertion order.
    pub fn snapshot(&self) -> Vec<E> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|(_, entity)| entity.clone())
            .collect()
    }

    fn next_id(&self, state: &mut State<E, ID>) -> ID {
        loop {
            let id = (self.generator)(state.next);
            state.next += 1;
            if !state.entries.iter().any(|(key, _)| *key == id) {
                return id;
            }
        }
    }

    fn filter(query: &str) -> Result<impl Fn(&E) -> Result<bool, RepositoryError>, RepositoryError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| RepositoryError::Other(anyhow::Error::new(e).context("invalid query")))?;

        Ok(move |entity: &E| {
            if pairs.is_empty() {
                return Ok(true);
            }
            let value = serde_json::to_value(entity).map_err(anyhow::Error::new)?;
            Ok(pairs.iter().all(|(key, expected)| {
                value.get(key).is_some_and(|field| match field {
                    serde_json::Value::String(s) => s == expected,
                    other => other.to_string() == *expected,
                })
            }))
        })
    }
}

#[async_trait]
impl<E, ID> Creator<E> for MemoryRepository<E, ID>
where
    E: ExternalId<ID> + Clone + Serialize + Send + Sync + 'static,
    ID: Clone + PartialEq + Send + Sync + 'static,
{
    async fn create(&self, _ctx: &RequestContext, mut entity: E) -> Result<E, RepositoryError> {
        let mut state = self.state.lock();
        let id = match entity.external_id() {
            Some(id) if state.entries.iter().any(|(key, _)| *key == id) => {
                return Err(RepositoryError::AlreadyExists);
            }
            Some(id) => id,
            None => {
                let id = self.next_id(&mut state);
                entity.set_external_id(id.clone());
                id
            }
        };
        state.entries.push((id, entity.clone()));
        Ok(entity)
    }
}

#[async_trait]
impl<E, ID> AllFinder<E> for MemoryRepository<E, ID>
where
    E: ExternalId<ID> + Clone + Serialize + Send + Sync + 'static,
    ID: Clone + PartialEq + Send + Sync + 'static,
{
    async fn find_all(
        &self,
        _ctx: &RequestContext,
        query: &str,
    ) -> Result<EntityStream<E>, RepositoryError> {
        let matches = Self::filter(query)?;
        let mut found = Vec::new();
        for (_, entity) in &self.state.lock().entries {
            if matches(entity)? {
                found.push(entity.clone());
            }
        }
        Ok(entities(found))
    }
}

#[async_trait]
impl<E, ID> ByIdFinder<E, ID> for MemoryRepository<E, ID>
where
    E: ExternalId<ID> + Clone + Serialize + Send + Sync + 'static,
    ID: Clone + PartialEq + Send + Sync + 'static,
{
    async fn find_by_id(&self, _ctx: &RequestContext, id: &ID) -> Result<E, RepositoryError> {
        self.state
            .lock()
            .entries
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, entity)| entity.clone())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl<E, ID> Updater<E> for MemoryRepository<E, ID>
where
    E: ExternalId<ID> + Clone + Serialize + Send + Sync + 'static,
    ID: Clone + PartialEq + Send + Sync + 'static,
{
    async fn update(&self, _ctx: &RequestContext, entity: E) -> Result<(), RepositoryError> {
        let id = entity.external_id().ok_or(RepositoryError::NotFound)?;
        let mut state = self.state.lock();
        let slot = state
            .entries
            .iter_mut()
            .find(|(key, _)| *key == id)
            .ok_or(RepositoryError::NotFound)?;
        slot.1 = entity;
        Ok(())
    }
}

#[async_trait]
impl<E, ID> AllDeleter for MemoryRepository<E, ID>
where
    E: ExternalId<ID> + Clone + Serialize + Send + Sync + 'static,
    ID: Clone + PartialEq + Send + Sync + 'static,
{
    async fn delete_all(&self, _ctx: &RequestContext, query: &str) -> Result<(), RepositoryError> {
        let matches = Self::filter(query)?;
        let mut state = self.state.lock();
        let doomed = state
            .entries
            .iter()
            .map(|(_, entity)| matches(entity))
            .collect::<Result<Vec<_>, _>>()?;
        let mut doomed = doomed.into_iter();
        state.entries.retain(|_| !doomed.next().unwrap_or(false));
        Ok(())
    }
}

#[async_trait]
impl<E, ID> ByIdDeleter<ID> for MemoryRepository<E, ID>
where
    E: ExternalId<ID> + Clone + Serialize + Send + Sync + 'static,
    ID: Clone + PartialEq + Send + Sync + 'static,
{
    async fn delete_by_id(&self, _ctx: &RequestContext, id: &ID) -> Result<(), RepositoryError> {
        let mut state = self.state.lock();
        let index = state
            .entries
            .iter()
            .position(|(key, _)| key == id)
            .ok_or(RepositoryError::NotFound)?;
        state.entries.remove(index);
        Ok(())
    }
}

impl<E, ID> Repository<E, ID> for MemoryRepository<E, ID>
where
    E: ExternalId<ID> + Clone + Serialize + Send + Sync + 'static,
    ID: Clone + PartialEq + Send + Sync + 'static,
{
    fn creator(&self) -> Option<&dyn Creator<E>> {
        Some(self)
    }

    fn all_finder(&self) -> Option<&dyn AllFinder<E>> {
        Some(self)
    }

    fn by_id_finder(&self) -> Option<&dyn ByIdFinder<E, ID>> {
        Some(self)
    }

    fn updater(&self) -> Option<&dyn Updater<E>> {
        Some(self)
    }

    fn all_deleter(&self) -> Option<&dyn AllDeleter> {
        Some(self)
    }

    fn by_id_deleter(&self) -> Option<&dyn ByIdDeleter<ID>> {
        Some(self)
    }
}
