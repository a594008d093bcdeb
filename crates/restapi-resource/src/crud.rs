//! Wiring resource operations to a repository.

use crate::context::RequestContext;
use crate::repository::{ExternalId, Repository, RepositoryError};
use crate::resource::Resource;
use std::sync::Arc;

fn withdrawn(capability: &str) -> RepositoryError {
    RepositoryError::Other(anyhow::anyhow!(
        "repository no longer provides the {capability} capability"
    ))
}

impl<E, ID> Resource<E, ID>
where
    E: ExternalId<ID> + Send + 'static,
    ID: Clone + Send + Sync + 'static,
{
    /// Fills every unset operation the repository has a capability for.
    ///
    /// | Operation | Capability |
    /// |-----------|------------|
    /// | index | [`AllFinder`](crate::AllFinder) |
    /// | create | [`Creator`](crate::Creator) |
    /// | show | [`ByIdFinder`](crate::ByIdFinder) |
    /// | update | [`Updater`](crate::Updater) |
    /// | destroy | [`ByIdDeleter`](crate::ByIdDeleter) |
    /// | destroy_all | [`AllDeleter`](crate::AllDeleter) |
    ///
    /// Operations set before this call are kept. The update operation
    /// assigns the path ID to the decoded entity with
    /// [`ExternalId::set_external_id`] and then calls the updater; the
    /// resource checks that the ID exists through `show` beforehand.
    #[must_use]
    pub fn with_crud<R: Repository<E, ID>>(self, repository: R) -> Self {
        let repo = Arc::new(repository);
        let mut resource = self;

        if resource.index.is_none() && repo.all_finder().is_some() {
            let repo = Arc::clone(&repo);
            resource = resource.index(move |ctx: RequestContext| {
                let repo = Arc::clone(&repo);
                async move {
                    let finder = repo.all_finder().ok_or_else(|| withdrawn("find-all"))?;
                    finder.find_all(&ctx, ctx.query()).await
                }
            });
        }

        if resource.create.is_none() && repo.creator().is_some() {
            let repo = Arc::clone(&repo);
            resource = resource.create(move |ctx: RequestContext, entity: E| {
                let repo = Arc::clone(&repo);
                async move {
                    let creator = repo.creator().ok_or_else(|| withdrawn("create"))?;
                    creator.create(&ctx, entity).await
                }
            });
        }

        if resource.show.is_none() && repo.by_id_finder().is_some() {
            let repo = Arc::clone(&repo);
            resource = resource.show(move |ctx: RequestContext, id: ID| {
                let repo = Arc::clone(&repo);
                async move {
                    let finder = repo.by_id_finder().ok_or_else(|| withdrawn("find-by-id"))?;
                    finder.find_by_id(&ctx, &id).await
                }
            });
        }

        if resource.update.is_none() && repo.updater().is_some() {
            let repo = Arc::clone(&repo);
            resource = resource.update(move |ctx: RequestContext, id: ID, mut entity: E| {
                let repo = Arc::clone(&repo);
                async move {
                    entity.set_external_id(id);
                    let updater = repo.updater().ok_or_else(|| withdrawn("update"))?;
                    updater.update(&ctx, entity).await
                }
            });
        }

        if resource.destroy.is_none() && repo.by_id_deleter().is_some() {
            let repo = Arc::clone(&repo);
            resource = resource.destroy(move |ctx: RequestContext, id: ID| {
                let repo = Arc::clone(&repo);
                async move {
                    let deleter = repo
                        .by_id_deleter()
                        .ok_or_else(|| withdrawn("delete-by-id"))?;
                    deleter.delete_by_id(&ctx, &id).await
                }
            });
        }

        if resource.destroy_all.is_none() && repo.all_deleter().is_some() {
            let repo = Arc::clone(&repo);
            resource = resource.destroy_all(move |ctx: RequestContext, query: String| {
                let repo = Arc::clone(&repo);
                async move {
                    let deleter = repo.all_deleter().ok_or_else(|| withdrawn("delete-all"))?;
                    deleter.delete_all(&ctx, &query).await
                }
            });
        }

        tracing::debug!(resource = ?resource, "wired repository operations");
        resource
    }
}
