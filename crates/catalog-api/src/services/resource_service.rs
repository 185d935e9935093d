//! Resource command and query handlers.
//!
//! Every command runs the validation step first, then a single repository
//! call. A command that fails with a uniqueness conflict (two requests
//! creating the same new tag label at once) is retried up to
//! [`CONFLICT_RETRIES`] times; the repository rolled the failed attempt back,
//! so a retry starts from clean state and will see the winner's tag.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use catalog_core::defaults::CONFLICT_RETRIES;
use catalog_core::{
    ensure_valid, new_v7, CreateResourceRequest, DeleteResourceOutcome, GetResourceOutcome,
    ListResourcesRequest, NewResource, ResourceChanges, ResourceDto, ResourceRepository, Result,
    UpdateResourceOutcome, UpdateResourceRequest,
};

#[derive(Clone)]
pub struct ResourceService {
    repo: Arc<dyn ResourceRepository>,
}

impl ResourceService {
    pub fn new(repo: Arc<dyn ResourceRepository>) -> Self {
        Self { repo }
    }

    /// Create a resource. The returned representation never carries tags.
    pub async fn create(&self, req: CreateResourceRequest) -> Result<ResourceDto> {
        ensure_valid(&req)?;
        let start = Instant::now();

        let new = NewResource {
            id: new_v7(),
            name: req.name,
            description: req.description,
            created_at: Utc::now(),
            tag_labels: req.tags.unwrap_or_default(),
        };

        let created = retry_on_conflict("create", || self.repo.insert(new.clone())).await?;

        info!(
            subsystem = "api",
            component = "resources",
            op = "create",
            resource_id = %created.id,
            tag_count = created.tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resource created"
        );
        Ok(created.to_dto(false))
    }

    pub async fn get(&self, id: Uuid, expand_tags: bool) -> Result<GetResourceOutcome> {
        let outcome = match self.repo.fetch(id, expand_tags).await? {
            Some(resource) => GetResourceOutcome::Found(resource.to_dto(expand_tags)),
            None => GetResourceOutcome::NotFound,
        };
        debug!(
            subsystem = "api",
            component = "resources",
            op = "get",
            resource_id = %id,
            expand_tags,
            found = matches!(outcome, GetResourceOutcome::Found(_)),
            "Resource lookup"
        );
        Ok(outcome)
    }

    pub async fn list(&self, req: ListResourcesRequest) -> Result<Vec<ResourceDto>> {
        let expand_tags = req.include_tags;
        let resources = self.repo.list(req).await?;
        Ok(resources.iter().map(|r| r.to_dto(expand_tags)).collect())
    }

    /// Overwrite name and description and apply the tag change.
    ///
    /// Tags are not expanded in the result.
    pub async fn update(&self, id: Uuid, req: UpdateResourceRequest) -> Result<UpdateResourceOutcome> {
        ensure_valid(&req)?;
        let start = Instant::now();

        let changes = ResourceChanges {
            tags: req.tag_change(),
            name: req.name,
            description: req.description,
        };

        let updated = retry_on_conflict("update", || self.repo.update(id, changes.clone())).await?;

        let Some(resource) = updated else {
            debug!(
                subsystem = "api",
                component = "resources",
                op = "update",
                resource_id = %id,
                "Resource not found"
            );
            return Ok(UpdateResourceOutcome::NotFound);
        };

        info!(
            subsystem = "api",
            component = "resources",
            op = "update",
            resource_id = %id,
            tag_count = resource.tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resource updated"
        );
        Ok(UpdateResourceOutcome::Success(resource.to_dto(false)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<DeleteResourceOutcome> {
        let deleted = retry_on_conflict("delete", || self.repo.delete(id)).await?;
        if !deleted {
            return Ok(DeleteResourceOutcome::NotFound);
        }
        info!(
            subsystem = "api",
            component = "resources",
            op = "delete",
            resource_id = %id,
            "Resource deleted"
        );
        Ok(DeleteResourceOutcome::Success)
    }
}

async fn retry_on_conflict<T, F, Fut>(op: &'static str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut retries_left = CONFLICT_RETRIES;
    loop {
        match attempt().await {
            Err(err) if err.is_retryable() && retries_left > 0 => {
                retries_left -= 1;
                warn!(
                    subsystem = "api",
                    component = "resources",
                    op,
                    error = %err,
                    retries_left,
                    "Command conflicted, retrying"
                );
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{Error, TagChange};
    use catalog_db::MemoryResourceRepository;

    fn service() -> (ResourceService, MemoryResourceRepository) {
        let store = MemoryResourceRepository::new();
        (ResourceService::new(Arc::new(store.clone())), store)
    }

    fn create_req(name: &str, tags: Option<&[&str]>) -> CreateResourceRequest {
        CreateResourceRequest {
            name: name.to_string(),
            description: None,
            tags: tags.map(|t| t.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[tokio::test]
    async fn test_create_hides_tags_and_get_round_trips() {
        let (service, _) = service();
        let created = service
            .create(create_req("N", Some(&["react"][..])))
            .await
            .unwrap();
        assert!(created.tags.is_none());

        let GetResourceOutcome::Found(found) = service.get(created.id, true).await.unwrap() else {
            panic!("created resource should be found");
        };
        assert_eq!(found.name, "N");
        let tags = found.tags.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].label, "react");
    }

    #[tokio::test]
    async fn test_invalid_create_never_reaches_store() {
        let (service, store) = service();
        let err = service
            .create(create_req("N", Some(&["React", "React"][..])))
            .await
            .unwrap_err();
        let Error::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(!errors.messages("tags").is_empty());
        assert!(store.tags().await.is_empty());
    }

    #[tokio::test]
    async fn test_single_conflict_is_retried() {
        let (service, store) = service();
        store.fail_next_with_conflict(1);
        let created = service.create(create_req("N", Some(&["x"][..]))).await.unwrap();
        assert!(matches!(
            service.get(created.id, false).await.unwrap(),
            GetResourceOutcome::Found(_)
        ));
    }

    #[tokio::test]
    async fn test_repeated_conflict_surfaces() {
        let (service, store) = service();
        store.fail_next_with_conflict(CONFLICT_RETRIES + 1);
        let err = service.create(create_req("N", None)).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(service
            .list(ListResourcesRequest::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_outcomes() {
        let (service, _) = service();
        let missing = new_v7();

        let update = UpdateResourceRequest {
            name: "X".to_string(),
            description: None,
            tags: Some(vec!["t".to_string()]),
        };
        assert_eq!(
            service.update(missing, update.clone()).await.unwrap(),
            UpdateResourceOutcome::NotFound
        );
        assert_eq!(
            service.delete(missing).await.unwrap(),
            DeleteResourceOutcome::NotFound
        );

        let created = service.create(create_req("A", None)).await.unwrap();
        let UpdateResourceOutcome::Success(updated) =
            service.update(created.id, update).await.unwrap()
        else {
            panic!("update should succeed");
        };
        assert_eq!(updated.name, "X");
        assert!(updated.tags.is_none());
        assert_eq!(
            service.delete(created.id).await.unwrap(),
            DeleteResourceOutcome::Success
        );
    }

    #[test]
    fn test_update_request_tag_change() {
        let mut req = UpdateResourceRequest::default();
        assert_eq!(req.tag_change(), TagChange::Keep);
        req.tags = Some(Vec::new());
        assert_eq!(req.tag_change(), TagChange::Clear);
    }
}
