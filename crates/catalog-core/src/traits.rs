//! Storage abstraction for the catalog.
//!
//! The command and query handlers only talk to a [`ResourceRepository`], so
//! the PostgreSQL store and the in-memory store are interchangeable.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{ListResourcesRequest, NewResource, Resource, ResourceChanges};

/// Transactional persistence for resources and their tag associations.
///
/// Every mutating method is atomic: tag reconciliation, the resource write
/// and the association changes commit together or not at all. A lost race on
/// a unique label surfaces as `Error::Conflict`.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Insert a resource, reconciling and associating `tag_labels`.
    ///
    /// Returns the stored resource with its tags loaded.
    async fn insert(&self, resource: NewResource) -> Result<Resource>;

    /// Fetch a resource by id, loading tags only when `include_tags` is set.
    async fn fetch(&self, id: Uuid, include_tags: bool) -> Result<Option<Resource>>;

    /// List resources newest first, optionally filtered by tag label (OR).
    async fn list(&self, req: ListResourcesRequest) -> Result<Vec<Resource>>;

    /// Overwrite name and description and apply the tag change.
    ///
    /// Returns `None` without mutating anything when the id is unknown.
    async fn update(&self, id: Uuid, changes: ResourceChanges) -> Result<Option<Resource>>;

    /// Delete a resource and its associations. Tag records are kept.
    ///
    /// Returns `false` when the id is unknown.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}
