//! In-memory resource store.
//!
//! Implements [`ResourceRepository`] over process-local maps so the service
//! can run without PostgreSQL and so handler tests get a real datastore with
//! the same invariants: labels are unique, tags outlive resources, and every
//! command applies in a single critical section.
//!
//! ## Usage
//!
//! ```rust
//! use catalog_db::MemoryResourceRepository;
//!
//! let store = MemoryResourceRepository::new();
//! let handle = store.clone();
//! handle.fail_next_with_conflict(1);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use catalog_core::{
    plan_reconciliation, Error, ListResourcesRequest, NewResource, Resource, ResourceChanges,
    ResourceRepository, Result, Tag, TagChange,
};

#[derive(Debug, Default)]
struct MemoryState {
    /// Resources with their tags always attached.
    resources: HashMap<Uuid, Resource>,
    /// Every tag ever created, keyed by its unique label.
    tags: HashMap<String, Tag>,
}

impl MemoryState {
    fn reconcile(&mut self, labels: &[String]) -> Vec<Tag> {
        let existing = labels
            .iter()
            .filter_map(|label| self.tags.get(label).cloned())
            .collect();
        let plan = plan_reconciliation(labels, existing);
        for tag in plan.created {
            self.tags.insert(tag.label.clone(), tag);
        }
        let mut tags = plan.tags;
        tags.sort_by(|a, b| a.label.cmp(&b.label));
        tags
    }
}

/// Process-local implementation of ResourceRepository.
#[derive(Clone, Default)]
pub struct MemoryResourceRepository {
    state: Arc<Mutex<MemoryState>>,
    injected_conflicts: Arc<AtomicUsize>,
}

impl MemoryResourceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` mutating calls fail with `Error::Conflict`
    /// before touching any state.
    pub fn fail_next_with_conflict(&self, count: usize) {
        self.injected_conflicts.store(count, Ordering::SeqCst);
    }

    /// All stored tags, ordered by label.
    pub async fn tags(&self) -> Vec<Tag> {
        let state = self.state.lock().await;
        let mut tags: Vec<Tag> = state.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.label.cmp(&b.label));
        tags
    }

    fn take_injected_conflict(&self) -> Result<()> {
        let taken = self
            .injected_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match taken {
            Ok(_) => Err(Error::Conflict("Injected conflict".to_string())),
            Err(_) => Ok(()),
        }
    }
}

fn shaped(resource: &Resource, include_tags: bool) -> Resource {
    let mut out = resource.clone();
    if !include_tags {
        out.tags.clear();
    }
    out
}

#[async_trait]
impl ResourceRepository for MemoryResourceRepository {
    async fn insert(&self, resource: NewResource) -> Result<Resource> {
        self.take_injected_conflict()?;
        let mut state = self.state.lock().await;

        if state.resources.contains_key(&resource.id) {
            return Err(Error::Conflict(format!(
                "Resource {} already exists",
                resource.id
            )));
        }

        let tags = state.reconcile(&resource.tag_labels);
        let stored = Resource {
            id: resource.id,
            name: resource.name,
            description: resource.description,
            created_at: resource.created_at,
            tags,
        };
        state.resources.insert(stored.id, stored.clone());

        debug!(
            subsystem = "memory",
            component = "resources",
            op = "insert",
            resource_id = %stored.id,
            tag_count = stored.tags.len(),
            "Resource inserted"
        );
        Ok(stored)
    }

    async fn fetch(&self, id: Uuid, include_tags: bool) -> Result<Option<Resource>> {
        let state = self.state.lock().await;
        Ok(state
            .resources
            .get(&id)
            .map(|resource| shaped(resource, include_tags)))
    }

    async fn list(&self, req: ListResourcesRequest) -> Result<Vec<Resource>> {
        let state = self.state.lock().await;
        let mut resources: Vec<Resource> = state
            .resources
            .values()
            .filter(|resource| {
                req.tag_filters.is_empty()
                    || resource
                        .tags
                        .iter()
                        .any(|tag| req.tag_filters.contains(&tag.label))
            })
            .map(|resource| shaped(resource, req.include_tags))
            .collect();
        resources.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(resources)
    }

    async fn update(&self, id: Uuid, changes: ResourceChanges) -> Result<Option<Resource>> {
        self.take_injected_conflict()?;
        let mut state = self.state.lock().await;

        if !state.resources.contains_key(&id) {
            return Ok(None);
        }

        let new_tags = match &changes.tags {
            TagChange::Keep => None,
            TagChange::Clear => Some(Vec::new()),
            TagChange::Replace(labels) => Some(state.reconcile(labels)),
        };

        let Some(resource) = state.resources.get_mut(&id) else {
            return Ok(None);
        };
        resource.name = changes.name;
        resource.description = changes.description;
        if let Some(tags) = new_tags {
            resource.tags = tags;
        }

        debug!(
            subsystem = "memory",
            component = "resources",
            op = "update",
            resource_id = %id,
            tag_count = resource.tags.len(),
            "Resource updated"
        );
        Ok(Some(resource.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.take_injected_conflict()?;
        let mut state = self.state.lock().await;
        Ok(state.resources.remove(&id).is_some())
    }
}
