//! Resource repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use catalog_core::{
    ListResourcesRequest, NewResource, Resource, ResourceChanges, ResourceRepository, Result,
    TagChange,
};

use crate::map_db_error;
use crate::tags::{associate_tags, clear_associations, load_tags_for, reconcile_tags};

const RESOURCE_COLUMNS: &str = "id, name, description, created_at";

/// PostgreSQL implementation of ResourceRepository.
#[derive(Clone)]
pub struct PgResourceRepository {
    pool: Pool<Postgres>,
}

impl PgResourceRepository {
    /// Create a new PgResourceRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceRepository for PgResourceRepository {
    async fn insert(&self, resource: NewResource) -> Result<Resource> {
        let start = Instant::now();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let tags = reconcile_tags(&mut *tx, &resource.tag_labels).await?;

        let mut stored = sqlx::query_as::<_, Resource>(&format!(
            "INSERT INTO resource (id, name, description, created_at) VALUES ($1, $2, $3, $4) RETURNING {}",
            RESOURCE_COLUMNS
        ))
        .bind(resource.id)
        .bind(&resource.name)
        .bind(&resource.description)
        .bind(resource.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        associate_tags(&mut *tx, stored.id, &tags).await?;
        tx.commit().await.map_err(map_db_error)?;

        let mut tags = tags;
        tags.sort_by(|a, b| a.label.cmp(&b.label));
        stored.tags = tags;

        debug!(
            subsystem = "database",
            component = "resources",
            op = "insert",
            resource_id = %stored.id,
            tag_count = stored.tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resource inserted"
        );
        Ok(stored)
    }

    async fn fetch(&self, id: Uuid, include_tags: bool) -> Result<Option<Resource>> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {} FROM resource WHERE id = $1",
            RESOURCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        let Some(mut resource) = resource else {
            return Ok(None);
        };

        if include_tags {
            resource.tags = load_tags_for(&self.pool, &[id])
                .await?
                .remove(&id)
                .unwrap_or_default();
        }
        Ok(Some(resource))
    }

    async fn list(&self, req: ListResourcesRequest) -> Result<Vec<Resource>> {
        let start = Instant::now();

        let sql = if req.tag_filters.is_empty() {
            format!(
                "SELECT {} FROM resource r ORDER BY r.created_at DESC, r.id DESC",
                RESOURCE_COLUMNS
            )
        } else {
            format!(
                r#"
                SELECT {} FROM resource r
                WHERE EXISTS (
                    SELECT 1 FROM resource_tag rt
                    JOIN tag t ON t.id = rt.tag_id
                    WHERE rt.resource_id = r.id AND t.label = ANY($1)
                )
                ORDER BY r.created_at DESC, r.id DESC
                "#,
                RESOURCE_COLUMNS
            )
        };

        let mut query = sqlx::query_as::<_, Resource>(&sql);
        if !req.tag_filters.is_empty() {
            query = query.bind(&req.tag_filters);
        }
        let mut resources = query.fetch_all(&self.pool).await.map_err(map_db_error)?;

        if req.include_tags {
            let ids: Vec<Uuid> = resources.iter().map(|r| r.id).collect();
            let mut tags = load_tags_for(&self.pool, &ids).await?;
            for resource in &mut resources {
                resource.tags = tags.remove(&resource.id).unwrap_or_default();
            }
        }

        debug!(
            subsystem = "database",
            component = "resources",
            op = "list",
            include_tags = req.include_tags,
            filter_count = req.tag_filters.len(),
            result_count = resources.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resources listed"
        );
        Ok(resources)
    }

    async fn update(&self, id: Uuid, changes: ResourceChanges) -> Result<Option<Resource>> {
        let start = Instant::now();
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let updated = sqlx::query_as::<_, Resource>(&format!(
            "UPDATE resource SET name = $2, description = $3 WHERE id = $1 RETURNING {}",
            RESOURCE_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?;

        // Dropping the transaction rolls it back.
        let Some(mut resource) = updated else {
            return Ok(None);
        };

        match &changes.tags {
            TagChange::Keep => {}
            TagChange::Clear => {
                clear_associations(&mut *tx, id).await?;
            }
            TagChange::Replace(labels) => {
                clear_associations(&mut *tx, id).await?;
                let tags = reconcile_tags(&mut *tx, labels).await?;
                associate_tags(&mut *tx, id, &tags).await?;
            }
        }

        resource.tags = load_tags_for(&mut *tx, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        tx.commit().await.map_err(map_db_error)?;

        debug!(
            subsystem = "database",
            component = "resources",
            op = "update",
            resource_id = %id,
            tag_count = resource.tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Resource updated"
        );
        Ok(Some(resource))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        // resource_tag rows go with the resource (ON DELETE CASCADE); tags stay.
        let result = sqlx::query("DELETE FROM resource WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        let deleted = result.rows_affected() > 0;
        debug!(
            subsystem = "database",
            component = "resources",
            op = "delete",
            resource_id = %id,
            deleted,
            "Resource delete executed"
        );
        Ok(deleted)
    }
}
