//! Tag reconciliation and tag loading against PostgreSQL.
//!
//! Reconciliation is an insert-or-fetch keyed on the unique `label` column:
//! one lookup for the requested labels, one `INSERT ... ON CONFLICT DO
//! NOTHING` for the missing ones, and a re-read only when a concurrent
//! transaction won the race for some label. Everything runs on the caller's
//! connection so it commits or rolls back with the resource write.

use std::collections::HashMap;

use sqlx::postgres::PgExecutor;
use sqlx::{PgConnection, Row};
use tracing::debug;
use uuid::Uuid;

use catalog_core::{plan_reconciliation, Error, Result, Tag};

use crate::map_db_error;

/// Fetch stored tags whose label is one of `labels`.
pub async fn find_by_labels<'e>(
    executor: impl PgExecutor<'e>,
    labels: &[String],
) -> Result<Vec<Tag>> {
    sqlx::query_as::<_, Tag>("SELECT id, label FROM tag WHERE label = ANY($1)")
        .bind(labels)
        .fetch_all(executor)
        .await
        .map_err(map_db_error)
}

/// Resolve `labels` to tag records, creating the ones that do not exist.
///
/// Returns one tag per distinct label in request order. Must be called inside
/// a transaction; nothing is committed here.
pub async fn reconcile_tags(conn: &mut PgConnection, labels: &[String]) -> Result<Vec<Tag>> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }

    let existing = find_by_labels(&mut *conn, labels).await?;
    let plan = plan_reconciliation(labels, existing);
    if plan.created.is_empty() {
        return Ok(plan.tags);
    }

    let (ids, new_labels) = insert_batch(&plan.created);
    let inserted = sqlx::query(
        r#"
        INSERT INTO tag (id, label)
        SELECT id, label FROM UNNEST($1::uuid[], $2::text[]) AS t(id, label)
        ORDER BY label COLLATE "C"
        ON CONFLICT (label) DO NOTHING
        "#,
    )
    .bind(&ids)
    .bind(&new_labels)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?
    .rows_affected();

    debug!(
        subsystem = "database",
        component = "tag_reconciler",
        op = "insert_missing",
        requested = labels.len(),
        missing = new_labels.len(),
        inserted,
        "Inserted missing tags"
    );

    if inserted as usize == new_labels.len() {
        return Ok(plan.tags);
    }

    // A concurrent transaction committed some of these labels first.
    let existing = find_by_labels(&mut *conn, labels).await?;
    let settled = plan_reconciliation(labels, existing);
    if !settled.created.is_empty() {
        return Err(Error::Conflict(format!(
            "Tag labels could not be reconciled: {}",
            settled.created_labels().join(", ")
        )));
    }
    Ok(settled.tags)
}

/// Column arrays for inserting `created`, ordered by label.
///
/// Every writer takes the label index entries in the same order, so two
/// transactions creating overlapping labels queue behind each other instead
/// of deadlocking.
fn insert_batch(created: &[Tag]) -> (Vec<Uuid>, Vec<String>) {
    let mut sorted: Vec<&Tag> = created.iter().collect();
    sorted.sort_by(|a, b| a.label.cmp(&b.label));
    sorted
        .into_iter()
        .map(|tag| (tag.id, tag.label.clone()))
        .unzip()
}

/// Link `tags` to a resource.
pub async fn associate_tags(conn: &mut PgConnection, resource_id: Uuid, tags: &[Tag]) -> Result<()> {
    if tags.is_empty() {
        return Ok(());
    }
    let tag_ids: Vec<Uuid> = tags.iter().map(|t| t.id).collect();
    sqlx::query(
        r#"
        INSERT INTO resource_tag (resource_id, tag_id)
        SELECT $1, UNNEST($2::uuid[])
        ON CONFLICT (resource_id, tag_id) DO NOTHING
        "#,
    )
    .bind(resource_id)
    .bind(&tag_ids)
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;
    Ok(())
}

/// Remove every tag association of a resource. Tag records are kept.
pub async fn clear_associations(conn: &mut PgConnection, resource_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM resource_tag WHERE resource_id = $1")
        .bind(resource_id)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;
    Ok(result.rows_affected())
}

/// Load tags for many resources in one query, keyed by resource id.
///
/// Tags are ordered by label. Resources without tags have no entry.
pub async fn load_tags_for<'e>(
    executor: impl PgExecutor<'e>,
    resource_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Tag>>> {
    if resource_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query(
        r#"
        SELECT rt.resource_id, t.id, t.label
        FROM resource_tag rt
        JOIN tag t ON t.id = rt.tag_id
        WHERE rt.resource_id = ANY($1)
        ORDER BY t.label
        "#,
    )
    .bind(resource_ids)
    .fetch_all(executor)
    .await
    .map_err(map_db_error)?;

    let mut by_resource: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for row in rows {
        by_resource
            .entry(row.get("resource_id"))
            .or_default()
            .push(Tag {
                id: row.get("id"),
                label: row.get("label"),
            });
    }
    Ok(by_resource)
}
