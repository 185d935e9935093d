//! PostgreSQL resource repository integration tests.
//!
//! Run with: `DATABASE_URL=... cargo test -p catalog-db -- --ignored`

use catalog_db::test_fixtures::{new_resource, unique_label, TestDatabase};
use catalog_db::{ListResourcesRequest, ResourceChanges, ResourceRepository, TagChange};

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_insert_reuses_existing_tags() {
    let test_db = TestDatabase::new().await;
    let repo = &test_db.db.resources;
    let shared = unique_label("shared");
    let only_b = unique_label("only-b");

    let a = repo
        .insert(new_resource("A", &[shared.clone()]))
        .await
        .unwrap();
    let b = repo
        .insert(new_resource("B", &[shared.clone(), only_b.clone()]))
        .await
        .unwrap();

    let shared_in_b = b.tags.iter().find(|t| t.label == shared).unwrap();
    assert_eq!(a.tags[0].id, shared_in_b.id);
    assert_eq!(test_db.count_tags_with_label(&shared).await, 1);
    assert_eq!(test_db.count_tags_with_label(&only_b).await, 1);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_fetch_with_and_without_tags() {
    let test_db = TestDatabase::new().await;
    let repo = &test_db.db.resources;
    let label = unique_label("fetch");

    let created = repo.insert(new_resource("A", &[label.clone()])).await.unwrap();

    let plain = repo.fetch(created.id, false).await.unwrap().unwrap();
    assert!(plain.tags.is_empty());
    assert_eq!(plain.name, "A");

    let full = repo.fetch(created.id, true).await.unwrap().unwrap();
    assert_eq!(full.tags.len(), 1);
    assert_eq!(full.tags[0].label, label);

    assert!(repo.fetch(catalog_db::new_v7(), true).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_keep_replace_clear() {
    let test_db = TestDatabase::new().await;
    let repo = &test_db.db.resources;
    let x = unique_label("x");
    let y = unique_label("y");

    let created = repo.insert(new_resource("A", &[x.clone()])).await.unwrap();

    let kept = repo
        .update(
            created.id,
            ResourceChanges {
                name: "A1".to_string(),
                description: Some("d".to_string()),
                tags: TagChange::Keep,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.name, "A1");
    assert_eq!(kept.description.as_deref(), Some("d"));
    assert_eq!(kept.tags.len(), 1);

    let replaced = repo
        .update(
            created.id,
            ResourceChanges {
                name: "A2".to_string(),
                description: None,
                tags: TagChange::Replace(vec![y.clone()]),
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.tags.len(), 1);
    assert_eq!(replaced.tags[0].label, y);
    assert!(replaced.description.is_none());

    let cleared = repo
        .update(
            created.id,
            ResourceChanges {
                name: "A3".to_string(),
                description: None,
                tags: TagChange::Clear,
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(cleared.tags.is_empty());

    // Disassociated tags are not deleted.
    assert_eq!(test_db.count_tags_with_label(&x).await, 1);
    assert_eq!(test_db.count_tags_with_label(&y).await, 1);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_update_missing_resource_creates_no_tags() {
    let test_db = TestDatabase::new().await;
    let label = unique_label("ghost");

    let result = test_db
        .db
        .resources
        .update(
            catalog_db::new_v7(),
            ResourceChanges {
                name: "X".to_string(),
                description: None,
                tags: TagChange::Replace(vec![label.clone()]),
            },
        )
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(test_db.count_tags_with_label(&label).await, 0);
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_list_filter_matches_any_label() {
    let test_db = TestDatabase::new().await;
    let repo = &test_db.db.resources;
    let a = unique_label("a");
    let b = unique_label("b");

    let first = repo.insert(new_resource("first", &[a.clone()])).await.unwrap();
    let second = repo.insert(new_resource("second", &[b.clone()])).await.unwrap();
    repo.insert(new_resource("untagged", &[])).await.unwrap();

    let listed = repo
        .list(ListResourcesRequest {
            include_tags: true,
            tag_filters: vec![a.clone(), b.clone()],
        })
        .await
        .unwrap();

    let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(listed.iter().all(|r| r.tags.len() == 1));
}

#[tokio::test]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_delete_keeps_tags() {
    let test_db = TestDatabase::new().await;
    let repo = &test_db.db.resources;
    let label = unique_label("keep");

    let created = repo.insert(new_resource("A", &[label.clone()])).await.unwrap();
    assert!(repo.delete(created.id).await.unwrap());
    assert!(!repo.delete(created.id).await.unwrap());
    assert!(repo.fetch(created.id, false).await.unwrap().is_none());
    assert_eq!(test_db.count_tags_with_label(&label).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Requires DATABASE_URL with migrated database
async fn test_concurrent_inserts_share_one_tag() {
    let test_db = TestDatabase::new().await;
    let label = unique_label("race");

    let mut handles = Vec::new();
    for i in 0..8 {
        let repo = test_db.db.resources.clone();
        let labels = vec![label.clone()];
        handles.push(tokio::spawn(async move {
            repo.insert(new_resource(&format!("R{}", i), &labels)).await
        }));
    }

    let mut tag_ids = Vec::new();
    for handle in handles {
        // A losing transaction may surface as a conflict; the service retries those.
        if let Ok(resource) = handle.await.unwrap() {
            tag_ids.push(resource.tags[0].id);
        }
    }

    assert!(!tag_ids.is_empty());
    assert!(tag_ids.iter().all(|id| *id == tag_ids[0]));
    assert_eq!(test_db.count_tags_with_label(&label).await, 1);
}
