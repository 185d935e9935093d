//! Tag reconciliation planning.
//!
//! Given the labels a command asks for and the tags already stored under
//! those labels, decide which tag record each label resolves to and which
//! records have to be created. Storage backends call this after their single
//! lookup query and persist `created` in the same transaction as the
//! resource write.

use std::collections::{HashMap, HashSet};

use crate::models::Tag;
use crate::uuid_utils::new_v7;

/// Result of reconciling a set of labels against stored tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// One tag per distinct requested label, in request order.
    pub tags: Vec<Tag>,
    /// Tags minted for labels with no stored record. Subset of `tags`.
    pub created: Vec<Tag>,
}

impl ReconcilePlan {
    /// Labels that had no stored record.
    pub fn created_labels(&self) -> Vec<String> {
        self.created.iter().map(|t| t.label.clone()).collect()
    }
}

/// Resolve `labels` against `existing`, minting ids for missing labels.
///
/// Existing records always win: a label that is already stored resolves to
/// that record's id. Repeated labels resolve once. Matching is exact and
/// case-sensitive.
pub fn plan_reconciliation(labels: &[String], existing: Vec<Tag>) -> ReconcilePlan {
    let mut by_label: HashMap<String, Tag> = existing
        .into_iter()
        .map(|tag| (tag.label.clone(), tag))
        .collect();

    let mut seen = HashSet::with_capacity(labels.len());
    let mut plan = ReconcilePlan::default();

    for label in labels {
        if !seen.insert(label.as_str()) {
            continue;
        }
        match by_label.remove(label) {
            Some(tag) => plan.tags.push(tag),
            None => {
                let tag = Tag::new(new_v7(), label.clone());
                plan.created.push(tag.clone());
                plan.tags.push(tag);
            }
        }
    }

    tracing::trace!(
        subsystem = "core",
        component = "tag_reconciler",
        requested = labels.len(),
        reused = plan.tags.len() - plan.created.len(),
        created = plan.created.len(),
        "Planned tag reconciliation"
    );

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_all_new_labels_are_created() {
        let plan = plan_reconciliation(&labels(&["a", "b"]), vec![]);
        assert_eq!(plan.tags.len(), 2);
        assert_eq!(plan.created, plan.tags);
        assert_eq!(plan.created_labels(), labels(&["a", "b"]));
        assert_ne!(plan.tags[0].id, plan.tags[1].id);
    }

    #[test]
    fn test_existing_label_reuses_stored_id() {
        let stored = Tag::new(Uuid::new_v4(), "rust");
        let plan = plan_reconciliation(&labels(&["rust"]), vec![stored.clone()]);
        assert_eq!(plan.tags, vec![stored]);
        assert!(plan.created.is_empty());
    }

    #[test]
    fn test_mixed_existing_and_new_preserves_request_order() {
        let stored = Tag::new(Uuid::new_v4(), "b");
        let plan = plan_reconciliation(&labels(&["a", "b", "c"]), vec![stored.clone()]);
        let got: Vec<&str> = plan.tags.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(got, vec!["a", "b", "c"]);
        assert_eq!(plan.tags[1], stored);
        assert_eq!(plan.created_labels(), labels(&["a", "c"]));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let stored = Tag::new(Uuid::new_v4(), "React");
        let plan = plan_reconciliation(&labels(&["react"]), vec![stored]);
        assert_eq!(plan.created_labels(), labels(&["react"]));
    }

    #[test]
    fn test_repeated_label_resolves_once() {
        let plan = plan_reconciliation(&labels(&["x", "x"]), vec![]);
        assert_eq!(plan.tags.len(), 1);
        assert_eq!(plan.created.len(), 1);
    }

    #[test]
    fn test_unrequested_existing_tags_are_ignored() {
        let stored = Tag::new(Uuid::new_v4(), "other");
        let plan = plan_reconciliation(&labels(&["x"]), vec![stored]);
        assert_eq!(plan.tags.len(), 1);
        assert_eq!(plan.tags[0].label, "x");
    }

    #[test]
    fn test_empty_request_yields_empty_plan() {
        assert_eq!(plan_reconciliation(&[], vec![]), ReconcilePlan::default());
    }
}
