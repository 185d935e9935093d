//! Domain models, commands, wire representations and outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{check_description, check_name, check_tags, Validate, ValidationErrors};

// =============================================================================
// ENTITIES
// =============================================================================

/// A reusable label. Labels are unique across the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub label: String,
}

impl Tag {
    pub fn new(id: Uuid, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// A persisted catalog resource.
///
/// `tags` is only populated when the read asked for tags; otherwise it is
/// empty and the mapping layer omits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub tags: Vec<Tag>,
}

// =============================================================================
// COMMANDS
// =============================================================================

/// Body of a create command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateResourceRequest {
    /// Missing names deserialize as empty and are rejected by validation.
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl Validate for CreateResourceRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &self.name);
        check_description(&mut errors, self.description.as_deref());
        check_tags(&mut errors, self.tags.as_deref());
        errors
    }
}

/// Body of an update command.
///
/// `tags: None` (field omitted or null) leaves associations untouched,
/// `Some(vec![])` clears them, anything else replaces them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateResourceRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateResourceRequest {
    pub fn tag_change(&self) -> TagChange {
        TagChange::from(self.tags.clone())
    }
}

impl Validate for UpdateResourceRequest {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, &self.name);
        check_description(&mut errors, self.description.as_deref());
        check_tags(&mut errors, self.tags.as_deref());
        errors
    }
}

/// What an update does to a resource's tag associations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagChange {
    /// Field omitted: keep current associations.
    Keep,
    /// Empty list: drop every association.
    Clear,
    /// Non-empty list: associations become exactly these labels.
    Replace(Vec<String>),
}

impl From<Option<Vec<String>>> for TagChange {
    fn from(tags: Option<Vec<String>>) -> Self {
        match tags {
            None => TagChange::Keep,
            Some(labels) if labels.is_empty() => TagChange::Clear,
            Some(labels) => TagChange::Replace(labels),
        }
    }
}

/// A fully-formed resource ready to be written.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Labels to reconcile and associate; empty for an untagged resource.
    pub tag_labels: Vec<String>,
}

/// Field replacements applied by an update.
#[derive(Debug, Clone)]
pub struct ResourceChanges {
    pub name: String,
    pub description: Option<String>,
    pub tags: TagChange,
}

/// Parameters for listing resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListResourcesRequest {
    /// Load tag associations for every returned resource.
    pub include_tags: bool,
    /// Keep resources carrying any of these labels. Empty means no filter.
    pub tag_filters: Vec<String>,
}

// =============================================================================
// WIRE REPRESENTATIONS
// =============================================================================

/// Tag as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDto {
    pub id: Uuid,
    pub label: String,
}

/// Resource as returned to clients.
///
/// `tags` is absent unless expansion was requested; when requested it is
/// always a list, possibly empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagDto>>,
}

// =============================================================================
// OUTCOMES
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum GetResourceOutcome {
    Found(ResourceDto),
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateResourceOutcome {
    Success(ResourceDto),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteResourceOutcome {
    Success,
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_change_from_option() {
        assert_eq!(TagChange::from(None), TagChange::Keep);
        assert_eq!(TagChange::from(Some(vec![])), TagChange::Clear);
        assert_eq!(
            TagChange::from(Some(vec!["a".to_string(), "b".to_string()])),
            TagChange::Replace(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_update_body_distinguishes_absent_null_and_empty_tags() {
        let absent: UpdateResourceRequest = serde_json::from_str(r#"{"name":"n"}"#).unwrap();
        assert_eq!(absent.tag_change(), TagChange::Keep);

        let null: UpdateResourceRequest =
            serde_json::from_str(r#"{"name":"n","tags":null}"#).unwrap();
        assert_eq!(null.tag_change(), TagChange::Keep);

        let empty: UpdateResourceRequest =
            serde_json::from_str(r#"{"name":"n","tags":[]}"#).unwrap();
        assert_eq!(empty.tag_change(), TagChange::Clear);

        let some: UpdateResourceRequest =
            serde_json::from_str(r#"{"name":"n","tags":["a"]}"#).unwrap();
        assert_eq!(some.tag_change(), TagChange::Replace(vec!["a".to_string()]));
    }

    #[test]
    fn test_missing_name_deserializes_empty_and_fails_validation() {
        let req: CreateResourceRequest = serde_json::from_str(r#"{"tags":["x"]}"#).unwrap();
        assert_eq!(req.name, "");
        let errors = req.validate();
        assert_eq!(errors.messages("name"), ["'Name' must not be empty."]);
    }

    #[test]
    fn test_create_request_collects_all_field_errors() {
        let req = CreateResourceRequest {
            name: " ".to_string(),
            description: Some("d".repeat(2001)),
            tags: Some(vec!["React".to_string(), "React".to_string()]),
        };
        let errors = req.validate();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["description", "name", "tags"]);
    }

    #[test]
    fn test_update_request_uses_same_rules() {
        let req = UpdateResourceRequest {
            name: "ok".to_string(),
            description: None,
            tags: Some((0..11).map(|i| i.to_string()).collect()),
        };
        assert_eq!(
            req.validate().messages("tags"),
            ["A resource can have a maximum of 10 tags."]
        );
    }

    #[test]
    fn test_dto_omits_tags_when_not_expanded() {
        let dto = ResourceDto {
            id: Uuid::nil(),
            name: "n".to_string(),
            description: None,
            created_at: Utc::now(),
            tags: None,
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("tags").is_none());
        assert!(json.get("description").unwrap().is_null());
    }

    #[test]
    fn test_dto_keeps_empty_tag_list_when_expanded() {
        let dto = ResourceDto {
            id: Uuid::nil(),
            name: "n".to_string(),
            description: None,
            created_at: Utc::now(),
            tags: Some(vec![]),
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["tags"], serde_json::json!([]));
    }
}
