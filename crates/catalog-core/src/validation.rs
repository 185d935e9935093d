//! Declarative validation rules for resource commands.
//!
//! Every mutating command implements [`Validate`]; callers run
//! [`ensure_valid`] before touching the datastore so that a rejected command
//! never reaches a handler. Violations are aggregated per field rather than
//! reported one at a time.
//!
//! | Field         | Rule                                                  |
//! |---------------|-------------------------------------------------------|
//! | `name`        | non-empty after trimming, at most 200 characters      |
//! | `description` | when present, at most 2000 characters                 |
//! | `tags`        | at most 10 entries, no duplicate labels               |
//! | `tags[i]`     | non-empty after trimming, at most 50 characters       |

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::defaults::{
    MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS, MAX_TAGS_PER_RESOURCE, MAX_TAG_LABEL_CHARS,
};
use crate::error::{Error, Result};

/// Field name to messages map produced by a failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation against `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for `field`, empty when the field passed.
    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A command that can check its own input.
pub trait Validate {
    /// Collect every rule violation. An empty result means the command is valid.
    fn validate(&self) -> ValidationErrors;
}

/// Run the validation step for a command.
///
/// Returns `Error::Validation` carrying all violations when any rule fails.
pub fn ensure_valid<T: Validate + ?Sized>(command: &T) -> Result<()> {
    let errors = command.validate();
    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(
            subsystem = "core",
            component = "validation",
            fields = %errors.fields().collect::<Vec<_>>().join(","),
            "Command rejected by validation"
        );
        Err(Error::Validation(errors))
    }
}

// =============================================================================
// FIELD RULES
// =============================================================================

/// `name`: required, non-blank, bounded length.
pub fn check_name(errors: &mut ValidationErrors, name: &str) {
    if name.trim().is_empty() {
        errors.add("name", "'Name' must not be empty.");
    }
    let len = name.chars().count();
    if len > MAX_NAME_CHARS {
        errors.add(
            "name",
            format!(
                "The length of 'Name' must be {} characters or fewer. You entered {} characters.",
                MAX_NAME_CHARS, len
            ),
        );
    }
}

/// `description`: optional, bounded length when present.
pub fn check_description(errors: &mut ValidationErrors, description: Option<&str>) {
    let Some(description) = description else {
        return;
    };
    let len = description.chars().count();
    if len > MAX_DESCRIPTION_CHARS {
        errors.add(
            "description",
            format!(
                "The length of 'Description' must be {} characters or fewer. You entered {} characters.",
                MAX_DESCRIPTION_CHARS, len
            ),
        );
    }
}

/// `tags`: optional list of labels.
///
/// Per-entry violations are keyed `tags[i]`; list-level violations (count,
/// duplicates) are keyed `tags`.
pub fn check_tags(errors: &mut ValidationErrors, tags: Option<&[String]>) {
    let Some(tags) = tags else {
        return;
    };

    if tags.len() > MAX_TAGS_PER_RESOURCE {
        errors.add(
            "tags",
            format!(
                "A resource can have a maximum of {} tags.",
                MAX_TAGS_PER_RESOURCE
            ),
        );
    }

    for (i, label) in tags.iter().enumerate() {
        let field = format!("tags[{}]", i);
        if label.trim().is_empty() {
            errors.add(field.clone(), "Tag label cannot be empty or whitespace.");
        }
        if label.chars().count() > MAX_TAG_LABEL_CHARS {
            errors.add(
                field,
                format!(
                    "Tag label cannot exceed {} characters.",
                    MAX_TAG_LABEL_CHARS
                ),
            );
        }
    }

    let mut seen = HashSet::with_capacity(tags.len());
    if !tags.iter().all(|label| seen.insert(label.as_str())) {
        errors.add("tags", "Duplicate tag labels are not allowed.");
    }
}
