//! Entity to wire representation mapping.

use crate::models::{Resource, ResourceDto, Tag, TagDto};

impl From<&Tag> for TagDto {
    fn from(tag: &Tag) -> Self {
        TagDto {
            id: tag.id,
            label: tag.label.clone(),
        }
    }
}

impl Resource {
    /// Shape this resource for output.
    ///
    /// With `expand_tags` the `tags` field is always a list; without it the
    /// field is `None` and disappears from the serialized form.
    pub fn to_dto(&self, expand_tags: bool) -> ResourceDto {
        ResourceDto {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            created_at: self.created_at,
            tags: expand_tags.then(|| self.tags.iter().map(TagDto::from).collect()),
        }
    }
}
