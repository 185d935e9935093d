//! Query string parameters for the resource endpoints.

use serde::Deserialize;

use catalog_core::defaults::EXPAND_TAGS;

/// `?expand=` on single-resource reads.
#[derive(Debug, Default, Deserialize)]
pub struct ExpandQuery {
    pub expand: Option<String>,
}

impl ExpandQuery {
    pub fn expand_tags(&self) -> bool {
        wants_tags(self.expand.as_deref())
    }
}

/// `?expand=&tags=` on the collection endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListResourcesQuery {
    pub expand: Option<String>,
    /// Comma-separated labels; a resource matches when it has any of them.
    pub tags: Option<String>,
}

impl ListResourcesQuery {
    pub fn expand_tags(&self) -> bool {
        wants_tags(self.expand.as_deref())
    }

    pub fn tag_filters(&self) -> Vec<String> {
        parse_csv(self.tags.as_deref())
    }
}

/// Split a comma-separated parameter, trimming entries and dropping empty ones.
pub fn parse_csv(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// True when the `expand` list names `tags`, in any letter case.
pub fn wants_tags(expand: Option<&str>) -> bool {
    parse_csv(expand)
        .iter()
        .any(|token| token.eq_ignore_ascii_case(EXPAND_TAGS))
}
