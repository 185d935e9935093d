//! Centralized limits and default constants for the resource catalog.
//!
//! Validation rules, the database schema and the HTTP layer all reference
//! these values instead of repeating magic numbers.

// =============================================================================
// RESOURCE LIMITS
// =============================================================================

/// Maximum characters in a resource name.
pub const MAX_NAME_CHARS: usize = 200;

/// Maximum characters in a resource description.
pub const MAX_DESCRIPTION_CHARS: usize = 2_000;

/// Maximum number of tags attached to a single resource.
pub const MAX_TAGS_PER_RESOURCE: usize = 10;

// =============================================================================
// TAG LIMITS
// =============================================================================

/// Maximum characters in a tag label.
pub const MAX_TAG_LABEL_CHARS: usize = 50;

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// Token in the `expand` query parameter that requests tag expansion.
pub const EXPAND_TAGS: &str = "tags";

// =============================================================================
// COMMAND RETRIES
// =============================================================================

/// Extra attempts made for a command that failed with a uniqueness conflict.
pub const CONFLICT_RETRIES: usize = 1;
