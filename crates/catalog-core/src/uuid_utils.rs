//! UUIDv7 identifiers for resources and tags.
//!
//! UUIDv7 embeds a millisecond Unix timestamp in its first 48 bits, so
//! identifiers minted later sort after earlier ones. List queries use the id
//! as the tie-breaker when two resources share a creation timestamp.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// # Example
///
/// ```
/// use catalog_core::uuid_utils::{is_v7, new_v7};
///
/// let id = new_v7();
/// assert!(is_v7(&id));
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check if a UUID is version 7.
#[inline]
pub fn is_v7(uuid: &Uuid) -> bool {
    uuid.get_version_num() == 7
}
