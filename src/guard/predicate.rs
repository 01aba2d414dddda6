//! When to hold a transition for unsaved changes

use crate::router::Location;

/// Whether a transition from `current` to `next` must wait for a decision
///
/// Only dirty screens block. A dirty screen blocks any change of path, and
/// any transition that leaves the `base_path` subtree.
pub fn should_block(current: &Location, next: &Location, is_dirty: bool, base_path: &str) -> bool {
    is_dirty && (current.path() != next.path() || leaves_subtree(current, next, base_path))
}

/// True when `current` is inside `base_path` and `next` is not
pub fn leaves_subtree(current: &Location, next: &Location, base_path: &str) -> bool {
    current.is_within(base_path) && !next.is_within(base_path)
}
