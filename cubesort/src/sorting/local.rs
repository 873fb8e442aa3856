//! Directional in-place sort of a local block.

use crate::topology::Direction;

/// Sorts `block` in place, ascending or descending.
///
/// The sort is not stable, duplicate values are interchangeable. No I/O and
/// no allocation beyond what the standard unstable sort needs.
///
/// # Arguments
/// * `block` - Local block to reorder
/// * `direction` - Ordering to establish
pub fn sort_direction<T: Ord>(block: &mut [T], direction: Direction) {
    match direction {
        Direction::Ascending => block.sort_unstable(),
        Direction::Descending => block.sort_unstable_by(|a, b| b.cmp(a)),
    }
}
