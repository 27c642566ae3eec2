//! Fractional positional indexing for sibling ordering.
//!
//! Lists within a board and cards within a list are ordered by a real-number
//! position. Appending assigns `max + 1000`, so no sibling is ever
//! renumbered; reordering between two neighbors is done by the caller
//! supplying an explicit midpoint, which bypasses this engine entirely.
//! Callers on that path are responsible for picking a value strictly between
//! the intended neighbors.

pub const BASE_POSITION: f64 = 1000.0;
pub const POSITION_STEP: f64 = 1000.0;

/// Position for a new sibling appended at the end of its group.
pub fn next_position(existing_max: Option<f64>) -> f64 {
    match existing_max {
        Some(max) => max + POSITION_STEP,
        None => BASE_POSITION,
    }
}
