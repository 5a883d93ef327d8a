//! Narrow interface onto the world-geometry collaborator.

use vek::Vec2;

/// Map/portal geometry lookup. Only the offline command path consumes this,
/// to resolve a stored spawn point into world coordinates.
pub trait MapIndex: Send + Sync {
    fn portal_position(&self, map_id: i32, spawn_point: u8) -> Option<Vec2<i32>>;
}
