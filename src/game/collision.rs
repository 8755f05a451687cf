//! Collision Detection
//!
//! Axis-aligned box overlap for the player, obstacles, ground segments and
//! collectible stars, plus the distance test used by approach obstacles.

use serde::{Serialize, Deserialize};

use crate::core::vec3::Vec3;

/// Distance at which an approaching obstacle hits the player.
pub const APPROACH_HIT_DISTANCE: f32 = 3.0;

/// Approach obstacles only collide once they are closer than this along z.
pub const APPROACH_Z_WINDOW: f32 = 10.0;

/// Slack when comparing the previous frame's feet with a ground top.
pub const LANDING_TOLERANCE: f32 = 1e-3;

/// Axis-aligned box described by its center and full size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// World-space center
    pub center: Vec3,
    /// Full extents (width, height, depth)
    pub size: Vec3,
}

impl Aabb {
    /// Create a box from center and full size.
    #[inline]
    pub const fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }

    /// Top face height.
    #[inline]
    pub fn top(&self) -> f32 {
        self.center.y + self.size.y / 2.0
    }

    /// Check overlap against another box.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        boxes_overlap(self.center, self.size, other.center, other.size)
    }
}

/// Strict half-extent overlap test on all three axes.
///
/// Boxes whose faces exactly touch do not collide.
#[inline]
pub fn boxes_overlap(center_a: Vec3, size_a: Vec3, center_b: Vec3, size_b: Vec3) -> bool {
    (center_a.x - center_b.x).abs() * 2.0 < size_a.x + size_b.x
        && (center_a.y - center_b.y).abs() * 2.0 < size_a.y + size_b.y
        && (center_a.z - center_b.z).abs() * 2.0 < size_a.z + size_b.z
}

/// Hit test for an obstacle flying toward the player.
///
/// Active only once the obstacle is within `APPROACH_Z_WINDOW` along z.
#[inline]
pub fn approach_hit(obstacle: Vec3, player: Vec3) -> bool {
    obstacle.z < player.z + APPROACH_Z_WINDOW && obstacle.distance(player) < APPROACH_HIT_DISTANCE
}

/// Result of resolving the player against the ground.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundContact {
    /// Height the player's center snaps to
    pub rest_y: f32,
}

/// Resolve the player's collider against ground segments.
///
/// Lands only from above: the player must be falling (or at rest) and
/// their feet must have been at or above the segment top last frame.
/// Touching a segment's side leaves the player free to fall.
pub fn resolve_ground(
    player: &Aabb,
    previous_bottom: f32,
    vertical_velocity: f32,
    segments: &[Aabb],
    surface_offset: f32,
) -> Option<GroundContact> {
    if vertical_velocity > 0.0 {
        return None;
    }
    segments
        .iter()
        .filter(|segment| previous_bottom >= segment.center.y + surface_offset - LANDING_TOLERANCE)
        .find(|segment| player.overlaps(segment))
        .map(|segment| GroundContact {
            rest_y: segment.center.y + surface_offset + player.size.y / 2.0,
        })
}
