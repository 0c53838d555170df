use std::fmt;

use serde::{Deserialize, Serialize};

/// Wilderness starts at this y coordinate on the surface plane.
pub const WILDERNESS_Y_START: i32 = 3520;
/// Deepest wilderness level (north edge).
pub const MAX_WILDERNESS_LEVEL: i32 = 56;
/// Most teleports stop working above this wilderness level.
pub const STANDARD_TELEPORT_LIMIT: i32 = 20;
/// Enhanced teleport items work up to this wilderness level.
pub const ENHANCED_TELEPORT_LIMIT: i32 = 30;

/// A tile in world space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub plane: i32,
}

impl WorldPoint {
    pub const fn new(x: i32, y: i32, plane: i32) -> Self {
        Self { x, y, plane }
    }

    /// Chebyshev distance; points on different planes are infinitely far apart.
    #[inline]
    pub fn distance_to(&self, other: &WorldPoint) -> i32 {
        if self.plane != other.plane {
            return i32::MAX;
        }
        self.distance_2d(other)
    }

    /// Chebyshev distance ignoring the plane.
    #[inline]
    pub fn distance_2d(&self, other: &WorldPoint) -> i32 {
        chebyshev(self.x, self.y, other.x, other.y)
    }

    #[inline]
    pub fn dx(&self, dx: i32) -> Self {
        Self { x: self.x.saturating_add(dx), ..*self }
    }

    #[inline]
    pub fn dy(&self, dy: i32) -> Self {
        Self { y: self.y.saturating_add(dy), ..*self }
    }

    #[inline]
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self { x: self.x.saturating_add(dx), y: self.y.saturating_add(dy), plane: self.plane }
    }

    /// 64x64 map square id, as the game client computes it.
    #[inline]
    pub fn region_id(&self) -> i32 {
        ((self.x >> 6) << 8) | (self.y >> 6)
    }

    pub fn wilderness_level(&self) -> i32 {
        wilderness_level(self)
    }
}

impl fmt::Display for WorldPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.plane)
    }
}

impl From<[i32; 3]> for WorldPoint {
    fn from(t: [i32; 3]) -> Self {
        Self::new(t[0], t[1], t[2])
    }
}

/// Saturates at `i32::MAX` for coordinates at the far ends of the range.
#[inline]
pub fn chebyshev(ax: i32, ay: i32, bx: i32, by: i32) -> i32 {
    let d = (ax as i64 - bx as i64).abs().max((ay as i64 - by as i64).abs());
    d.min(i32::MAX as i64) as i32
}

/// Anything that can report where it stands in the world.
pub trait HasWorldLocation {
    fn world_location(&self) -> WorldPoint;
}

impl HasWorldLocation for WorldPoint {
    fn world_location(&self) -> WorldPoint {
        *self
    }
}

/// Wilderness level of a tile. Only the surface plane carries wilderness.
pub fn wilderness_level(p: &WorldPoint) -> i32 {
    if p.plane != 0 || p.y < WILDERNESS_Y_START {
        return 0;
    }
    ((p.y - WILDERNESS_Y_START) / 8 + 1).min(MAX_WILDERNESS_LEVEL)
}

/// Teleport strength classes with respect to wilderness restrictions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeleportClass {
    Standard,
    Enhanced,
}

pub fn can_teleport_from(p: &WorldPoint, class: TeleportClass) -> bool {
    let level = wilderness_level(p);
    match class {
        TeleportClass::Standard => level <= STANDARD_TELEPORT_LIMIT,
        TeleportClass::Enhanced => level <= ENHANCED_TELEPORT_LIMIT,
    }
}
