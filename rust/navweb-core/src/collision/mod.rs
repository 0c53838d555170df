//! Per-tile collision primitives.
//!
//! The engine never derives terrain collision itself; it asks a
//! [`CollisionOracle`] supplied by the host. [`GridCollision`] is an in-memory
//! oracle over one loaded scene window, used by the service and by tests.

pub mod movement;

use bitvec::vec::BitVec;

use crate::models::WorldPoint;
use movement::{opposite_wall, wall_for_step, WALL_EAST, WALL_NORTH, WALL_SOUTH, WALL_WEST};

/// Edge length of the host's loaded scene window, in tiles.
pub const SCENE_SIZE: i32 = 104;
/// Number of floors a scene carries.
pub const PLANES: i32 = 4;
pub const SCENE_TILES: usize = (SCENE_SIZE * SCENE_SIZE) as usize;

pub trait CollisionOracle {
    fn is_blocked(&self, x: i32, y: i32, plane: i32) -> bool;
    fn can_move_north(&self, x: i32, y: i32, plane: i32) -> bool;
    fn can_move_south(&self, x: i32, y: i32, plane: i32) -> bool;
    fn can_move_east(&self, x: i32, y: i32, plane: i32) -> bool;
    fn can_move_west(&self, x: i32, y: i32, plane: i32) -> bool;

    /// True when an interaction from `from` reaches `to` without a boundary
    /// (wall, fence) in between. Only meaningful for tiles at distance <= 1.
    fn can_interact(&self, from: WorldPoint, to: WorldPoint) -> bool;

    /// Projectile line of sight between two tiles on the same plane.
    fn has_line_of_sight(&self, from: WorldPoint, to: WorldPoint) -> bool;

    #[inline]
    fn is_blocked_at(&self, p: WorldPoint) -> bool {
        self.is_blocked(p.x, p.y, p.plane)
    }

    /// Single step between 8-neighbours. A diagonal step needs all four
    /// flanking cardinal moves, so corners cannot be cut.
    fn can_step(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32, plane: i32) -> bool {
        let dx = to_x - from_x;
        let dy = to_y - from_y;
        match (dx, dy) {
            (0, 1) => self.can_move_north(from_x, from_y, plane),
            (0, -1) => self.can_move_south(from_x, from_y, plane),
            (1, 0) => self.can_move_east(from_x, from_y, plane),
            (-1, 0) => self.can_move_west(from_x, from_y, plane),
            (1, 1) => {
                self.can_move_north(from_x, from_y, plane)
                    && self.can_move_east(from_x, from_y + 1, plane)
                    && self.can_move_east(from_x, from_y, plane)
                    && self.can_move_north(from_x + 1, from_y, plane)
            }
            (-1, 1) => {
                self.can_move_north(from_x, from_y, plane)
                    && self.can_move_west(from_x, from_y + 1, plane)
                    && self.can_move_west(from_x, from_y, plane)
                    && self.can_move_north(from_x - 1, from_y, plane)
            }
            (1, -1) => {
                self.can_move_south(from_x, from_y, plane)
                    && self.can_move_east(from_x, from_y - 1, plane)
                    && self.can_move_east(from_x, from_y, plane)
                    && self.can_move_south(from_x + 1, from_y, plane)
            }
            (-1, -1) => {
                self.can_move_south(from_x, from_y, plane)
                    && self.can_move_west(from_x, from_y - 1, plane)
                    && self.can_move_west(from_x, from_y, plane)
                    && self.can_move_south(from_x - 1, from_y, plane)
            }
            _ => false,
        }
    }

    #[inline]
    fn can_step_to(&self, from: WorldPoint, to: WorldPoint) -> bool {
        from.plane == to.plane && self.can_step(from.x, from.y, to.x, to.y, from.plane)
    }
}

impl<T: CollisionOracle + ?Sized> CollisionOracle for &T {
    fn is_blocked(&self, x: i32, y: i32, plane: i32) -> bool {
        (**self).is_blocked(x, y, plane)
    }
    fn can_move_north(&self, x: i32, y: i32, plane: i32) -> bool {
        (**self).can_move_north(x, y, plane)
    }
    fn can_move_south(&self, x: i32, y: i32, plane: i32) -> bool {
        (**self).can_move_south(x, y, plane)
    }
    fn can_move_east(&self, x: i32, y: i32, plane: i32) -> bool {
        (**self).can_move_east(x, y, plane)
    }
    fn can_move_west(&self, x: i32, y: i32, plane: i32) -> bool {
        (**self).can_move_west(x, y, plane)
    }
    fn can_interact(&self, from: WorldPoint, to: WorldPoint) -> bool {
        (**self).can_interact(from, to)
    }
    fn has_line_of_sight(&self, from: WorldPoint, to: WorldPoint) -> bool {
        (**self).has_line_of_sight(from, to)
    }
}

/// Collision flags for one scene window: a blocked bit and a wall mask per tile.
/// Tiles outside the window are treated as blocked.
#[derive(Clone, Debug)]
pub struct GridCollision {
    base_x: i32,
    base_y: i32,
    blocked: BitVec,
    walls: Vec<u8>,
}

impl GridCollision {
    pub fn new(base_x: i32, base_y: i32) -> Self {
        let n = SCENE_TILES * PLANES as usize;
        Self { base_x, base_y, blocked: BitVec::repeat(false, n), walls: vec![0; n] }
    }

    pub fn base(&self) -> (i32, i32) {
        (self.base_x, self.base_y)
    }

    #[inline]
    fn index(&self, x: i32, y: i32, plane: i32) -> Option<usize> {
        let lx = x.checked_sub(self.base_x)?;
        let ly = y.checked_sub(self.base_y)?;
        if lx < 0 || ly < 0 || lx >= SCENE_SIZE || ly >= SCENE_SIZE || !(0..PLANES).contains(&plane) {
            return None;
        }
        Some((plane * SCENE_SIZE * SCENE_SIZE + ly * SCENE_SIZE + lx) as usize)
    }

    pub fn contains(&self, p: WorldPoint) -> bool {
        self.index(p.x, p.y, p.plane).is_some()
    }

    pub fn set_blocked(&mut self, p: WorldPoint, blocked: bool) {
        if let Some(i) = self.index(p.x, p.y, p.plane) {
            self.blocked.set(i, blocked);
        }
    }

    /// Place a wall on `side` of `p`, mirrored onto the neighbouring tile.
    pub fn add_wall(&mut self, p: WorldPoint, side: u8) {
        for bit in [WALL_NORTH, WALL_EAST, WALL_SOUTH, WALL_WEST] {
            if side & bit == 0 {
                continue;
            }
            if let Some(i) = self.index(p.x, p.y, p.plane) {
                self.walls[i] |= bit;
            }
            let n = match bit {
                WALL_NORTH => p.dy(1),
                WALL_SOUTH => p.dy(-1),
                WALL_EAST => p.dx(1),
                _ => p.dx(-1),
            };
            if let Some(j) = self.index(n.x, n.y, n.plane) {
                self.walls[j] |= opposite_wall(bit);
            }
        }
    }

    #[inline]
    fn walls_at(&self, x: i32, y: i32, plane: i32) -> u8 {
        self.index(x, y, plane).map(|i| self.walls[i]).unwrap_or(0)
    }

    #[inline]
    fn cardinal(&self, x: i32, y: i32, plane: i32, dx: i32, dy: i32) -> bool {
        let (tx, ty) = (x + dx, y + dy);
        if self.is_blocked(tx, ty, plane) || self.index(x, y, plane).is_none() {
            return false;
        }
        !self.wall_between(x, y, tx, ty, plane)
    }

    /// True when a wall separates two cardinal neighbours.
    fn wall_between(&self, x: i32, y: i32, tx: i32, ty: i32, plane: i32) -> bool {
        let side = wall_for_step(tx - x, ty - y);
        self.walls_at(x, y, plane) & side != 0 || self.walls_at(tx, ty, plane) & opposite_wall(side) != 0
    }

    /// Boundary check for a single step of at most one tile in each axis.
    /// Diagonals pass when either L-shaped route is free of walls.
    fn boundary_clear(&self, a: WorldPoint, b: WorldPoint) -> bool {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        if dx == 0 && dy == 0 {
            return true;
        }
        if dx == 0 || dy == 0 {
            return !self.wall_between(a.x, a.y, b.x, b.y, a.plane);
        }
        let via_x = !self.wall_between(a.x, a.y, a.x + dx, a.y, a.plane)
            && !self.wall_between(a.x + dx, a.y, b.x, b.y, a.plane);
        let via_y = !self.wall_between(a.x, a.y, a.x, a.y + dy, a.plane)
            && !self.wall_between(a.x, a.y + dy, b.x, b.y, a.plane);
        via_x || via_y
    }
}

impl CollisionOracle for GridCollision {
    #[inline]
    fn is_blocked(&self, x: i32, y: i32, plane: i32) -> bool {
        match self.index(x, y, plane) {
            Some(i) => self.blocked[i],
            None => true,
        }
    }

    fn can_move_north(&self, x: i32, y: i32, plane: i32) -> bool {
        self.cardinal(x, y, plane, 0, 1)
    }

    fn can_move_south(&self, x: i32, y: i32, plane: i32) -> bool {
        self.cardinal(x, y, plane, 0, -1)
    }

    fn can_move_east(&self, x: i32, y: i32, plane: i32) -> bool {
        self.cardinal(x, y, plane, 1, 0)
    }

    fn can_move_west(&self, x: i32, y: i32, plane: i32) -> bool {
        self.cardinal(x, y, plane, -1, 0)
    }

    fn can_interact(&self, from: WorldPoint, to: WorldPoint) -> bool {
        if from.plane != to.plane || from.distance_to(&to) > 1 {
            return false;
        }
        self.boundary_clear(from, to)
    }

    fn has_line_of_sight(&self, from: WorldPoint, to: WorldPoint) -> bool {
        if from.plane != to.plane || !self.contains(from) || !self.contains(to) {
            return false;
        }
        // Bresenham walk; intermediate tiles must be open and no step may
        // cross a wall.
        let (mut x, mut y) = (from.x, from.y);
        let dx = (to.x - from.x).abs();
        let dy = -(to.y - from.y).abs();
        let sx = if from.x < to.x { 1 } else { -1 };
        let sy = if from.y < to.y { 1 } else { -1 };
        let mut err = dx + dy;
        while x != to.x || y != to.y {
            let prev = WorldPoint::new(x, y, from.plane);
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
            let cur = WorldPoint::new(x, y, from.plane);
            if !self.boundary_clear(prev, cur) {
                return false;
            }
            if cur != to && self.is_blocked_at(cur) {
                return false;
            }
        }
        true
    }
}
