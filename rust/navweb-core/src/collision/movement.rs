//! Movement directions and wall-side bitmasks.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Movement {
    pub name: &'static str,
    pub dx: i32,
    pub dy: i32,
}

pub const NORTH: Movement = Movement { name: "north", dx: 0, dy: 1 };
pub const SOUTH: Movement = Movement { name: "south", dx: 0, dy: -1 };
pub const EAST: Movement = Movement { name: "east", dx: 1, dy: 0 };
pub const WEST: Movement = Movement { name: "west", dx: -1, dy: 0 };
pub const NORTHEAST: Movement = Movement { name: "northeast", dx: 1, dy: 1 };
pub const NORTHWEST: Movement = Movement { name: "northwest", dx: -1, dy: 1 };
pub const SOUTHEAST: Movement = Movement { name: "southeast", dx: 1, dy: -1 };
pub const SOUTHWEST: Movement = Movement { name: "southwest", dx: -1, dy: -1 };

/// Expansion order of the local search: row by row from the south-west.
/// Tie-breaking between equal-cost paths depends on this order.
pub const SCAN_ORDER: [Movement; 8] = [
    SOUTHWEST, SOUTH, SOUTHEAST, WEST, EAST, NORTHWEST, NORTH, NORTHEAST,
];

// Wall bits stored per tile: a wall on that side of the tile.
pub const WALL_NORTH: u8 = 1 << 0;
pub const WALL_EAST: u8 = 1 << 1;
pub const WALL_SOUTH: u8 = 1 << 2;
pub const WALL_WEST: u8 = 1 << 3;

/// Wall bit on the far tile that mirrors `side` on the near tile.
#[inline]
pub const fn opposite_wall(side: u8) -> u8 {
    match side {
        WALL_NORTH => WALL_SOUTH,
        WALL_SOUTH => WALL_NORTH,
        WALL_EAST => WALL_WEST,
        WALL_WEST => WALL_EAST,
        _ => 0,
    }
}

/// Wall side crossed by a cardinal step, or 0 for diagonals and no-ops.
#[inline]
pub const fn wall_for_step(dx: i32, dy: i32) -> u8 {
    match (dx, dy) {
        (0, 1) => WALL_NORTH,
        (0, -1) => WALL_SOUTH,
        (1, 0) => WALL_EAST,
        (-1, 0) => WALL_WEST,
        _ => 0,
    }
}

/// Decode a comma-separated list of wall sides (case-insensitive).
/// Unknown tokens are ignored.
pub fn decode_walls(s: &str) -> u8 {
    let mut mask = 0u8;
    for part in s.split(',') {
        mask |= match part.trim().to_ascii_lowercase().as_str() {
            "north" | "n" => WALL_NORTH,
            "east" | "e" => WALL_EAST,
            "south" | "s" => WALL_SOUTH,
            "west" | "w" => WALL_WEST,
            _ => 0,
        };
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_order_is_row_major_from_south_west() {
        let deltas: Vec<(i32, i32)> = SCAN_ORDER.iter().map(|m| (m.dx, m.dy)).collect();
        assert_eq!(deltas, vec![(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)]);
    }

    #[test]
    fn walls_mirror_and_map_from_steps() {
        assert_eq!(opposite_wall(WALL_NORTH), WALL_SOUTH);
        assert_eq!(opposite_wall(WALL_WEST), WALL_EAST);
        assert_eq!(wall_for_step(0, 1), WALL_NORTH);
        assert_eq!(wall_for_step(-1, 0), WALL_WEST);
        assert_eq!(wall_for_step(1, 1), 0);
    }

    #[test]
    fn decode_wall_tokens() {
        assert_eq!(decode_walls("north, West"), WALL_NORTH | WALL_WEST);
        assert_eq!(decode_walls("e,s,bogus"), WALL_EAST | WALL_SOUTH);
        assert_eq!(decode_walls("  "), 0);
    }
}
