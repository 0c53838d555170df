//! Floor-changing objects: ladders, stairs, trapdoors and friends.

use serde::{Deserialize, Serialize};

use super::definition::{ObstacleDefinition, ObstacleType};
use crate::models::WorldPoint;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    Ladder,
    Stairs,
    Trapdoor,
    Rope,
    Chain,
    Hole,
    Transport,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionDirection {
    Up,
    Down,
    Bidirectional,
}

pub const TRANSITION_COST: i32 = 3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneTransition {
    pub name: String,
    pub object_id: i32,
    pub action: String,
    pub kind: TransitionType,
    pub direction: TransitionDirection,
    /// +1 up, -1 down, 0 when only known at use time.
    pub plane_delta: i32,
    /// Must be opened first; `open_id` is the id it turns into.
    #[serde(default)]
    pub requires_open: bool,
    #[serde(default = "minus_one")]
    pub open_id: i32,
    #[serde(default)]
    pub destination: Option<WorldPoint>,
}

fn minus_one() -> i32 {
    -1
}

impl PlaneTransition {
    pub fn new(name: &str, object_id: i32, action: &str, kind: TransitionType, direction: TransitionDirection, plane_delta: i32) -> Self {
        Self {
            name: name.to_string(),
            object_id,
            action: action.to_string(),
            kind,
            direction,
            plane_delta,
            requires_open: false,
            open_id: -1,
            destination: None,
        }
    }

    pub fn up(name: &str, object_id: i32, kind: TransitionType) -> Self {
        Self::new(name, object_id, "Climb-up", kind, TransitionDirection::Up, 1)
    }

    pub fn down(name: &str, object_id: i32, kind: TransitionType) -> Self {
        Self::new(name, object_id, "Climb-down", kind, TransitionDirection::Down, -1)
    }

    pub fn both_ways(name: &str, object_id: i32, kind: TransitionType) -> Self {
        Self::new(name, object_id, "Climb", kind, TransitionDirection::Bidirectional, 0)
    }

    pub fn opened_into(mut self, open_id: i32) -> Self {
        self.requires_open = true;
        self.open_id = open_id;
        self
    }

    /// Whether this transition can take a traveler `plane_diff` floors (sign only).
    pub fn goes_toward(&self, plane_diff: i32) -> bool {
        match self.direction {
            TransitionDirection::Bidirectional => plane_diff != 0 || self.kind == TransitionType::Transport,
            TransitionDirection::Up => plane_diff > 0,
            TransitionDirection::Down => plane_diff < 0,
        }
    }

    /// Menu verb for the requested direction. Bidirectional climbs pick a side.
    pub fn action_for(&self, go_up: bool) -> &str {
        if self.direction == TransitionDirection::Bidirectional && self.action == "Climb" {
            return if go_up { "Climb-up" } else { "Climb-down" };
        }
        &self.action
    }

    pub fn to_definition(&self) -> ObstacleDefinition {
        let kind = match self.kind {
            TransitionType::Ladder => ObstacleType::Ladder,
            TransitionType::Stairs => ObstacleType::Stairs,
            TransitionType::Trapdoor => ObstacleType::Trapdoor,
            _ => ObstacleType::Other,
        };
        let mut d = ObstacleDefinition::new(&self.name, kind, vec![self.object_id], &self.action, TRANSITION_COST)
            .with_states(self.object_id, self.open_id);
        d.destination_plane = Some(self.plane_delta);
        d.destination = self.destination;
        d
    }
}

/// The built-in transition table. Later rows override earlier ones with the
/// same object id when loaded into a catalog.
pub fn builtin_transitions() -> Vec<PlaneTransition> {
    use TransitionType::*;
    let mut t = Vec::new();

    for id in 16679..=16684 {
        t.push(PlaneTransition::both_ways("Ladder", id, Ladder));
    }
    t.push(PlaneTransition::up("Lumbridge Castle Ladder", 16671, Ladder));
    t.push(PlaneTransition::down("Lumbridge Castle Ladder", 16672, Ladder));
    t.push(PlaneTransition::up("Varrock Palace Ladder", 11807, Ladder));
    t.push(PlaneTransition::down("Varrock Palace Ladder", 11808, Ladder));
    for id in [11789, 11790, 16669, 16670] {
        t.push(PlaneTransition::both_ways("Bank Ladder", id, Ladder));
    }
    t.push(PlaneTransition::down("Dungeon Entrance Ladder", 17385, Ladder));
    t.push(PlaneTransition::up("Dungeon Exit Ladder", 17386, Ladder));

    for id in [16671, 16672, 16673] {
        t.push(PlaneTransition::both_ways("Staircase", id, Stairs));
    }
    t.push(PlaneTransition::up("Lumbridge Castle Stairs", 16671, Stairs));
    t.push(PlaneTransition::down("Lumbridge Castle Stairs", 16673, Stairs));
    t.push(PlaneTransition::up("Varrock Palace Stairs", 11796, Stairs));
    t.push(PlaneTransition::down("Varrock Palace Stairs", 11797, Stairs));
    t.push(PlaneTransition::up("Falador Castle Stairs", 24072, Stairs));
    t.push(PlaneTransition::down("Falador Castle Stairs", 24073, Stairs));

    let open = |name: &str, id: i32| PlaneTransition::new(name, id, "Open", Trapdoor, TransitionDirection::Down, -1);
    t.push(open("Edgeville Dungeon Trapdoor", 1579).opened_into(1580));
    t.push(PlaneTransition::down("Edgeville Dungeon Trapdoor", 1580, Trapdoor));
    t.push(open("Varrock Sewer Manhole", 882).opened_into(883));
    t.push(PlaneTransition::down("Varrock Sewer Manhole", 883, Trapdoor));
    t.push(PlaneTransition::down("Draynor Manor Trapdoor", 11443, Trapdoor));

    t.push(PlaneTransition::new("Mine Cart", 3241, "Ride", Transport, TransitionDirection::Bidirectional, 0));
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bidirectional_climb_picks_side() {
        let l = PlaneTransition::both_ways("Bank Ladder", 11789, TransitionType::Ladder);
        assert_eq!(l.action_for(true), "Climb-up");
        assert_eq!(l.action_for(false), "Climb-down");
        let cart = PlaneTransition::new("Mine Cart", 3241, "Ride", TransitionType::Transport, TransitionDirection::Bidirectional, 0);
        assert_eq!(cart.action_for(true), "Ride");
    }

    #[test]
    fn direction_filters() {
        let up = PlaneTransition::up("L", 1, TransitionType::Ladder);
        assert!(up.goes_toward(1));
        assert!(!up.goes_toward(-1));
        let both = PlaneTransition::both_ways("L", 2, TransitionType::Ladder);
        assert!(both.goes_toward(-2));
        assert!(!both.goes_toward(0));
    }

    #[test]
    fn converts_to_obstacle_with_fixed_cost() {
        let trap = PlaneTransition::new("Trapdoor", 1579, "Open", TransitionType::Trapdoor, TransitionDirection::Down, -1)
            .opened_into(1580);
        let d = trap.to_definition();
        assert_eq!(d.kind, ObstacleType::Trapdoor);
        assert_eq!(d.traversal_cost, TRANSITION_COST);
        assert!(d.is_blocked_state(1579));
        assert!(d.is_passable_state(1580));
        assert_eq!(d.destination_plane, Some(-1));
        assert!(d.is_plane_change());
    }
}
