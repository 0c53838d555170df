use serde::{Deserialize, Serialize};

use crate::models::WorldPoint;

/// Closed set of obstacle categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleType {
    Door,
    Gate,
    TollGate,
    AgilityShortcut,
    Ladder,
    Stairs,
    Trapdoor,
    Other,
}

pub const DOOR_COST: i32 = 2;
pub const DEFAULT_TOLL: i32 = 10;

/// A traversable obstacle and everything needed to decide whether and how
/// to pass it. Immutable once the catalog is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDefinition {
    pub name: String,
    pub kind: ObstacleType,
    pub object_ids: Vec<i32>,
    /// Object id while the obstacle is closed; -1 when it has no such state.
    pub blocked_state_id: i32,
    /// Object id once opened; -1 when it has no such state.
    pub passable_state_id: i32,
    pub action: String,
    pub traversal_cost: i32,

    #[serde(default)]
    pub required_level: i32,
    #[serde(default = "one")]
    pub base_success_rate: f64,
    #[serde(default)]
    pub success_bonus: f64,
    #[serde(default = "five")]
    pub success_bonus_step: i32,
    #[serde(default)]
    pub required_quest: Option<String>,

    #[serde(default)]
    pub toll_cost: i32,
    #[serde(default)]
    pub min_gold: i32,
    #[serde(default)]
    pub required_item_id: i32,
    #[serde(default)]
    pub free_passage_quest: Option<String>,

    #[serde(default)]
    pub destination_plane: Option<i32>,
    #[serde(default)]
    pub destination: Option<WorldPoint>,
    #[serde(default)]
    pub location: Option<WorldPoint>,
}

fn one() -> f64 {
    1.0
}

fn five() -> i32 {
    5
}

impl ObstacleDefinition {
    /// Bare definition; the constructors below fill in the category defaults.
    pub fn new(name: impl Into<String>, kind: ObstacleType, object_ids: Vec<i32>, action: impl Into<String>, cost: i32) -> Self {
        let blocked = object_ids.first().copied().unwrap_or(-1);
        Self {
            name: name.into(),
            kind,
            object_ids,
            blocked_state_id: blocked,
            passable_state_id: -1,
            action: action.into(),
            traversal_cost: cost,
            required_level: 0,
            base_success_rate: 1.0,
            success_bonus: 0.0,
            success_bonus_step: 5,
            required_quest: None,
            toll_cost: 0,
            min_gold: 0,
            required_item_id: 0,
            free_passage_quest: None,
            destination_plane: None,
            destination: None,
            location: None,
        }
    }

    pub fn door(name: &str, closed_id: i32, open_id: i32) -> Self {
        Self::new(name, ObstacleType::Door, vec![closed_id, open_id], "Open", DOOR_COST).with_states(closed_id, open_id)
    }

    pub fn gate(name: &str, closed_id: i32, open_id: i32) -> Self {
        Self::new(name, ObstacleType::Gate, vec![closed_id, open_id], "Open", DOOR_COST).with_states(closed_id, open_id)
    }

    pub fn toll_gate(name: &str, closed_id: i32, open_id: i32, toll: i32, free_quest: Option<&str>) -> Self {
        let mut d = Self::new(name, ObstacleType::TollGate, vec![closed_id, open_id], "Pay-toll(10gp)", DOOR_COST)
            .with_states(closed_id, open_id);
        d.action = format!("Pay-toll({toll}gp)");
        d.toll_cost = toll;
        d.free_passage_quest = free_quest.map(str::to_string);
        d
    }

    pub fn with_states(mut self, blocked: i32, passable: i32) -> Self {
        self.blocked_state_id = blocked;
        self.passable_state_id = passable;
        self
    }

    pub fn with_location(mut self, p: WorldPoint) -> Self {
        self.location = Some(p);
        self
    }

    pub fn with_success(mut self, required_level: i32, base: f64, bonus: f64, step: i32) -> Self {
        self.required_level = required_level;
        self.base_success_rate = base;
        self.success_bonus = bonus;
        self.success_bonus_step = step.max(1);
        self
    }

    pub fn is_door_or_gate(&self) -> bool {
        matches!(self.kind, ObstacleType::Door | ObstacleType::Gate | ObstacleType::TollGate)
    }

    pub fn is_shortcut(&self) -> bool {
        self.kind == ObstacleType::AgilityShortcut
    }

    pub fn is_plane_change(&self) -> bool {
        self.destination_plane.is_some()
            || matches!(self.kind, ObstacleType::Ladder | ObstacleType::Stairs | ObstacleType::Trapdoor)
    }

    pub fn matches(&self, object_id: i32) -> bool {
        self.object_ids.contains(&object_id)
    }

    pub fn is_blocked_state(&self, object_id: i32) -> bool {
        self.blocked_state_id != -1 && object_id == self.blocked_state_id
    }

    pub fn is_passable_state(&self, object_id: i32) -> bool {
        self.passable_state_id != -1 && object_id == self.passable_state_id
    }

    /// Chance of crossing at `level`: zero below the requirement, then the base
    /// rate plus a bonus per completed step above it, capped at certainty.
    pub fn success_rate(&self, level: i32) -> f64 {
        if level < self.required_level {
            return 0.0;
        }
        let steps = ((level - self.required_level) / self.success_bonus_step.max(1)) as f64;
        (self.base_success_rate + steps * self.success_bonus).clamp(0.0, 1.0)
    }

    pub fn failure_rate(&self, level: i32) -> f64 {
        1.0 - self.success_rate(level)
    }

    pub fn can_attempt(&self, level: i32) -> bool {
        level >= self.required_level
    }

    pub fn is_risky(&self, level: i32, threshold: f64) -> bool {
        self.failure_rate(level) > threshold
    }

    /// Toll check: `gold` must cover the toll and the caller's cushion.
    /// A free-passage quest is checked separately by the caller.
    pub fn can_afford_toll(&self, gold: i32, min_cushion: i32) -> bool {
        if self.kind != ObstacleType::TollGate {
            return true;
        }
        gold >= self.toll_cost && gold >= min_cushion.max(self.min_gold)
    }
}

/// An obstacle instance found in the loaded scene.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectedObstacle {
    pub definition: std::sync::Arc<ObstacleDefinition>,
    pub object_id: i32,
    pub location: WorldPoint,
    pub blocked: bool,
}
