//! Capability checks for graph edges and obstacles.
//!
//! Everything here is a pure function of a [`TravelerState`] and the edge or
//! obstacle being considered; nothing reads the graph.

mod evaluator;
mod traveler;

pub use evaluator::{can_traverse, can_use_obstacle, meets, meets_all};
pub use traveler::SimpleTraveler;

/// What the evaluator needs to know about whoever is travelling.
pub trait TravelerState {
    fn agility_level(&self) -> i32;
    fn magic_level(&self) -> i32;
    fn combat_level(&self) -> i32;
    /// Level in a named skill; unknown skills report 1.
    fn skill_level(&self, skill: &str) -> i32;

    fn total_gold(&self) -> i32;
    fn inventory_gold(&self) -> i32;
    fn has_item(&self, item_id: i32, quantity: i32) -> bool;

    fn is_quest_completed(&self, quest: &str) -> bool;
    /// True for quests in progress as well as completed ones.
    fn is_quest_started(&self, quest: &str) -> bool;

    fn is_ironman(&self) -> bool;
    fn is_hardcore(&self) -> bool {
        false
    }
    fn is_ultimate_ironman(&self) -> bool {
        false
    }

    /// Largest failure chance the traveler accepts on a shortcut.
    fn acceptable_risk(&self) -> f64;
    fn avoid_wilderness(&self) -> bool;

    /// Whether a free teleport of this type (home, minigame, ...) is off cooldown.
    fn free_teleport_ready(&self, _teleport_type: &str) -> bool {
        true
    }
    fn active_respawn_point(&self) -> Option<&str> {
        None
    }
    fn is_teleport_unlocked(&self, _teleport_id: &str) -> bool {
        true
    }
}

/// Quest names arrive both as "Prince Ali Rescue" and "PRINCE_ALI_RESCUE".
pub(crate) fn normalize_quest(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii_alphanumeric()).map(|c| c.to_ascii_lowercase()).collect()
}
