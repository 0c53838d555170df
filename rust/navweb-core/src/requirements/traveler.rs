use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{normalize_quest, TravelerState};
use crate::graph::model::GOLD_ITEM_ID;

fn default_level() -> i32 {
    1
}

fn default_combat() -> i32 {
    3
}

fn default_risk() -> f64 {
    0.10
}

fn default_respawn() -> Option<String> {
    Some("LUMBRIDGE".to_string())
}

/// Plain-data traveler profile, as posted to the service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleTraveler {
    #[serde(default = "default_level")]
    pub agility_level: i32,
    #[serde(default = "default_level")]
    pub magic_level: i32,
    #[serde(default = "default_combat")]
    pub combat_level: i32,
    /// Other skills by lowercase name.
    pub skills: IndexMap<String, i32>,
    pub total_gold: i32,
    pub inventory_gold: i32,
    /// Item id to quantity held.
    pub items: IndexMap<i32, i32>,
    pub quests_completed: Vec<String>,
    pub quests_started: Vec<String>,
    pub ironman: bool,
    pub hardcore: bool,
    pub ultimate_ironman: bool,
    #[serde(default = "default_risk")]
    pub risk_threshold: f64,
    pub avoid_wilderness: bool,
    /// Free-teleport types currently on cooldown.
    pub teleports_on_cooldown: Vec<String>,
    #[serde(default = "default_respawn")]
    pub active_respawn_point: Option<String>,
    pub locked_teleports: Vec<String>,
}

impl Default for SimpleTraveler {
    fn default() -> Self {
        Self {
            agility_level: 1,
            magic_level: 1,
            combat_level: default_combat(),
            skills: IndexMap::new(),
            total_gold: 0,
            inventory_gold: 0,
            items: IndexMap::new(),
            quests_completed: Vec::new(),
            quests_started: Vec::new(),
            ironman: false,
            hardcore: false,
            ultimate_ironman: false,
            risk_threshold: default_risk(),
            avoid_wilderness: false,
            teleports_on_cooldown: Vec::new(),
            active_respawn_point: default_respawn(),
            locked_teleports: Vec::new(),
        }
    }
}

impl SimpleTraveler {
    pub fn with_gold(mut self, inventory: i32) -> Self {
        self.inventory_gold = inventory;
        self.total_gold = self.total_gold.max(inventory);
        self
    }

    pub fn with_quest(mut self, quest: &str) -> Self {
        self.quests_completed.push(quest.to_string());
        self
    }

    pub fn with_item(mut self, item_id: i32, quantity: i32) -> Self {
        *self.items.entry(item_id).or_insert(0) += quantity;
        self
    }

    fn quest_in(list: &[String], quest: &str) -> bool {
        let wanted = normalize_quest(quest);
        list.iter().any(|q| normalize_quest(q) == wanted)
    }
}

impl TravelerState for SimpleTraveler {
    fn agility_level(&self) -> i32 {
        self.agility_level
    }

    fn magic_level(&self) -> i32 {
        self.magic_level
    }

    fn combat_level(&self) -> i32 {
        self.combat_level
    }

    fn skill_level(&self, skill: &str) -> i32 {
        let skill = skill.trim().to_ascii_lowercase();
        match skill.as_str() {
            "agility" => self.agility_level,
            "magic" => self.magic_level,
            _ => self
                .skills
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&skill))
                .map(|(_, v)| *v)
                .unwrap_or(1),
        }
    }

    fn total_gold(&self) -> i32 {
        self.total_gold.max(self.inventory_gold)
    }

    fn inventory_gold(&self) -> i32 {
        self.inventory_gold
    }

    fn has_item(&self, item_id: i32, quantity: i32) -> bool {
        if item_id == GOLD_ITEM_ID {
            return self.inventory_gold >= quantity;
        }
        self.items.get(&item_id).is_some_and(|q| *q >= quantity)
    }

    fn is_quest_completed(&self, quest: &str) -> bool {
        Self::quest_in(&self.quests_completed, quest)
    }

    fn is_quest_started(&self, quest: &str) -> bool {
        Self::quest_in(&self.quests_started, quest) || self.is_quest_completed(quest)
    }

    fn is_ironman(&self) -> bool {
        self.ironman || self.hardcore || self.ultimate_ironman
    }

    fn is_hardcore(&self) -> bool {
        self.hardcore
    }

    fn is_ultimate_ironman(&self) -> bool {
        self.ultimate_ironman
    }

    fn acceptable_risk(&self) -> f64 {
        self.risk_threshold
    }

    fn avoid_wilderness(&self) -> bool {
        self.avoid_wilderness
    }

    fn free_teleport_ready(&self, teleport_type: &str) -> bool {
        !self.teleports_on_cooldown.iter().any(|t| t.eq_ignore_ascii_case(teleport_type))
    }

    fn active_respawn_point(&self) -> Option<&str> {
        self.active_respawn_point.as_deref()
    }

    fn is_teleport_unlocked(&self, teleport_id: &str) -> bool {
        !self.locked_teleports.iter().any(|t| t.eq_ignore_ascii_case(teleport_id))
    }
}
