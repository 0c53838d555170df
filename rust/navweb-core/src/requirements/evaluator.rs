use tracing::trace;

use super::TravelerState;
use crate::graph::{EdgeType, GraphEdge, QuestState, Requirement};
use crate::obstacles::{ObstacleDefinition, ObstacleType};

/// Whether a single requirement holds for `t`.
pub fn meets<T: TravelerState + ?Sized>(req: &Requirement, t: &T) -> bool {
    match req {
        Requirement::MagicLevel { level } => t.magic_level() >= *level,
        Requirement::AgilityLevel { level } => t.agility_level() >= *level,
        Requirement::CombatLevel { level } => t.combat_level() >= *level,
        Requirement::Skill { skill, level } => t.skill_level(skill) >= *level,
        Requirement::Quest { quest, state } => match state {
            QuestState::Started => t.is_quest_started(quest),
            QuestState::Completed => t.is_quest_completed(quest),
        },
        Requirement::Item { item_id, quantity, .. } => t.has_item(*item_id, (*quantity).max(1)),
        Requirement::Runes { costs } => costs.iter().all(|c| t.has_item(c.item_id, c.quantity)),
        Requirement::IronmanRestriction { restriction } => !(t.is_ironman() && restriction.is_some()),
        Requirement::Gold { amount } => t.inventory_gold() >= *amount,
    }
}

pub fn meets_all<T: TravelerState + ?Sized>(reqs: &[Requirement], t: &T) -> bool {
    reqs.iter().all(|r| meets(r, t))
}

/// Full traversal check for a graph edge.
///
/// Order: wilderness policy, explicit requirements, shortcut level and risk,
/// toll gate, free-teleport availability. A completed free-passage quest
/// settles the toll check and skips the free-teleport check.
pub fn can_traverse<T: TravelerState + ?Sized>(edge: &GraphEdge, t: &T) -> bool {
    if edge.enters_wilderness && t.avoid_wilderness() {
        trace!(from = %edge.from, to = %edge.to, "edge rejected: wilderness");
        return false;
    }

    if !meets_all(&edge.requirements, t) {
        return false;
    }

    if edge.is_agility_shortcut() {
        if t.agility_level() < edge.required_agility_level {
            return false;
        }
        if edge.failure_rate > t.acceptable_risk() {
            trace!(from = %edge.from, to = %edge.to, rate = edge.failure_rate, "edge rejected: risk");
            return false;
        }
    }

    if edge.is_toll_gate() {
        if let Some(q) = &edge.free_passage_quest {
            if t.is_quest_completed(q) {
                return true;
            }
        }
        let gold = t.inventory_gold();
        if edge.toll_cost > 0 && gold < edge.toll_cost {
            return false;
        }
        if edge.min_gold > 0 && gold < edge.min_gold {
            return false;
        }
        if edge.required_item_id > 0 && !t.has_item(edge.required_item_id, 1) {
            return false;
        }
    }

    if edge.kind == EdgeType::FreeTeleport {
        if let Some(kind) = &edge.teleport_type {
            if !t.free_teleport_ready(kind) {
                return false;
            }
        }
        if let (Some(point), Some(active)) = (&edge.respawn_point, t.active_respawn_point()) {
            if !point.eq_ignore_ascii_case(active) {
                return false;
            }
        }
        if let Some(id) = &edge.teleport_id {
            if !t.is_teleport_unlocked(id) {
                return false;
            }
        }
    }

    true
}

/// Whether the traveler may use a catalog obstacle. `min_cushion` is the gold
/// the caller wants left over after paying any toll.
pub fn can_use_obstacle<T: TravelerState + ?Sized>(def: &ObstacleDefinition, t: &T, min_cushion: i32) -> bool {
    match def.kind {
        ObstacleType::AgilityShortcut => {
            if let Some(q) = &def.required_quest {
                if !t.is_quest_completed(q) {
                    return false;
                }
            }
            let level = t.agility_level();
            def.can_attempt(level) && !def.is_risky(level, t.acceptable_risk())
        }
        ObstacleType::TollGate => {
            if def.free_passage_quest.as_deref().is_some_and(|q| t.is_quest_completed(q)) {
                return true;
            }
            if def.required_item_id > 0 && !t.has_item(def.required_item_id, 1) {
                return false;
            }
            def.can_afford_toll(t.inventory_gold(), min_cushion)
        }
        _ => def.required_quest.as_deref().map_or(true, |q| t.is_quest_completed(q)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RuneCost;
    use crate::requirements::SimpleTraveler;

    fn toll_edge(toll: i32, min_gold: i32) -> GraphEdge {
        let mut e = GraphEdge::new("lumbridge", "al_kharid", EdgeType::Toll, 3);
        e.toll_cost = toll;
        e.min_gold = min_gold;
        e
    }

    #[test]
    fn requirement_variants() {
        let t = SimpleTraveler { magic_level: 25, ironman: true, ..SimpleTraveler::default() }
            .with_item(563, 1)
            .with_item(556, 3)
            .with_gold(100);
        assert!(meets(&Requirement::MagicLevel { level: 25 }, &t));
        assert!(!meets(&Requirement::CombatLevel { level: 10 }, &t));
        let runes = Requirement::Runes {
            costs: vec![RuneCost { item_id: 563, quantity: 1 }, RuneCost { item_id: 556, quantity: 3 }],
        };
        assert!(meets(&runes, &t));
        assert!(!meets(&Requirement::Runes { costs: vec![RuneCost { item_id: 557, quantity: 1 }] }, &t));
        assert!(!meets(&Requirement::IronmanRestriction { restriction: Some("no_trade".into()) }, &t));
        assert!(meets(&Requirement::IronmanRestriction { restriction: None }, &t));
        assert!(meets(&Requirement::Gold { amount: 100 }, &t));
        assert!(!meets(&Requirement::Gold { amount: 101 }, &t));
    }

    #[test]
    fn started_quest_state() {
        let t = SimpleTraveler { quests_started: vec!["Dragon Slayer I".into()], ..SimpleTraveler::default() };
        assert!(meets(&Requirement::Quest { quest: "dragon slayer i".into(), state: QuestState::Started }, &t));
        assert!(!meets(&Requirement::quest("Dragon Slayer I"), &t));
    }

    #[test]
    fn toll_needs_cushion_as_well_as_fare() {
        let edge = toll_edge(10, 500);
        assert!(can_traverse(&edge, &SimpleTraveler::default().with_gold(600)));
        assert!(!can_traverse(&edge, &SimpleTraveler::default().with_gold(50)));

        let mut free = toll_edge(10, 500);
        free.free_passage_quest = Some("Prince Ali Rescue".into());
        assert!(can_traverse(&free, &SimpleTraveler::default().with_quest("PRINCE_ALI_RESCUE")));
    }

    #[test]
    fn shortcut_level_and_risk() {
        let mut e = GraphEdge::new("a", "b", EdgeType::Agility, 4);
        e.required_agility_level = 40;
        e.failure_rate = 0.05;
        let low = SimpleTraveler { agility_level: 39, ..SimpleTraveler::default() };
        let ok = SimpleTraveler { agility_level: 40, ..SimpleTraveler::default() };
        assert!(!can_traverse(&e, &low));
        assert!(can_traverse(&e, &ok));
        e.failure_rate = 0.2;
        assert!(!can_traverse(&e, &ok));
    }

    #[test]
    fn wilderness_short_circuits() {
        let mut e = GraphEdge::new("edgeville", "ditch", EdgeType::Walk, 4);
        e.enters_wilderness = true;
        let cautious = SimpleTraveler { avoid_wilderness: true, ..SimpleTraveler::default() };
        assert!(!can_traverse(&e, &cautious));
        assert!(can_traverse(&e, &SimpleTraveler::default()));
    }

    #[test]
    fn free_teleport_gates() {
        let mut e = GraphEdge::new("any_location", "lumbridge", EdgeType::FreeTeleport, 20);
        e.teleport_type = Some("home".into());
        e.respawn_point = Some("LUMBRIDGE".into());
        assert!(can_traverse(&e, &SimpleTraveler::default()));

        let cooling = SimpleTraveler { teleports_on_cooldown: vec!["HOME".into()], ..SimpleTraveler::default() };
        assert!(!can_traverse(&e, &cooling));
        let elsewhere = SimpleTraveler { active_respawn_point: Some("EDGEVILLE".into()), ..SimpleTraveler::default() };
        assert!(!can_traverse(&e, &elsewhere));

        e.teleport_id = Some("minigame_pest_control".into());
        let locked = SimpleTraveler { locked_teleports: vec!["minigame_pest_control".into()], ..SimpleTraveler::default() };
        assert!(!can_traverse(&e, &locked));
    }

    #[test]
    fn catalog_obstacles() {
        let gate = ObstacleDefinition::toll_gate("Toll gate", 2882, 2883, 10, Some("Prince Ali Rescue"));
        assert!(can_use_obstacle(&gate, &SimpleTraveler::default().with_gold(600), 500));
        assert!(!can_use_obstacle(&gate, &SimpleTraveler::default().with_gold(50), 500));
        assert!(can_use_obstacle(&gate, &SimpleTraveler::default().with_quest("Prince Ali Rescue"), 500));

        let log = ObstacleDefinition::new("Log balance", ObstacleType::AgilityShortcut, vec![23274], "Walk-across", 4)
            .with_success(40, 0.9, 0.02, 5);
        let at_40 = SimpleTraveler { agility_level: 40, risk_threshold: 0.05, ..SimpleTraveler::default() };
        let at_60 = SimpleTraveler { agility_level: 60, risk_threshold: 0.05, ..SimpleTraveler::default() };
        assert!(!can_use_obstacle(&log, &at_40, 0));
        assert!(can_use_obstacle(&log, &at_60, 0));
    }
}
