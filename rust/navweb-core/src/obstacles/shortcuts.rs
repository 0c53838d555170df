//! Agility shortcut table and its conversion into obstacle definitions.

use serde::{Deserialize, Serialize};

use super::definition::{ObstacleDefinition, ObstacleType};
use crate::config::NavConfig;
use crate::error::Result;
use crate::models::WorldPoint;

/// One row of the external shortcut table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShortcutDescription {
    /// SCREAMING_SNAKE identifier, e.g. `LUMBRIDGE_RIVER_STEPPING_STONES`.
    pub name: String,
    pub level: i32,
    #[serde(default)]
    pub description: Option<String>,
    pub obstacle_ids: Vec<i32>,
    #[serde(default)]
    pub location: Option<WorldPoint>,
}

/// Rows with success certainty: level 1 shortcuts never fail.
pub const SAFE_SUCCESS_RATE: f64 = 1.0;

pub fn parse_table(json: &str) -> Result<Vec<ShortcutDescription>> {
    Ok(serde_json::from_str(json)?)
}

pub fn to_definition(s: &ShortcutDescription, config: &NavConfig) -> ObstacleDefinition {
    let base = if s.level <= 1 { SAFE_SUCCESS_RATE } else { config.shortcut_base_rate };
    let desc = s.description.as_deref();
    let mut def = ObstacleDefinition::new(
        display_name(&s.name),
        ObstacleType::AgilityShortcut,
        s.obstacle_ids.clone(),
        infer_action(desc),
        traversal_cost(desc),
    )
    .with_success(s.level, base, config.shortcut_bonus, config.shortcut_bonus_step);
    def.location = s.location;
    def
}

/// Menu verb guessed from the free-text description. First match wins.
pub fn infer_action(description: Option<&str>) -> &'static str {
    const RULES: &[(&[&str], &str)] = &[
        (&["pipe", "squeeze"], "Squeeze-through"),
        (&["rock", "climb"], "Climb"),
        (&["rope", "swing"], "Swing-across"),
        (&["stepping", "stone"], "Cross"),
        (&["jump", "leap", "gap"], "Jump"),
        (&["balance", "log", "ledge"], "Cross"),
        (&["tunnel", "underwall"], "Enter"),
        (&["grapple"], "Grapple"),
        (&["wall", "fence", "crumbling"], "Climb-over"),
        (&["crevice", "crack"], "Squeeze-through"),
        (&["vine", "ivy"], "Climb"),
        (&["chain"], "Climb-up"),
        (&["zipline"], "Ride"),
        (&["bridge"], "Cross"),
        (&["trellis"], "Climb"),
        (&["hole"], "Enter"),
        (&["window"], "Climb-through"),
    ];
    let Some(d) = description else { return "Use" };
    let d = d.to_lowercase();
    RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| d.contains(w)))
        .map(|(_, action)| *action)
        .unwrap_or("Use")
}

/// Ticks spent on the obstacle itself.
pub fn traversal_cost(description: Option<&str>) -> i32 {
    let Some(d) = description else { return 3 };
    let d = d.to_lowercase();
    if d.contains("grapple") {
        6
    } else if d.contains("pipe") || d.contains("tunnel") || d.contains("monkey") || d.contains("balance") {
        4
    } else if d.contains("jump") || d.contains("leap") {
        2
    } else {
        3
    }
}

/// `FALADOR_CRUMBLING_WALL` -> `Falador Crumbling Wall`.
pub fn display_name(id: &str) -> String {
    id.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_follow_keyword_precedence() {
        assert_eq!(infer_action(Some("Squeeze through the pipe")), "Squeeze-through");
        // "rock" is checked before "jump".
        assert_eq!(infer_action(Some("Jump across the rocks")), "Climb");
        assert_eq!(infer_action(Some("Stepping stones")), "Cross");
        assert_eq!(infer_action(Some("Crumbling wall")), "Climb-over");
        assert_eq!(infer_action(Some("Zipline")), "Ride");
        assert_eq!(infer_action(Some("Something odd")), "Use");
        assert_eq!(infer_action(None), "Use");
    }

    #[test]
    fn costs_by_complexity() {
        assert_eq!(traversal_cost(Some("Grapple across the river")), 6);
        assert_eq!(traversal_cost(Some("Underwall tunnel")), 4);
        assert_eq!(traversal_cost(Some("Monkey bars")), 4);
        assert_eq!(traversal_cost(Some("Leap the gap")), 2);
        assert_eq!(traversal_cost(Some("Stepping stones")), 3);
        assert_eq!(traversal_cost(None), 3);
    }

    #[test]
    fn names_are_title_cased() {
        assert_eq!(display_name("FALADOR_CRUMBLING_WALL"), "Falador Crumbling Wall");
        assert_eq!(display_name("GE_UNDERWALL_TUNNEL"), "Ge Underwall Tunnel");
    }

    #[test]
    fn level_one_shortcuts_never_fail() {
        let cfg = NavConfig::default();
        let row = ShortcutDescription {
            name: "EASY_LOG".into(),
            level: 1,
            description: Some("Log balance".into()),
            obstacle_ids: vec![100],
            location: None,
        };
        let d = to_definition(&row, &cfg);
        assert_eq!(d.success_rate(1), 1.0);
        assert_eq!(d.action, "Cross");
        assert_eq!(d.traversal_cost, 4);
        assert_eq!(d.blocked_state_id, 100);

        let hard = ShortcutDescription { level: 40, ..row };
        let d = to_definition(&hard, &cfg);
        assert!((d.success_rate(40) - 0.90).abs() < 1e-9);
    }
}
