//! Typed graph entities produced by the loader.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NavError, Result};
use crate::models::{HasWorldLocation, WorldPoint};

/// Pseudo source for edges usable from every node.
pub const ANY_LOCATION: &str = "any_location";

/// Coins.
pub const GOLD_ITEM_ID: i32 = 995;

pub type Metadata = IndexMap<String, Value>;

fn parse_enum<T: Copy>(kind: &'static str, table: &[(&str, T)], raw: &str) -> Result<T> {
    let raw = raw.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw))
        .map(|(_, v)| *v)
        .ok_or_else(|| NavError::unknown(kind, raw))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Bank,
    Teleport,
    Quest,
    Shop,
    Transport,
    Training,
    Generic,
}

impl NodeType {
    const TABLE: &'static [(&'static str, NodeType)] = &[
        ("BANK", NodeType::Bank),
        ("TELEPORT", NodeType::Teleport),
        ("QUEST", NodeType::Quest),
        ("SHOP", NodeType::Shop),
        ("TRANSPORT", NodeType::Transport),
        ("TRAINING", NodeType::Training),
        ("GENERIC", NodeType::Generic),
    ];

    /// Case-insensitive; unknown names are a load error.
    pub fn parse(raw: &str) -> Result<Self> {
        parse_enum("node type", Self::TABLE, raw)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Walk,
    Door,
    Stairs,
    Agility,
    Toll,
    Teleport,
    Transport,
    FreeTeleport,
}

impl EdgeType {
    const TABLE: &'static [(&'static str, EdgeType)] = &[
        ("WALK", EdgeType::Walk),
        ("DOOR", EdgeType::Door),
        ("STAIRS", EdgeType::Stairs),
        ("AGILITY", EdgeType::Agility),
        ("TOLL", EdgeType::Toll),
        ("TELEPORT", EdgeType::Teleport),
        ("TRANSPORT", EdgeType::Transport),
        ("FREE_TELEPORT", EdgeType::FreeTeleport),
    ];

    pub fn parse(raw: &str) -> Result<Self> {
        parse_enum("edge type", Self::TABLE, raw)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestState {
    Started,
    #[default]
    Completed,
}

impl QuestState {
    const TABLE: &'static [(&'static str, QuestState)] = &[
        ("STARTED", QuestState::Started),
        ("IN_PROGRESS", QuestState::Started),
        ("COMPLETED", QuestState::Completed),
        ("FINISHED", QuestState::Completed),
    ];

    pub fn parse(raw: &str) -> Result<Self> {
        parse_enum("quest state", Self::TABLE, raw)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuneCost {
    pub item_id: i32,
    pub quantity: i32,
}

/// One gate on an edge. Pure data; see [`crate::requirements`] for evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Requirement {
    MagicLevel { level: i32 },
    AgilityLevel { level: i32 },
    CombatLevel { level: i32 },
    Skill { skill: String, level: i32 },
    Quest { quest: String, state: QuestState },
    Item { item_id: i32, quantity: i32, consumed: bool },
    Runes { costs: Vec<RuneCost> },
    IronmanRestriction { restriction: Option<String> },
    Gold { amount: i32 },
}

impl Requirement {
    pub fn quest(name: &str) -> Self {
        Requirement::Quest { quest: name.to_string(), state: QuestState::Completed }
    }

    pub fn item(item_id: i32, quantity: i32) -> Self {
        Requirement::Item { item_id, quantity: quantity.max(1), consumed: false }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub location: WorldPoint,
    pub kind: NodeType,
    pub tags: Vec<String>,
    pub metadata: Metadata,
}

impl GraphNode {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn is_f2p(&self) -> bool {
        self.has_tag("f2p")
    }

    pub fn distance_to(&self, p: &WorldPoint) -> i32 {
        self.location.distance_to(p)
    }
}

impl HasWorldLocation for GraphNode {
    fn world_location(&self) -> WorldPoint {
        self.location
    }
}

/// A directed edge. Fields below `metadata` are lifted out of the metadata
/// map and the endpoint nodes when the graph is built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeType,
    pub cost: i32,
    pub bidirectional: bool,
    pub requirements: Vec<Requirement>,
    pub metadata: Metadata,

    pub from_location: Option<WorldPoint>,
    pub to_location: Option<WorldPoint>,
    /// -1 when unspecified.
    pub from_plane: i32,
    pub to_plane: i32,
    pub object_id: i32,
    pub action: Option<String>,
    pub required_agility_level: i32,
    pub failure_rate: f64,
    pub toll_cost: i32,
    pub min_gold: i32,
    pub required_item_id: i32,
    pub free_passage_quest: Option<String>,
    pub teleport_type: Option<String>,
    pub teleport_id: Option<String>,
    pub respawn_point: Option<String>,
    pub cooldown_minutes: i32,
    pub enters_wilderness: bool,
}

impl GraphEdge {
    /// Bare edge with no requirements or metadata.
    pub fn new(from: &str, to: &str, kind: EdgeType, cost: i32) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            cost,
            bidirectional: false,
            requirements: Vec::new(),
            metadata: Metadata::new(),
            from_location: None,
            to_location: None,
            from_plane: -1,
            to_plane: -1,
            object_id: -1,
            action: None,
            required_agility_level: 0,
            failure_rate: 0.0,
            toll_cost: 0,
            min_gold: 0,
            required_item_id: -1,
            free_passage_quest: None,
            teleport_type: None,
            teleport_id: None,
            respawn_point: None,
            cooldown_minutes: 0,
            enters_wilderness: false,
        }
    }

    pub fn walk(from: &str, to: &str, cost: i32, from_location: WorldPoint, to_location: WorldPoint) -> Self {
        let mut e = Self::new(from, to, EdgeType::Walk, cost);
        e.bidirectional = true;
        e.from_location = Some(from_location);
        e.to_location = Some(to_location);
        e
    }

    /// Copy of this edge running the other way.
    pub fn reversed(&self) -> Self {
        let mut r = self.clone();
        std::mem::swap(&mut r.from, &mut r.to);
        std::mem::swap(&mut r.from_location, &mut r.to_location);
        std::mem::swap(&mut r.from_plane, &mut r.to_plane);
        r
    }

    pub fn is_any_location(&self) -> bool {
        self.from == ANY_LOCATION
    }

    pub fn is_plane_transition(&self) -> bool {
        self.kind == EdgeType::Stairs || (self.from_plane != -1 && self.to_plane != -1 && self.from_plane != self.to_plane)
    }

    pub fn is_agility_shortcut(&self) -> bool {
        self.kind == EdgeType::Agility || self.required_agility_level > 0
    }

    pub fn is_toll_gate(&self) -> bool {
        self.kind == EdgeType::Toll || self.toll_cost > 0 || self.required_item_id > 0
    }

    pub fn requires_interaction(&self) -> bool {
        self.object_id > 0 && self.action.is_some()
    }

    pub fn is_teleport(&self) -> bool {
        matches!(self.kind, EdgeType::Teleport | EdgeType::FreeTeleport)
    }

    pub fn has_requirements(&self) -> bool {
        !self.requirements.is_empty()
    }

    pub fn meta_str(&self, key: &str) -> Option<String> {
        meta_str(&self.metadata, key)
    }

    pub fn meta_i32(&self, key: &str) -> Option<i32> {
        meta_i32(&self.metadata, key)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: Option<String>,
    pub nodes: Vec<String>,
    pub wilderness: bool,
}

impl Region {
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n == node_id)
    }
}

/// Metadata values may be JSON strings or numbers.
pub fn meta_str(meta: &Metadata, key: &str) -> Option<String> {
    match meta.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn meta_i32(meta: &Metadata, key: &str) -> Option<i32> {
    match meta.get(key)? {
        Value::Number(n) => n.as_i64().map(|v| v as i32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn meta_f64(meta: &Metadata, key: &str) -> Option<f64> {
    match meta.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn meta_bool(meta: &Metadata, key: &str) -> bool {
    match meta.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
