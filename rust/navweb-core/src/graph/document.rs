//! On-disk graph description and its conversion into typed entities.
//!
//! Enumerations are kept as strings here so the same structs can be merged
//! and rewritten by the builder without losing unknown metadata; they are
//! parsed (case-insensitively) when a [`super::WorldGraph`] is built.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::model::{
    meta_bool, meta_f64, meta_i32, meta_str, EdgeType, GraphEdge, GraphNode, Metadata, NodeType, QuestState, Region,
    Requirement, RuneCost, ANY_LOCATION,
};
use crate::error::{NavError, Result};
use crate::models::WorldPoint;

pub const DEFAULT_VERSION: &str = "1.0";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub nodes: Vec<NodeDoc>,
    #[serde(default)]
    pub edges: Vec<EdgeDoc>,
    #[serde(default)]
    pub regions: Vec<RegionDoc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub plane: i32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: Metadata,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeDoc {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub cost_ticks: i64,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<RequirementDoc>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: Metadata,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementDoc {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<i32>,
    #[serde(default)]
    pub consumed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rune_costs: Vec<RuneCost>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quest_state: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionDoc {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "node_ids")]
    pub nodes: Vec<String>,
    #[serde(default, alias = "is_wilderness")]
    pub wilderness: bool,
}

impl GraphDocument {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_reader<R: Read>(r: R) -> Result<Self> {
        Ok(serde_json::from_reader(r)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path).map_err(|e| NavError::io(path, e))?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// Fold `other` into this document. Nodes and regions with an id already
    /// present are replaced in place; edges are appended. A version on
    /// `other` wins.
    pub fn merge(&mut self, other: GraphDocument) {
        if other.version.is_some() {
            self.version = other.version;
        }
        let mut node_pos: IndexMap<String, usize> =
            self.nodes.iter().enumerate().map(|(i, n)| (n.id.clone(), i)).collect();
        for n in other.nodes {
            match node_pos.get(&n.id) {
                Some(&i) => self.nodes[i] = n,
                None => {
                    node_pos.insert(n.id.clone(), self.nodes.len());
                    self.nodes.push(n);
                }
            }
        }
        self.edges.extend(other.edges);
        for r in other.regions {
            match self.regions.iter_mut().find(|x| x.id == r.id) {
                Some(slot) => *slot = r,
                None => self.regions.push(r),
            }
        }
    }

    /// Structural checks that do not need typed entities: unique node ids,
    /// known edge endpoints, non-negative costs.
    pub fn validate(&self) -> Result<()> {
        let mut ids: FxHashSet<&str> = FxHashSet::default();
        for n in &self.nodes {
            if !ids.insert(n.id.as_str()) {
                return Err(NavError::DuplicateNode(n.id.clone()));
            }
        }
        for e in &self.edges {
            let dangling = |id: &str| id != ANY_LOCATION && !ids.contains(id);
            let missing = if dangling(&e.from) {
                Some(&e.from)
            } else if e.to == ANY_LOCATION || !ids.contains(e.to.as_str()) {
                Some(&e.to)
            } else {
                None
            };
            if let Some(m) = missing {
                return Err(NavError::DanglingEdge { from: e.from.clone(), to: e.to.clone(), missing: m.clone() });
            }
            if e.cost_ticks < 0 {
                return Err(NavError::NegativeCost { from: e.from.clone(), to: e.to.clone(), cost: e.cost_ticks });
            }
        }
        Ok(())
    }
}

impl NodeDoc {
    pub fn to_node(&self) -> Result<GraphNode> {
        Ok(GraphNode {
            id: self.id.clone(),
            name: self.name.clone(),
            location: WorldPoint::new(self.x, self.y, self.plane),
            kind: NodeType::parse(&self.kind)?,
            tags: self.tags.clone(),
            metadata: self.metadata.clone(),
        })
    }
}

impl RequirementDoc {
    fn identifier(&self, kind: &str) -> Result<String> {
        self.identifier
            .clone()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| NavError::InvalidDocument(format!("{kind} requirement without identifier")))
    }

    pub fn to_requirement(&self) -> Result<Requirement> {
        const KINDS: &[&str] =
            &["MAGIC_LEVEL", "AGILITY_LEVEL", "COMBAT_LEVEL", "SKILL", "QUEST", "ITEM", "RUNES", "IRONMAN_RESTRICTION", "GOLD"];
        let kind = KINDS
            .iter()
            .find(|k| k.eq_ignore_ascii_case(self.kind.trim()))
            .ok_or_else(|| NavError::unknown("requirement type", self.kind.as_str()))?;
        Ok(match *kind {
            "MAGIC_LEVEL" => Requirement::MagicLevel { level: self.value },
            "AGILITY_LEVEL" => Requirement::AgilityLevel { level: self.value },
            "COMBAT_LEVEL" => Requirement::CombatLevel { level: self.value },
            "SKILL" => Requirement::Skill { skill: self.identifier("skill")?, level: self.value },
            "QUEST" => Requirement::Quest {
                quest: self.identifier("quest")?,
                state: self.quest_state.as_deref().map(QuestState::parse).transpose()?.unwrap_or_default(),
            },
            "ITEM" => {
                let item_id = match self.item_id {
                    Some(id) => id,
                    None => self
                        .identifier("item")?
                        .trim()
                        .parse()
                        .map_err(|_| NavError::InvalidDocument(format!("item requirement with bad id {:?}", self.identifier)))?,
                };
                Requirement::Item { item_id, quantity: self.value.max(1), consumed: self.consumed }
            }
            "RUNES" => Requirement::Runes { costs: self.rune_costs.clone() },
            "IRONMAN_RESTRICTION" => Requirement::IronmanRestriction { restriction: self.identifier.clone() },
            _ => Requirement::Gold { amount: self.value },
        })
    }
}

impl EdgeDoc {
    /// Typed edge with metadata-derived fields filled in. Endpoint locations
    /// and the wilderness flag are resolved later against the node set.
    pub fn to_edge(&self) -> Result<GraphEdge> {
        let kind = EdgeType::parse(&self.kind)?;
        let cost = i32::try_from(self.cost_ticks)
            .map_err(|_| NavError::InvalidDocument(format!("edge {} -> {} cost out of range", self.from, self.to)))?;
        let requirements = self.requirements.iter().map(RequirementDoc::to_requirement).collect::<Result<Vec<_>>>()?;
        let m = &self.metadata;

        let mut e = GraphEdge::new(&self.from, &self.to, kind, cost);
        e.bidirectional = self.bidirectional;
        e.from_plane = meta_i32(m, "from_plane").unwrap_or(-1);
        e.to_plane = meta_i32(m, "to_plane").unwrap_or(-1);
        e.object_id = meta_i32(m, "object_id").unwrap_or(-1);
        e.action = meta_str(m, "action");
        e.failure_rate = meta_f64(m, "failure_rate").unwrap_or(0.0);
        let req_agility = requirements
            .iter()
            .filter_map(|r| match r {
                Requirement::AgilityLevel { level } => Some(*level),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        e.required_agility_level = meta_i32(m, "required_agility_level").unwrap_or(0).max(req_agility);
        e.toll_cost = meta_i32(m, "toll_cost").unwrap_or(0);
        e.min_gold = meta_i32(m, "min_gold").unwrap_or(0);
        e.required_item_id = meta_i32(m, "required_item_id").unwrap_or(-1);
        e.free_passage_quest = meta_str(m, "free_passage_quest");
        e.teleport_type = meta_str(m, "teleport_type");
        e.teleport_id = meta_str(m, "teleport_id");
        e.respawn_point = meta_str(m, "respawn_point");
        e.cooldown_minutes = meta_i32(m, "cooldown_minutes").unwrap_or(0);
        e.enters_wilderness = meta_bool(m, "wilderness");
        e.requirements = requirements;
        e.metadata = self.metadata.clone();
        Ok(e)
    }
}

impl RegionDoc {
    pub fn to_region(&self) -> Region {
        Region { id: self.id.clone(), name: self.name.clone(), nodes: self.nodes.clone(), wilderness: self.wilderness }
    }
}
