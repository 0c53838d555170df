use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{EdgeType, GraphEdge};
use crate::models::WorldPoint;

/// Ordered edges through the travel graph. `node_ids` has one more entry than
/// `edges` unless the path is empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationPath {
    pub edges: Vec<GraphEdge>,
    pub node_ids: Vec<String>,
    pub total_cost: i32,
    pub start: Option<WorldPoint>,
    pub end: Option<WorldPoint>,
}

impl NavigationPath {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A one-edge walk, used when the local search covers the whole trip.
    pub fn single_walk(from: WorldPoint, to: WorldPoint, cost: i32) -> Self {
        Self {
            edges: vec![GraphEdge::walk("start", "end", cost, from, to)],
            node_ids: vec!["start".into(), "end".into()],
            total_cost: cost,
            start: Some(from),
            end: Some(to),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn start_node_id(&self) -> Option<&str> {
        self.edges.first().map(|e| e.from.as_str())
    }

    pub fn end_node_id(&self) -> Option<&str> {
        self.edges.last().map(|e| e.to.as_str())
    }

    pub fn requires_plane_change(&self) -> bool {
        self.edges.iter().any(GraphEdge::is_plane_transition)
    }

    pub fn requires_shortcuts(&self) -> bool {
        self.edges.iter().any(GraphEdge::is_agility_shortcut)
    }

    pub fn requires_toll_gates(&self) -> bool {
        self.edges.iter().any(GraphEdge::is_toll_gate)
    }

    pub fn requires_teleport(&self) -> bool {
        self.edges.iter().any(GraphEdge::is_teleport)
    }

    pub fn requires_interactions(&self) -> bool {
        self.edges.iter().any(GraphEdge::requires_interaction)
    }

    pub fn required_agility_level(&self) -> i32 {
        self.edges.iter().map(|e| e.required_agility_level).max().unwrap_or(0)
    }

    pub fn edge_types(&self) -> BTreeSet<EdgeType> {
        self.edges.iter().map(|e| e.kind).collect()
    }

    pub fn first_edge(&self) -> Option<&GraphEdge> {
        self.edges.first()
    }

    pub fn last_edge(&self) -> Option<&GraphEdge> {
        self.edges.last()
    }

    /// The remainder of the path starting at edge `from_index`.
    pub fn sub_path(&self, from_index: usize) -> Self {
        if from_index >= self.edges.len() {
            return Self::empty();
        }
        let edges = self.edges[from_index..].to_vec();
        Self {
            total_cost: edges.iter().map(|e| e.cost).sum(),
            start: edges[0].from_location,
            node_ids: self.node_ids.get(from_index..).map(<[String]>::to_vec).unwrap_or_default(),
            end: self.end,
            edges,
        }
    }
}

impl fmt::Display for NavigationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NavigationPath[EMPTY]");
        }
        write!(f, "NavigationPath[{} edges, {} ticks", self.edges.len(), self.total_cost)?;
        for (flag, label) in [
            (self.requires_plane_change(), "plane-change"),
            (self.requires_shortcuts(), "shortcuts"),
            (self.requires_toll_gates(), "tolls"),
            (self.requires_teleport(), "teleport"),
        ] {
            if flag {
                write!(f, ", {label}")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> NavigationPath {
        let mut shortcut = GraphEdge::new("b", "c", EdgeType::Agility, 4);
        shortcut.required_agility_level = 21;
        shortcut.from_location = Some(WorldPoint::new(3210, 3200, 0));
        NavigationPath {
            edges: vec![GraphEdge::new("a", "b", EdgeType::Walk, 6), shortcut, GraphEdge::new("c", "d", EdgeType::Teleport, 5)],
            node_ids: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            total_cost: 15,
            start: Some(WorldPoint::new(3200, 3200, 0)),
            end: Some(WorldPoint::new(3300, 3300, 0)),
        }
    }

    #[test]
    fn derived_queries() {
        let p = path();
        assert_eq!((p.start_node_id(), p.end_node_id()), (Some("a"), Some("d")));
        assert!(p.requires_shortcuts() && p.requires_teleport());
        assert!(!p.requires_plane_change() && !p.requires_toll_gates());
        assert_eq!(p.required_agility_level(), 21);
        assert_eq!(p.edge_types().len(), 3);
        assert_eq!(p.to_string(), "NavigationPath[3 edges, 15 ticks, shortcuts, teleport]");
    }

    #[test]
    fn sub_path_recomputes_cost() {
        let s = path().sub_path(1);
        assert_eq!(s.total_cost, 9);
        assert_eq!(s.node_ids, vec!["b", "c", "d"]);
        assert_eq!(s.start, Some(WorldPoint::new(3210, 3200, 0)));
        assert!(path().sub_path(3).is_empty());
    }

    #[test]
    fn single_walk_shape() {
        let w = NavigationPath::single_walk(WorldPoint::new(1, 1, 0), WorldPoint::new(4, 1, 0), 3);
        assert_eq!(w.len(), 1);
        assert_eq!(w.total_cost, 3);
        assert_eq!(w.start_node_id(), Some("start"));
    }
}
