//! Long-range travel graph: named locations joined by typed, gated edges.
//!
//! Built once from a [`GraphDocument`] and immutable afterwards. Nodes and
//! edges are addressed by dense `u32` indices internally; the public surface
//! speaks node ids.

pub mod document;
pub mod model;
pub mod path;
mod search;

use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::{info, warn};

pub use document::{EdgeDoc, GraphDocument, NodeDoc, RegionDoc, RequirementDoc};
pub use model::{EdgeType, GraphEdge, GraphNode, NodeType, QuestState, Region, Requirement, RuneCost, ANY_LOCATION};
pub use path::NavigationPath;

use crate::error::Result;
use crate::models::WorldPoint;

#[derive(Debug, Default)]
pub struct WorldGraph {
    version: String,
    nodes: Vec<GraphNode>,
    index: FxHashMap<String, u32>,
    edges: Vec<GraphEdge>,
    /// Target node index per edge.
    edge_to: Vec<u32>,
    outgoing: Vec<Vec<u32>>,
    incoming: Vec<Vec<u32>>,
    any_location: Vec<u32>,
    regions: IndexMap<String, Region>,
}

impl WorldGraph {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_document(GraphDocument::from_json_str(s)?)
    }

    pub fn from_reader<R: Read>(r: R) -> Result<Self> {
        Self::from_document(GraphDocument::from_reader(r)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let g = Self::from_document(GraphDocument::load(path)?)?;
        info!(path = %path.display(), version = %g.version, "graph file loaded");
        Ok(g)
    }

    /// Validate, parse enums, expand bidirectional edges and build indices.
    pub fn from_document(doc: GraphDocument) -> Result<Self> {
        doc.validate()?;
        let mut g = WorldGraph { version: doc.version().to_string(), ..Default::default() };

        for nd in &doc.nodes {
            let node = nd.to_node()?;
            g.index.insert(node.id.clone(), g.nodes.len() as u32);
            g.nodes.push(node);
            g.outgoing.push(Vec::new());
            g.incoming.push(Vec::new());
        }
        for rd in &doc.regions {
            if let Some(missing) = rd.nodes.iter().find(|n| !g.index.contains_key(n.as_str())) {
                warn!(region = %rd.id, node = %missing, "region lists unknown node");
            }
            g.regions.insert(rd.id.clone(), rd.to_region());
        }

        for ed in &doc.edges {
            let edge = ed.to_edge()?;
            let reverse = (edge.bidirectional && !edge.is_any_location()).then(|| edge.reversed());
            g.push_edge(edge);
            if let Some(r) = reverse {
                g.push_edge(r);
            }
        }

        info!(
            nodes = g.nodes.len(),
            edges = g.edges.len(),
            any_location = g.any_location.len(),
            regions = g.regions.len(),
            "graph loaded"
        );
        Ok(g)
    }

    fn push_edge(&mut self, mut edge: GraphEdge) {
        let Some(&to) = self.index.get(&edge.to) else { return };
        let from = self.index.get(&edge.from).copied();
        edge.from_location = from.map(|i| self.nodes[i as usize].location);
        let dest = &self.nodes[to as usize];
        edge.to_location = Some(dest.location);
        edge.enters_wilderness =
            edge.enters_wilderness || dest.location.wilderness_level() > 0 || self.is_in_wilderness(&edge.to);

        let ei = self.edges.len() as u32;
        match from {
            Some(f) => self.outgoing[f as usize].push(ei),
            None => self.any_location.push(ei),
        }
        self.incoming[to as usize].push(ei);
        self.edge_to.push(to);
        self.edges.push(edge);
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i as usize])
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn nodes_by_type(&self, kind: NodeType) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.kind == kind).collect()
    }

    pub fn banks(&self) -> Vec<&GraphNode> {
        self.nodes_by_type(NodeType::Bank)
    }

    pub fn nodes_with_tag(&self, tag: &str) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.has_tag(tag)).collect()
    }

    pub fn f2p_nodes(&self) -> Vec<&GraphNode> {
        self.nodes.iter().filter(|n| n.is_f2p()).collect()
    }

    /// Closest node on the same plane. Ties go to the node loaded first.
    pub fn nearest_node(&self, p: WorldPoint) -> Option<&GraphNode> {
        self.nearest_where(p, |_| true)
    }

    pub fn nearest_node_of_type(&self, p: WorldPoint, kind: NodeType) -> Option<&GraphNode> {
        self.nearest_where(p, |n| n.kind == kind)
    }

    fn nearest_where(&self, p: WorldPoint, keep: impl Fn(&GraphNode) -> bool) -> Option<&GraphNode> {
        self.nodes
            .iter()
            .filter(|n| n.location.plane == p.plane && keep(*n))
            .min_by_key(|n| n.distance_to(&p))
    }

    /// Closest node by horizontal distance, ignoring planes.
    pub fn nearest_node_any_plane(&self, p: WorldPoint) -> Option<&GraphNode> {
        self.nodes.iter().min_by_key(|n| n.location.distance_2d(&p))
    }

    /// Same-plane nodes within `max_distance`, closest first.
    pub fn nodes_within(&self, p: WorldPoint, max_distance: i32) -> Vec<&GraphNode> {
        let mut v: Vec<&GraphNode> = self.nodes.iter().filter(|n| n.distance_to(&p) <= max_distance).collect();
        v.sort_by_key(|n| n.distance_to(&p));
        v
    }

    fn edge_refs<'a>(&'a self, ids: &'a [u32]) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        ids.iter().map(move |&i| &self.edges[i as usize])
    }

    pub fn edges_from(&self, id: &str) -> Vec<&GraphEdge> {
        match self.index.get(id) {
            Some(&i) => self.edge_refs(&self.outgoing[i as usize]).collect(),
            None if id == ANY_LOCATION => self.edge_refs(&self.any_location).collect(),
            None => Vec::new(),
        }
    }

    pub fn edges_to(&self, id: &str) -> Vec<&GraphEdge> {
        match self.index.get(id) {
            Some(&i) => self.edge_refs(&self.incoming[i as usize]).collect(),
            None => Vec::new(),
        }
    }

    pub fn edges_by_type(&self, kind: EdgeType) -> Vec<&GraphEdge> {
        self.edges.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn any_location_edges(&self) -> Vec<&GraphEdge> {
        self.edge_refs(&self.any_location).collect()
    }

    /// Outgoing edges passing `allowed`, followed by the usable any-location
    /// edges (not added when expanding `any_location` itself).
    pub fn traversable_edges<F>(&self, id: &str, allowed: F) -> Vec<&GraphEdge>
    where
        F: Fn(&GraphEdge) -> bool,
    {
        let mut v: Vec<&GraphEdge> = self.edges_from(id).into_iter().filter(|e| allowed(*e)).collect();
        if id != ANY_LOCATION {
            v.extend(self.edge_refs(&self.any_location).filter(|e| allowed(*e)));
        }
        v
    }

    /// First edge from `from` to `to`.
    pub fn edge(&self, from: &str, to: &str) -> Option<&GraphEdge> {
        self.edges_from(from).into_iter().find(|e| e.to == to)
    }

    pub fn plane_transition_edges(&self, id: &str) -> Vec<&GraphEdge> {
        self.edges_from(id).into_iter().filter(|e| e.is_plane_transition()).collect()
    }

    pub fn find_transition_to_plane(&self, id: &str, target_plane: i32) -> Option<&GraphEdge> {
        self.edges_from(id).into_iter().find(|e| e.is_plane_transition() && e.to_plane == target_plane)
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn region_for_node(&self, node_id: &str) -> Option<&Region> {
        self.regions.values().find(|r| r.contains_node(node_id))
    }

    pub fn is_in_wilderness(&self, node_id: &str) -> bool {
        self.region_for_node(node_id).is_some_and(|r| r.wilderness)
    }

    pub(crate) fn node_index(&self, id: &str) -> Option<u32> {
        self.index.get(id).copied()
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<WorldGraph>();
}
