use std::collections::BTreeMap;

use navweb_core::graph::EdgeType;
use navweb_core::WorldGraph;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct GraphSummary {
    pub version: String,
    pub nodes: usize,
    pub edges: usize,
    pub regions: usize,
    pub edges_by_type: BTreeMap<EdgeType, usize>,
}

pub fn summarize(graph: &WorldGraph) -> GraphSummary {
    let mut edges_by_type = BTreeMap::new();
    for e in graph.edges() {
        *edges_by_type.entry(e.kind).or_insert(0) += 1;
    }
    GraphSummary {
        version: graph.version().to_string(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        regions: graph.regions().count(),
        edges_by_type,
    }
}
