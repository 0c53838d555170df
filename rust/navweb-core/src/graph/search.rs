use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use tracing::debug;

use super::model::GraphEdge;
use super::path::NavigationPath;
use super::WorldGraph;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct QueueNode {
    node: u32,
    cost: i64,
    seq: u64,
}

impl PartialOrd for QueueNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert for cheapest-first, FIFO on ties.
        (other.cost, other.seq, other.node).cmp(&(self.cost, self.seq, self.node))
    }
}

impl WorldGraph {
    /// Edge indices leaving node `u` that pass `allowed`, any-location edges
    /// included.
    fn expand<'a, F>(&'a self, u: u32, allowed: &'a F) -> impl Iterator<Item = u32> + 'a
    where
        F: Fn(&GraphEdge) -> bool,
    {
        self.outgoing[u as usize]
            .iter()
            .chain(self.any_location.iter())
            .copied()
            .filter(move |&ei| allowed(&self.edges[ei as usize]))
    }

    /// Cheapest path over edges passing `allowed`. `None` when either id is
    /// unknown or no route exists; a path from a node to itself is empty.
    pub fn shortest_path<F>(&self, from: &str, to: &str, allowed: F) -> Option<NavigationPath>
    where
        F: Fn(&GraphEdge) -> bool,
    {
        let start = self.node_index(from)?;
        let goal = self.node_index(to)?;
        let start_loc = self.nodes[start as usize].location;
        let goal_loc = self.nodes[goal as usize].location;
        if start == goal {
            return Some(NavigationPath {
                node_ids: vec![from.to_string()],
                start: Some(start_loc),
                end: Some(goal_loc),
                ..NavigationPath::empty()
            });
        }

        let n = self.nodes.len();
        let mut dist = vec![i64::MAX; n];
        // (previous node, edge index) per reached node.
        let mut prev: Vec<Option<(u32, u32)>> = vec![None; n];
        let mut open = BinaryHeap::new();
        let mut seq: u64 = 0;
        let mut expanded: u64 = 0;
        dist[start as usize] = 0;
        open.push(QueueNode { node: start, cost: 0, seq });

        while let Some(qn) = open.pop() {
            if qn.cost > dist[qn.node as usize] {
                continue;
            }
            expanded += 1;
            if qn.node == goal {
                break;
            }
            for ei in self.expand(qn.node, &allowed) {
                let v = self.edge_to[ei as usize];
                let next = qn.cost + i64::from(self.edges[ei as usize].cost);
                if next < dist[v as usize] {
                    dist[v as usize] = next;
                    prev[v as usize] = Some((qn.node, ei));
                    seq += 1;
                    open.push(QueueNode { node: v, cost: next, seq });
                }
            }
        }

        if dist[goal as usize] == i64::MAX {
            debug!(from, to, expanded, "no graph path");
            return None;
        }

        let mut edges = Vec::new();
        let mut node_ids = vec![to.to_string()];
        let mut cur = goal;
        while let Some((p, ei)) = prev[cur as usize] {
            edges.push(self.edges[ei as usize].clone());
            node_ids.push(self.nodes[p as usize].id.clone());
            cur = p;
        }
        edges.reverse();
        node_ids.reverse();
        let total = dist[goal as usize];
        debug!(from, to, expanded, edges = edges.len(), cost = total, "graph path found");
        Some(NavigationPath {
            edges,
            node_ids,
            total_cost: i32::try_from(total).unwrap_or(i32::MAX),
            start: Some(start_loc),
            end: Some(goal_loc),
        })
    }

    /// Reachability over edges passing `allowed`.
    pub fn has_path<F>(&self, from: &str, to: &str, allowed: F) -> bool
    where
        F: Fn(&GraphEdge) -> bool,
    {
        let (Some(start), Some(goal)) = (self.node_index(from), self.node_index(to)) else {
            return false;
        };
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([start]);
        seen[start as usize] = true;
        while let Some(u) = queue.pop_front() {
            if u == goal {
                return true;
            }
            for ei in self.expand(u, &allowed) {
                let v = self.edge_to[ei as usize];
                if !seen[v as usize] {
                    seen[v as usize] = true;
                    queue.push_back(v);
                }
            }
        }
        false
    }
}
