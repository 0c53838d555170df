//! Route classification: local walk, graph path, or one of the partial
//! failure modes, each with deterministic recovery suggestions.

mod result;

pub use result::{NavigationResult, RouteStatus, Suggestion};

use tracing::debug;

use crate::config::NavConfig;
use crate::graph::{GraphEdge, GraphNode, WorldGraph};
use crate::models::WorldPoint;

#[derive(Clone, Debug)]
pub struct RouteResolver {
    near_node: i32,
    isolation: i32,
    first_mile_walk: i32,
    last_mile_walk: i32,
    local_radius: i32,
}

impl Default for RouteResolver {
    fn default() -> Self {
        Self::new(&NavConfig::default())
    }
}

impl RouteResolver {
    pub fn new(config: &NavConfig) -> Self {
        Self {
            near_node: config.near_node_threshold,
            isolation: config.isolation_threshold,
            first_mile_walk: config.first_mile_walk_threshold,
            last_mile_walk: config.last_mile_walk_threshold,
            local_radius: config.local_radius,
        }
    }

    /// Classify a trip from `start` to `destination`.
    ///
    /// `allowed` filters graph edges for the current traveler; `local` runs
    /// the scene-bounded search and answers `None` when it cannot serve the
    /// pair (not loaded, unreachable).
    pub fn resolve<F, L>(
        &self,
        graph: Option<&WorldGraph>,
        start: WorldPoint,
        destination: WorldPoint,
        allowed: F,
        local: L,
    ) -> NavigationResult
    where
        F: Fn(&GraphEdge) -> bool,
        L: FnOnce(WorldPoint, WorldPoint) -> Option<i32>,
    {
        let Some(graph) = graph else {
            return NavigationResult::system_unavailable();
        };

        if start.plane == destination.plane && start.distance_to(&destination) <= self.local_radius {
            if let Some(cost) = local(start, destination) {
                debug!(%start, %destination, cost, "route served locally");
                return NavigationResult::local(start, destination, cost);
            }
        }

        let near_start = graph.nearest_node(start);
        let near_dest = graph.nearest_node_any_plane(destination);
        let first = near_start.map(|n| n.location.distance_to(&start));
        let last = near_dest.map(|n| n.location.distance_2d(&destination));

        let mut result = NavigationResult::new(RouteStatus::FullPathAvailable, start, destination);
        result.nearest_start_node = near_start.map(|n| n.id.clone());
        result.nearest_destination_node = near_dest.map(|n| n.id.clone());

        let start_hit = near_start.filter(|_| first.is_some_and(|d| d <= self.isolation));
        let dest_hit = near_dest.filter(|_| last.is_some_and(|d| d <= self.isolation));

        match (start_hit, dest_hit) {
            (None, None) => {
                result.status = RouteStatus::CompletelyIsolated;
                result.first_mile_distance = first;
                result.last_mile_distance = last;
                result.suggestions = vec![Suggestion::UseHomeTeleport, Suggestion::AreaNotSupported];
                result.failure_reason = Some("start and destination are both far from any graph node".into());
            }
            (None, Some(_)) => {
                result.status = RouteStatus::PlayerIsolated;
                result.first_mile_distance = first;
                if first.is_some_and(|d| d < self.first_mile_walk) {
                    result.suggestions.push(Suggestion::WalkToNearestNode);
                }
                result.suggestions.push(Suggestion::UseHomeTeleport);
                result.suggestions.push(Suggestion::UseMinigameTeleport);
                result.failure_reason = Some(match first {
                    Some(d) => format!("start is {d} tiles from the nearest graph node"),
                    None => "no graph node on the start plane".into(),
                });
            }
            (Some(_), None) => {
                result.status = RouteStatus::DestinationIsolated;
                result.last_mile_distance = last;
                if last.is_some_and(|d| d < self.last_mile_walk) {
                    result.suggestions.push(Suggestion::WalkFromLastNode);
                } else {
                    result.suggestions.push(Suggestion::AreaNotSupported);
                }
                result.failure_reason = Some(match last {
                    Some(d) => format!("destination is {d} tiles from the nearest graph node"),
                    None => "graph has no nodes".into(),
                });
            }
            (Some(s), Some(d)) => {
                self.graph_leg(graph, &mut result, s, d, first, last, allowed);
            }
        }

        debug!(%start, %destination, status = ?result.status, first_mile = ?first, last_mile = ?last, "route resolved");
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn graph_leg<F>(
        &self,
        graph: &WorldGraph,
        result: &mut NavigationResult,
        from: &GraphNode,
        to: &GraphNode,
        first: Option<i32>,
        last: Option<i32>,
        allowed: F,
    ) where
        F: Fn(&GraphEdge) -> bool,
    {
        let Some(path) = graph.shortest_path(&from.id, &to.id, allowed) else {
            result.status = RouteStatus::NoPathBetweenNodes;
            result.first_mile_distance = first;
            result.last_mile_distance = last;
            result.suggestions = vec![Suggestion::UnlockRequired, Suggestion::UseTeleport];
            result.failure_reason = Some(format!("no usable path from {} to {}", from.id, to.id));
            return;
        };

        let needs_first = first.is_some_and(|d| d > self.near_node);
        let needs_last = last.is_some_and(|d| d > self.near_node);
        result.status = match (needs_first, needs_last) {
            (true, true) => RouteStatus::BothEndsManual,
            (true, false) => RouteStatus::FirstMileManual,
            (false, true) => RouteStatus::LastMileManual,
            (false, false) => RouteStatus::FullPathAvailable,
        };
        if needs_first {
            result.suggestions.push(Suggestion::WalkToNearestNode);
            result.first_mile_distance = first;
        }
        if needs_last {
            result.suggestions.push(Suggestion::WalkFromLastNode);
            result.last_mile_distance = last;
        }
        result.estimated_ticks = Some(path.total_cost);
        result.graph_path = Some(path);
    }

    /// Like [`resolve`](Self::resolve), but when no graph route exists and the
    /// two points are within walking range, suggest walking straight there.
    pub fn best_effort<F, L>(
        &self,
        graph: Option<&WorldGraph>,
        start: WorldPoint,
        destination: WorldPoint,
        allowed: F,
        local: L,
    ) -> NavigationResult
    where
        F: Fn(&GraphEdge) -> bool,
        L: FnOnce(WorldPoint, WorldPoint) -> Option<i32>,
    {
        let analysis = self.resolve(graph, start, destination, allowed, local);
        if analysis.has_graph_path()
            || analysis.is_fully_navigable()
            || analysis.status == RouteStatus::SystemNotAvailable
        {
            return analysis;
        }
        let direct = start.distance_to(&destination);
        if direct <= self.isolation {
            let mut walk = NavigationResult::new(RouteStatus::BothEndsManual, start, destination);
            walk.first_mile_distance = Some(direct);
            walk.suggestions = vec![Suggestion::SimpleWalkToDestination];
            return walk;
        }
        analysis
    }
}
