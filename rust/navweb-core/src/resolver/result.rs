use serde::{Deserialize, Serialize};

use crate::graph::NavigationPath;
use crate::models::WorldPoint;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    FullPathAvailable,
    FirstMileManual,
    LastMileManual,
    BothEndsManual,
    NoPathBetweenNodes,
    PlayerIsolated,
    DestinationIsolated,
    CompletelyIsolated,
    SystemNotAvailable,
}

/// Recovery hints attached to partial results.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Suggestion {
    SimpleWalkToDestination,
    WalkToNearestNode,
    WalkFromLastNode,
    UseHomeTeleport,
    UseMinigameTeleport,
    UseTeleport,
    AreaNotSupported,
    UnlockRequired,
    RetryLater,
}

/// Outcome of a route query. Distances are `None` when not measured or not
/// relevant to the status.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationResult {
    pub status: RouteStatus,
    pub start: Option<WorldPoint>,
    pub destination: Option<WorldPoint>,
    pub graph_path: Option<NavigationPath>,
    /// Set when the whole trip is served by the local search.
    pub local_walk: Option<NavigationPath>,
    pub nearest_start_node: Option<String>,
    pub first_mile_distance: Option<i32>,
    pub nearest_destination_node: Option<String>,
    pub last_mile_distance: Option<i32>,
    pub estimated_ticks: Option<i32>,
    pub suggestions: Vec<Suggestion>,
    pub failure_reason: Option<String>,
}

impl NavigationResult {
    pub(crate) fn new(status: RouteStatus, start: WorldPoint, destination: WorldPoint) -> Self {
        Self {
            status,
            start: Some(start),
            destination: Some(destination),
            suggestions: Vec::new(),
            failure_reason: None,
            ..Self::system_unavailable()
        }
    }

    pub fn system_unavailable() -> Self {
        Self {
            status: RouteStatus::SystemNotAvailable,
            start: None,
            destination: None,
            graph_path: None,
            local_walk: None,
            nearest_start_node: None,
            first_mile_distance: None,
            nearest_destination_node: None,
            last_mile_distance: None,
            estimated_ticks: None,
            suggestions: vec![Suggestion::RetryLater],
            failure_reason: Some("navigation graph not loaded".into()),
        }
    }

    /// Both ends inside the loaded scene and connected by the local search.
    pub fn local(start: WorldPoint, destination: WorldPoint, cost: i32) -> Self {
        Self {
            local_walk: Some(NavigationPath::single_walk(start, destination, cost)),
            estimated_ticks: Some(cost),
            ..Self::new(RouteStatus::FullPathAvailable, start, destination)
        }
    }

    pub fn is_fully_navigable(&self) -> bool {
        self.status == RouteStatus::FullPathAvailable
    }

    pub fn is_impossible(&self) -> bool {
        matches!(self.status, RouteStatus::CompletelyIsolated | RouteStatus::SystemNotAvailable)
    }

    pub fn has_graph_path(&self) -> bool {
        self.graph_path.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn requires_first_mile_walk(&self) -> bool {
        matches!(
            self.status,
            RouteStatus::FirstMileManual | RouteStatus::BothEndsManual | RouteStatus::PlayerIsolated
        )
    }

    pub fn requires_last_mile_walk(&self) -> bool {
        matches!(
            self.status,
            RouteStatus::LastMileManual | RouteStatus::BothEndsManual | RouteStatus::DestinationIsolated
        )
    }

    pub fn has_suggestion(&self, s: Suggestion) -> bool {
        self.suggestions.contains(&s)
    }

    /// First mile + graph ticks + last mile, counting a tick as a tile.
    pub fn total_estimated_distance(&self) -> i32 {
        let graph = match (&self.graph_path, &self.local_walk) {
            (Some(p), _) if !p.is_empty() => p.total_cost,
            (_, Some(w)) => w.total_cost,
            _ => 0,
        };
        self.first_mile_distance.unwrap_or(0).max(0) + graph + self.last_mile_distance.unwrap_or(0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_helpers() {
        let a = WorldPoint::new(3200, 3200, 0);
        let b = WorldPoint::new(3210, 3200, 0);
        let local = NavigationResult::local(a, b, 10);
        assert!(local.is_fully_navigable());
        assert!(!local.has_graph_path());
        assert_eq!(local.total_estimated_distance(), 10);

        let down = NavigationResult::system_unavailable();
        assert!(down.is_impossible());
        assert!(down.has_suggestion(Suggestion::RetryLater));

        let mut both = NavigationResult::new(RouteStatus::BothEndsManual, a, b);
        both.first_mile_distance = Some(20);
        both.last_mile_distance = Some(30);
        assert!(both.requires_first_mile_walk() && both.requires_last_mile_walk());
        assert_eq!(both.total_estimated_distance(), 50);
    }

    #[test]
    fn statuses_serialize_screaming() {
        let s = serde_json::to_string(&RouteStatus::CompletelyIsolated).unwrap();
        assert_eq!(s, "\"COMPLETELY_ISOLATED\"");
        let s = serde_json::to_string(&Suggestion::UseHomeTeleport).unwrap();
        assert_eq!(s, "\"USE_HOME_TELEPORT\"");
    }
}
