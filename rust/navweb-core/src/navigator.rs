//! Query facade tying the graph, the local search, the locator and the
//! caches together for one traveler session.
//!
//! A `Navigator` owns the local search buffers, so every query that may run
//! a grid search takes `&mut self`. The spatial index and obstacle-scan cache
//! are shared with the host's event feed through [`Navigator::event_sink`].

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{training_spot_key, PathCostCache, SceneObstacleCache, TrainingSpotCache};
use crate::config::NavConfig;
use crate::graph::{NodeType, WorldGraph};
use crate::local::LocalCostEstimator;
use crate::locator::{ActorMatch, EntityLocator, InteractionModel, ObjectMatch};
use crate::models::WorldPoint;
use crate::obstacles::ObstacleCatalog;
use crate::ranking::{rank_candidates, RankBasis, RankedCandidate, TrainingCandidate};
use crate::requirements::{can_traverse, TravelerState};
use crate::resolver::{NavigationResult, RouteResolver};
use crate::scene::{EventFanout, WorldEventSink, WorldView};
use crate::spatial::SpatialIndex;

pub struct Navigator {
    config: NavConfig,
    catalog: Arc<ObstacleCatalog>,
    index: Arc<SpatialIndex>,
    scan_cache: Arc<SceneObstacleCache>,
    path_cache: PathCostCache,
    estimator: LocalCostEstimator,
    graph: Option<Arc<WorldGraph>>,
    training: Option<TrainingSpotCache>,
    resolver: RouteResolver,
}

impl Navigator {
    pub fn new(config: NavConfig, catalog: Arc<ObstacleCatalog>) -> Self {
        let index = Arc::new(SpatialIndex::new());
        let scan_cache = Arc::new(SceneObstacleCache::new(&config, Arc::clone(&catalog), Arc::clone(&index)));
        Self {
            path_cache: PathCostCache::new(&config),
            estimator: LocalCostEstimator::with_max_distance(config.local_radius),
            resolver: RouteResolver::new(&config),
            graph: None,
            training: None,
            catalog,
            index,
            scan_cache,
            config,
        }
    }

    pub fn with_graph(mut self, graph: Arc<WorldGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_training_cache(mut self, cache: TrainingSpotCache) -> Self {
        self.training = Some(cache);
        self
    }

    /// Swap the routing graph; `None` puts routing into the unavailable state.
    pub fn set_graph(&mut self, graph: Option<Arc<WorldGraph>>) {
        self.graph = graph;
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<ObstacleCatalog> {
        &self.catalog
    }

    pub fn graph(&self) -> Option<&Arc<WorldGraph>> {
        self.graph.as_ref()
    }

    pub fn spatial_index(&self) -> &Arc<SpatialIndex> {
        &self.index
    }

    pub fn scan_cache(&self) -> &Arc<SceneObstacleCache> {
        &self.scan_cache
    }

    pub fn path_cache(&self) -> &PathCostCache {
        &self.path_cache
    }

    pub fn training_cache(&self) -> Option<&TrainingSpotCache> {
        self.training.as_ref()
    }

    /// Grid searches run so far.
    pub fn local_searches(&self) -> u64 {
        self.estimator.searches()
    }

    /// Sink to register with the host's world-event feed.
    pub fn event_sink(&self) -> Arc<dyn WorldEventSink> {
        let index: Arc<dyn WorldEventSink> = self.index.clone();
        let scans: Arc<dyn WorldEventSink> = self.scan_cache.clone();
        Arc::new(EventFanout::new(vec![index, scans]))
    }

    /// Report the traveler's current tile; large moves drop cached path costs.
    pub fn observe_position(&self, position: WorldPoint) {
        self.path_cache.invalidate_if_moved(position);
    }

    /// Uncached tick cost between two tiles of the loaded scene, crossing
    /// known doors and gates near `start`.
    pub fn estimate_local_cost<W: WorldView + ?Sized>(&mut self, world: &W, start: WorldPoint, end: WorldPoint) -> Option<i32> {
        local_estimate(&mut self.estimator, &self.scan_cache, self.config.local_radius, world, start, end)
    }

    /// Cached walking cost used by the locator and ranking. Standing on the
    /// target already costs one tick.
    pub fn path_cost<W: WorldView + ?Sized>(&mut self, world: &W, start: WorldPoint, end: WorldPoint) -> Option<i32> {
        cached_cost(&mut self.estimator, &self.scan_cache, &self.path_cache, self.config.local_radius, world, start, end)
    }

    /// Classify and plan a trip for `traveler`.
    pub fn route<W, T>(&mut self, world: &W, start: WorldPoint, destination: WorldPoint, traveler: &T) -> NavigationResult
    where
        W: WorldView + ?Sized,
        T: TravelerState + ?Sized,
    {
        let estimator = &mut self.estimator;
        let scans = &self.scan_cache;
        let radius = self.config.local_radius;
        self.resolver.resolve(
            self.graph.as_deref(),
            start,
            destination,
            |e| can_traverse(e, traveler),
            |s, d| local_estimate(estimator, scans, radius, world, s, d),
        )
    }

    /// [`route`](Self::route), falling back to a plain walk suggestion when
    /// the graph cannot help but the destination is close.
    pub fn best_effort_route<W, T>(
        &mut self,
        world: &W,
        start: WorldPoint,
        destination: WorldPoint,
        traveler: &T,
    ) -> NavigationResult
    where
        W: WorldView + ?Sized,
        T: TravelerState + ?Sized,
    {
        let estimator = &mut self.estimator;
        let scans = &self.scan_cache;
        let radius = self.config.local_radius;
        self.resolver.best_effort(
            self.graph.as_deref(),
            start,
            destination,
            |e| can_traverse(e, traveler),
            |s, d| local_estimate(estimator, scans, radius, world, s, d),
        )
    }

    pub fn find_nearest_reachable_object<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        start: WorldPoint,
        ids: &[i32],
        radius: i32,
    ) -> Option<ObjectMatch> {
        let index = Arc::clone(&self.index);
        let locator = EntityLocator::new(world, &index).with_initial_batch(self.config.initial_batch);
        let (estimator, scans, paths, r) = (&mut self.estimator, &self.scan_cache, &self.path_cache, self.config.local_radius);
        locator.find_nearest_reachable_object(start, ids, radius, |a, b| cached_cost(estimator, scans, paths, r, world, a, b))
    }

    pub fn find_nearest_reachable_actor<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        start: WorldPoint,
        ids: &[i32],
        name: Option<&str>,
        radius: i32,
        model: InteractionModel,
    ) -> Option<ActorMatch> {
        let index = Arc::clone(&self.index);
        let locator = EntityLocator::new(world, &index).with_initial_batch(self.config.initial_batch);
        let (estimator, scans, paths, r) = (&mut self.estimator, &self.scan_cache, &self.path_cache, self.config.local_radius);
        locator.find_nearest_reachable_actor(start, ids, name, radius, model, |a, b| {
            cached_cost(estimator, scans, paths, r, world, a, b)
        })
    }

    /// Rank matching training objects within `radius` of `reference`, cheapest
    /// first. With `bank_required` the cost is the round trip to the nearest
    /// bank node; without a known bank the walk from `reference` is used.
    pub fn rank_training_candidates<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        ids: &[i32],
        reference: WorldPoint,
        radius: i32,
        bank_required: bool,
    ) -> Vec<RankedCandidate> {
        if ids.is_empty() {
            return Vec::new();
        }
        let key = training_spot_key(reference.region_id(), ids, bank_required);
        if let Some(hit) = self.training.as_ref().and_then(|c| c.get(&key)) {
            return hit;
        }

        let candidates: Vec<TrainingCandidate> = self
            .index
            .find_nearby_ids(world, reference, radius, ids)
            .into_iter()
            .map(|o| TrainingCandidate { location: o.location, object_id: o.id })
            .collect();

        let bank = if bank_required {
            let found = self
                .graph
                .as_deref()
                .and_then(|g| g.nearest_node_of_type(reference, NodeType::Bank))
                .map(|n| n.location);
            if found.is_none() {
                warn!(%reference, "no bank node known, ranking without banking");
            }
            found
        } else {
            None
        };
        let basis = match bank {
            Some(b) => RankBasis::BankRoundTrip(b),
            None => RankBasis::FromReference(reference),
        };

        let (estimator, scans, paths, r) = (&mut self.estimator, &self.scan_cache, &self.path_cache, self.config.local_radius);
        let graph = self.graph.as_deref();
        let ranked = rank_candidates(&candidates, basis, self.config.training_top_n, |a, b| {
            let local = cached_cost(estimator, scans, paths, r, world, a, b);
            // Banks usually sit outside the local search window.
            if bank.is_some() {
                local.or_else(|| travel_estimate(graph, a, b))
            } else {
                local
            }
        });
        debug!(%reference, ?ids, bank_required, scanned = candidates.len(), ranked = ranked.len(), "training spots ranked");

        if let Some(cache) = &self.training {
            cache.put(&key, ranked.clone(), bank);
        }
        ranked
    }
}

/// Rough ticks between two far-apart tiles: walk to the nearest graph node,
/// ride the graph, walk off. Straight-line distance when the graph cannot help.
fn travel_estimate(graph: Option<&WorldGraph>, a: WorldPoint, b: WorldPoint) -> Option<i32> {
    if a.plane != b.plane {
        return None;
    }
    let via_graph = graph.and_then(|g| {
        let (na, nb) = (g.nearest_node(a)?, g.nearest_node(b)?);
        let hop = if na.id == nb.id { 0 } else { g.shortest_path(&na.id, &nb.id, |_| true)?.total_cost };
        Some(a.distance_to(&na.location).saturating_add(hop).saturating_add(nb.location.distance_to(&b)))
    });
    Some(via_graph.unwrap_or_else(|| a.distance_to(&b)))
}

fn local_estimate<W: WorldView + ?Sized>(
    estimator: &mut LocalCostEstimator,
    scans: &SceneObstacleCache,
    radius: i32,
    world: &W,
    start: WorldPoint,
    end: WorldPoint,
) -> Option<i32> {
    if start == end {
        return Some(0);
    }
    if !world.both_loaded(start, end) {
        return None;
    }
    let obstacles = scans.obstacles_nearby(world, start, radius);
    estimator.estimate(world, &obstacles, start, end)
}

fn cached_cost<W: WorldView + ?Sized>(
    estimator: &mut LocalCostEstimator,
    scans: &SceneObstacleCache,
    paths: &PathCostCache,
    radius: i32,
    world: &W,
    start: WorldPoint,
    end: WorldPoint,
) -> Option<i32> {
    if start == end {
        return Some(1);
    }
    if let Some(hit) = paths.get(start, end) {
        return Some(hit);
    }
    let cost = local_estimate(estimator, scans, radius, world, start, end)?;
    paths.put(start, end, cost);
    Some(cost)
}

#[allow(dead_code)]
fn _assert_send() {
    fn is_send<T: Send>() {}
    is_send::<Navigator>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::SimpleTraveler;
    use crate::resolver::RouteStatus;
    use crate::scene::{SceneObject, SceneSnapshot, WorldEvent};

    const DOOR: i32 = 1535;
    const TREE: i32 = 1276;

    fn p(x: i32, y: i32) -> WorldPoint {
        WorldPoint::new(x, y, 0)
    }

    fn navigator() -> Navigator {
        let config = NavConfig::default();
        let catalog = Arc::new(ObstacleCatalog::builtin(&config));
        Navigator::new(config, catalog)
    }

    /// A north-south wall at x=3240 with a closed door in it at y=3240.
    fn walled_scene() -> SceneSnapshot {
        let mut s = SceneSnapshot::new(3200, 3200);
        for y in 3200..3304 {
            s.collision_mut().set_blocked(p(3240, y), true);
        }
        s.add_object(SceneObject::new(DOOR, p(3240, 3240)));
        s
    }

    #[test]
    fn local_cost_crosses_catalog_doors() {
        let s = walled_scene();
        let mut nav = navigator();
        assert_eq!(nav.estimate_local_cost(&s, p(3238, 3240), p(3242, 3240)), Some(1 + 3 + 1 + 1));
        assert_eq!(nav.estimate_local_cost(&s, p(3238, 3240), p(3238, 3240)), Some(0));
        assert_eq!(nav.estimate_local_cost(&s, p(3238, 3240), WorldPoint::new(3242, 3240, 1)), None);
    }

    #[test]
    fn path_cost_is_cached_and_dropped_on_large_moves() {
        let s = SceneSnapshot::new(3200, 3200);
        let mut nav = navigator();
        assert_eq!(nav.path_cost(&s, p(3210, 3210), p(3210, 3210)), Some(1));
        assert_eq!(nav.path_cost(&s, p(3210, 3210), p(3220, 3215)), Some(10));
        assert_eq!(nav.path_cost(&s, p(3210, 3210), p(3220, 3215)), Some(10));
        assert_eq!(nav.local_searches(), 1);
        assert_eq!(nav.path_cache().len(), 1);

        nav.observe_position(p(3210, 3210));
        nav.observe_position(p(3220, 3210));
        assert_eq!(nav.path_cache().len(), 1);
        nav.observe_position(p(3250, 3210));
        assert!(nav.path_cache().is_empty());
    }

    #[test]
    fn route_without_graph_is_unavailable() {
        let s = SceneSnapshot::new(3200, 3200);
        let mut nav = navigator();
        let r = nav.route(&s, p(3210, 3210), p(3220, 3210), &SimpleTraveler::default());
        assert_eq!(r.status, RouteStatus::SystemNotAvailable);
    }

    #[test]
    fn short_trips_are_served_locally() {
        let s = walled_scene();
        let mut nav = navigator().with_graph(Arc::new(WorldGraph::default()));
        let r = nav.route(&s, p(3238, 3240), p(3242, 3240), &SimpleTraveler::default());
        assert_eq!(r.status, RouteStatus::FullPathAvailable);
        assert!(r.graph_path.is_none());
        assert_eq!(r.estimated_ticks, Some(6));

        // Outside the loaded scene the local search declines and the empty
        // graph leaves both ends isolated; they are close enough to walk.
        let far = nav.best_effort_route(&s, p(1000, 1000), p(1010, 1000), &SimpleTraveler::default());
        assert_eq!(far.status, RouteStatus::BothEndsManual);
        assert_eq!(far.first_mile_distance, Some(10));
    }

    #[test]
    fn nearest_object_goes_through_the_cache() {
        let mut s = SceneSnapshot::new(3200, 3200);
        s.collision_mut().set_blocked(p(3215, 3210), true);
        s.add_object(SceneObject::new(TREE, p(3215, 3210)));
        let mut nav = navigator();
        let m = nav.find_nearest_reachable_object(&s, p(3210, 3210), &[TREE], 15).unwrap();
        assert_eq!(m.entity.location, p(3215, 3210));
        assert_eq!(m.cost, 5);
        assert!(!nav.path_cache().is_empty());
        assert!(nav.find_nearest_reachable_object(&s, p(3210, 3210), &[TREE + 1], 15).is_none());
    }

    #[test]
    fn nearest_actor_melee() {
        let mut s = SceneSnapshot::new(3200, 3200);
        s.add_actor(crate::scene::Actor {
            index: 1,
            id: 3029,
            name: Some("Goblin".into()),
            location: p(3215, 3210),
            dead: false,
            visible: true,
        });
        let mut nav = navigator();
        let m = nav
            .find_nearest_reachable_actor(&s, p(3210, 3210), &[3029], None, 15, InteractionModel::Melee)
            .unwrap();
        assert_eq!(m.entity.index, 1);
        assert_eq!(m.cost, 5);
        assert_eq!(m.interaction_tile.x, 3214);
    }

    #[test]
    fn training_ranking_with_and_without_bank() {
        let mut s = SceneSnapshot::new(3200, 3200);
        for x in [3220, 3210] {
            s.add_object(SceneObject::new(TREE, p(x, 3200)));
        }
        let cache = TrainingSpotCache::with_dir(None, 10, chrono::Duration::days(7));
        let mut nav = navigator().with_training_cache(cache);

        let plain = nav.rank_training_candidates(&s, &[TREE], p(3200, 3200), 25, false);
        let costs: Vec<i32> = plain.iter().map(|c| c.cost).collect();
        assert_eq!(costs, vec![10, 20]);
        let again = nav.rank_training_candidates(&s, &[TREE], p(3200, 3200), 25, false);
        assert_eq!(again, plain);
        assert_eq!(nav.training_cache().map(|c| c.stats().memory_hits), Some(1));

        // No graph, so no bank: falls back to the walk from the reference.
        let fallback = nav.rank_training_candidates(&s, &[TREE], p(3200, 3200), 25, true);
        assert!(fallback.iter().all(|c| !c.is_banking()));

        let graph = WorldGraph::from_json_str(
            r#"{"nodes": [{"id": "bank", "x": 3200, "y": 3200, "type": "bank"}], "edges": []}"#,
        )
        .unwrap();
        let mut nav = navigator().with_graph(Arc::new(graph));
        let banked = nav.rank_training_candidates(&s, &[TREE], p(3205, 3205), 25, true);
        assert_eq!(banked[0], RankedCandidate::with_banking(p(3210, 3200), TREE, 20, 10));
        assert_eq!(banked[1].cost, 40);
    }

    #[test]
    fn bank_outside_the_window_still_ranks() {
        let mut s = SceneSnapshot::new(3200, 3200);
        for x in [3210, 3220] {
            s.add_object(SceneObject::new(TREE, p(x, 3200)));
        }
        let graph = WorldGraph::from_json_str(
            r#"{"nodes": [{"id": "bank", "x": 3400, "y": 3200, "type": "bank"}], "edges": []}"#,
        )
        .unwrap();
        let mut nav = navigator().with_graph(Arc::new(graph));
        let banked = nav.rank_training_candidates(&s, &[TREE], p(3215, 3200), 25, true);
        assert_eq!(banked.len(), 2);
        assert_eq!(banked[0], RankedCandidate::with_banking(p(3220, 3200), TREE, 360, 180));
        assert_eq!(banked[1].bank_distance, 190);
    }

    #[test]
    fn travel_estimate_rides_the_graph() {
        let graph = WorldGraph::from_json_str(
            r#"{
                "nodes": [
                    {"id": "a", "x": 3200, "y": 3200, "type": "generic"},
                    {"id": "b", "x": 3600, "y": 3200, "type": "bank"}
                ],
                "edges": [{"from": "a", "to": "b", "type": "teleport", "cost_ticks": 12, "bidirectional": true}]
            }"#,
        )
        .unwrap();
        assert_eq!(travel_estimate(Some(&graph), p(3205, 3200), p(3602, 3200)), Some(5 + 12 + 2));
        assert_eq!(travel_estimate(None, p(3205, 3200), p(3602, 3200)), Some(397));
        assert_eq!(travel_estimate(None, p(3205, 3200), WorldPoint::new(3205, 3200, 1)), None);
    }

    #[test]
    fn event_sink_reaches_shared_caches() {
        let s = walled_scene();
        let nav = navigator();
        nav.scan_cache().obstacles_nearby(&s, p(3238, 3240), 20);
        assert_eq!(nav.scan_cache().len(), 1);
        nav.event_sink().on_event(&WorldEvent::SceneReloaded);
        assert!(nav.scan_cache().is_empty());
    }
}
