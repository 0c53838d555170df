use std::sync::Arc;

use navweb_core::cache::TrainingSpotCache;
use navweb_core::obstacles::{ObstacleDefinition, ObstacleType};
use navweb_core::scene::SceneObject;
use navweb_core::{
    NavConfig, Navigator, ObstacleCatalog, RouteStatus, SceneSnapshot, SimpleTraveler, Suggestion, WorldGraph,
    WorldPoint,
};

const TREE: i32 = 1276;

fn p(x: i32, y: i32) -> WorldPoint {
    WorldPoint::new(x, y, 0)
}

fn navigator() -> Navigator {
    let config = NavConfig::default();
    let catalog = Arc::new(ObstacleCatalog::builtin(&config));
    Navigator::new(config, catalog)
}

#[test]
fn bidirectional_edge_loads_as_two_equal_edges() {
    let g = WorldGraph::from_json_str(
        r#"{
            "version": "2.1",
            "nodes": [
                {"id": "A", "x": 3200, "y": 3200, "type": "generic"},
                {"id": "B", "x": 3210, "y": 3200, "type": "GENERIC"}
            ],
            "edges": [{"from": "A", "to": "B", "type": "walk", "cost_ticks": 5, "bidirectional": true}]
        }"#,
    )
    .unwrap();
    assert_eq!(g.version(), "2.1");
    assert_eq!(g.edge_count(), 2);
    let ab = g.edge("A", "B").unwrap();
    let ba = g.edge("B", "A").unwrap();
    assert_eq!((ab.cost, ba.cost), (5, 5));
    assert_eq!(ba.from_location, Some(p(3210, 3200)));
    assert_eq!(ba.to_location, Some(p(3200, 3200)));
}

#[test]
fn unknown_edge_type_fails_the_load() {
    let err = WorldGraph::from_json_str(
        r#"{
            "nodes": [
                {"id": "A", "x": 3200, "y": 3200, "type": "generic"},
                {"id": "B", "x": 3210, "y": 3200, "type": "generic"}
            ],
            "edges": [{"from": "A", "to": "B", "type": "hovercraft", "cost_ticks": 5}]
        }"#,
    );
    assert!(err.is_err());
}

#[test]
fn shortcut_success_rate_grows_with_level() {
    let def = ObstacleDefinition::new("Log balance", ObstacleType::AgilityShortcut, vec![23274], "Walk-across", 4)
        .with_success(40, 0.9, 0.02, 5);
    assert_eq!(def.success_rate(39), 0.0);
    assert!((def.success_rate(40) - 0.90).abs() < 1e-9);
    assert!((def.success_rate(60) - 0.98).abs() < 1e-9);
    assert_eq!(def.success_rate(99), 1.0);
    let rates: Vec<f64> = (1..=99).map(|l| def.success_rate(l)).collect();
    assert!(rates.windows(2).all(|w| w[0] <= w[1]));
    assert!(rates.iter().all(|r| (0.0..=1.0).contains(r)));
}

#[test]
fn far_from_every_node_is_completely_isolated() {
    let scene = SceneSnapshot::unloaded();
    let traveler = SimpleTraveler::default();

    let mut empty = navigator().with_graph(Arc::new(WorldGraph::default()));
    let r = empty.route(&scene, p(2200, 3200), p(4200, 3200), &traveler);
    assert_eq!(r.status, RouteStatus::CompletelyIsolated);

    let lone = WorldGraph::from_json_str(r#"{"nodes": [{"id": "lumbridge", "x": 3200, "y": 3200, "type": "teleport"}]}"#)
        .unwrap();
    let mut nav = navigator().with_graph(Arc::new(lone));
    let r = nav.route(&scene, p(2200, 3200), p(4200, 3200), &traveler);
    assert_eq!(r.status, RouteStatus::CompletelyIsolated);
    assert_eq!(r.first_mile_distance, Some(1000));
    assert_eq!(r.last_mile_distance, Some(1000));
    assert!(r.has_suggestion(Suggestion::UseHomeTeleport));
}

#[test]
fn toll_gate_needs_the_gold_cushion() {
    let g = WorldGraph::from_json_str(
        r#"{
            "nodes": [
                {"id": "lumbridge_gate", "x": 3267, "y": 3228, "type": "transport"},
                {"id": "al_kharid_gate", "x": 3268, "y": 3228, "type": "transport"}
            ],
            "edges": [{
                "from": "lumbridge_gate", "to": "al_kharid_gate", "type": "toll", "cost_ticks": 3,
                "metadata": {"toll_cost": 10, "min_gold": 500}
            }]
        }"#,
    )
    .unwrap();
    let scene = SceneSnapshot::unloaded();
    let mut nav = navigator().with_graph(Arc::new(g));

    let rich = nav.route(&scene, p(3267, 3228), p(3268, 3228), &SimpleTraveler::default().with_gold(600));
    assert_eq!(rich.status, RouteStatus::FullPathAvailable);
    assert_eq!(rich.estimated_ticks, Some(3));
    assert!(rich.graph_path.as_ref().is_some_and(|p| p.requires_toll_gates()));

    let poor = nav.route(&scene, p(3267, 3228), p(3268, 3228), &SimpleTraveler::default().with_gold(50));
    assert_eq!(poor.status, RouteStatus::NoPathBetweenNodes);

    let quest = SimpleTraveler::default().with_quest("Prince Ali Rescue");
    let mut nav = navigator().with_graph(Arc::new(
        WorldGraph::from_json_str(
            r#"{
                "nodes": [
                    {"id": "a", "x": 3267, "y": 3228, "type": "transport"},
                    {"id": "b", "x": 3268, "y": 3228, "type": "transport"}
                ],
                "edges": [{
                    "from": "a", "to": "b", "type": "toll", "cost_ticks": 3,
                    "metadata": {"toll_cost": 10, "free_passage_quest": "Prince Ali Rescue"}
                }]
            }"#,
        )
        .unwrap(),
    ));
    assert!(nav.route(&scene, p(3267, 3228), p(3268, 3228), &quest).is_fully_navigable());
}

#[test]
fn picks_farther_reachable_object_over_walled_ones() {
    let mut scene = SceneSnapshot::new(3200, 3200);
    for at in [p(3213, 3210), p(3210, 3207)] {
        scene.collision_mut().set_blocked(at, true);
        scene.add_object(SceneObject::new(TREE, at));
        for dx in -2..=2 {
            for dy in -2..=2 {
                if dx == -2 || dx == 2 || dy == -2 || dy == 2 {
                    scene.collision_mut().set_blocked(at.translate(dx, dy), true);
                }
            }
        }
    }
    let far = p(3230, 3210);
    scene.collision_mut().set_blocked(far, true);
    scene.add_object(SceneObject::new(TREE, far));

    let mut nav = navigator();
    let m = nav.find_nearest_reachable_object(&scene, p(3209, 3211), &[TREE], 30).unwrap();
    assert_eq!(m.entity.location, far);
    let walk = nav.estimate_local_cost(&scene, p(3209, 3211), m.interaction_tile).unwrap();
    assert_eq!(m.cost, walk + 1);
}

#[test]
fn rankings_persist_across_navigators() {
    let dir = tempfile::tempdir().unwrap();
    let cache = || TrainingSpotCache::with_dir(Some(dir.path().to_path_buf()), 10, chrono::Duration::days(7));

    let mut scene = SceneSnapshot::new(3200, 3200);
    for x in [3212, 3204, 3208] {
        scene.add_object(SceneObject::new(TREE, p(x, 3202)));
    }
    let mut first = navigator().with_training_cache(cache());
    let ranked = first.rank_training_candidates(&scene, &[TREE], p(3200, 3202), 25, false);
    let xs: Vec<i32> = ranked.iter().map(|c| c.location.x).collect();
    assert_eq!(xs, vec![3204, 3208, 3212]);

    // A fresh navigator over an empty scene still answers from disk.
    let mut second = navigator().with_training_cache(cache());
    let again = second.rank_training_candidates(&SceneSnapshot::new(3200, 3200), &[TREE], p(3200, 3202), 25, false);
    assert_eq!(again, ranked);
    let stats = second.training_cache().map(|c| c.stats()).unwrap();
    assert_eq!((stats.memory_misses, stats.file_hits), (1, 1));
}
