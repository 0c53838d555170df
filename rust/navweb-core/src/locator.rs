//! Nearest *reachable* entity search.
//!
//! Candidates come from the spatial index (objects) or the actor list, sorted
//! by straight-line distance. Only the closest `initial_batch` are path-costed
//! up front and the cheapest of those wins; when none of them can be reached
//! the rest are tried in distance order and the first reachable one is taken.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collision::movement::SCAN_ORDER;
use crate::collision::SCENE_SIZE;
use crate::config::DEFAULT_INITIAL_BATCH;
use crate::models::WorldPoint;
use crate::scene::{Actor, SceneObject, WorldView};
use crate::spatial::SpatialIndex;

/// How an actor is engaged.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionModel {
    /// Must stand next to the target.
    #[default]
    Melee,
    /// Needs line of sight within `range` tiles.
    Ranged { range: i32 },
}

/// A found entity, the tile to act from, and the total cost including the
/// interaction itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Located<T> {
    pub entity: T,
    pub interaction_tile: WorldPoint,
    pub cost: i32,
    pub distance: i32,
}

pub type ObjectMatch = Located<SceneObject>;
pub type ActorMatch = Located<Actor>;

struct Candidate<T> {
    item: T,
    distance: i32,
    visible: bool,
}

type FootprintKey = (i32, i32, WorldPoint);

pub struct EntityLocator<'a, W: WorldView + ?Sized> {
    world: &'a W,
    index: &'a SpatialIndex,
    initial_batch: usize,
}

impl<'a, W: WorldView + ?Sized> EntityLocator<'a, W> {
    pub fn new(world: &'a W, index: &'a SpatialIndex) -> Self {
        Self { world, index, initial_batch: DEFAULT_INITIAL_BATCH }
    }

    pub fn with_initial_batch(mut self, n: usize) -> Self {
        self.initial_batch = n.max(1);
        self
    }

    /// Closest reachable object with one of `ids` within `radius` of `start`.
    /// `path_cost` answers walking cost between two tiles.
    pub fn find_nearest_reachable_object<P>(
        &self,
        start: WorldPoint,
        ids: &[i32],
        radius: i32,
        mut path_cost: P,
    ) -> Option<ObjectMatch>
    where
        P: FnMut(WorldPoint, WorldPoint) -> Option<i32>,
    {
        if ids.is_empty() || radius < 0 {
            return None;
        }
        let candidates: Vec<_> = self
            .index
            .find_nearby(self.world, start, radius, |id| ids.contains(&id))
            .into_iter()
            .map(|o| Candidate { distance: o.location.distance_to(&start), visible: o.visible, item: o })
            .collect();
        let mut footprints: FxHashMap<FootprintKey, Vec<WorldPoint>> = FxHashMap::default();
        let found = self.select(candidates, |o| self.object_cost(start, o, &mut footprints, &mut path_cost));
        debug!(%start, ?ids, found = found.is_some(), "nearest reachable object");
        found
    }

    /// Closest reachable live actor with one of `ids` (and `name`, when given).
    pub fn find_nearest_reachable_actor<P>(
        &self,
        start: WorldPoint,
        ids: &[i32],
        name: Option<&str>,
        radius: i32,
        model: InteractionModel,
        mut path_cost: P,
    ) -> Option<ActorMatch>
    where
        P: FnMut(WorldPoint, WorldPoint) -> Option<i32>,
    {
        if ids.is_empty() || radius < 0 {
            return None;
        }
        if let InteractionModel::Ranged { range } = model {
            if range < 1 {
                return None;
            }
        }
        let candidates = self
            .actor_candidates(start, ids, name, radius)
            .into_iter()
            .map(|a| Candidate { distance: a.location.distance_to(&start), visible: a.visible, item: a.clone() })
            .collect();
        let found = self.select(candidates, |a| match model {
            InteractionModel::Melee => self.melee_cost(start, a.location, &mut path_cost),
            // No attack tile lies further out than the loaded window.
            InteractionModel::Ranged { range } => {
                self.ranged_cost(start, a.location, range.min(SCENE_SIZE), &mut path_cost)
            }
        });
        debug!(%start, ?ids, ?model, found = found.is_some(), "nearest reachable actor");
        found
    }

    /// Closest matching object by straight-line distance alone.
    pub fn nearest_object(&self, start: WorldPoint, ids: &[i32], radius: i32) -> Option<SceneObject> {
        if ids.is_empty() {
            return None;
        }
        self.index
            .find_nearby(self.world, start, radius, |id| ids.contains(&id))
            .into_iter()
            .min_by_key(|o| (o.location.distance_to(&start), !o.visible))
    }

    /// Closest matching live actor by straight-line distance alone.
    pub fn nearest_actor(&self, start: WorldPoint, ids: &[i32], name: Option<&str>, radius: i32) -> Option<Actor> {
        if ids.is_empty() {
            return None;
        }
        self.actor_candidates(start, ids, name, radius)
            .into_iter()
            .min_by_key(|a| (a.location.distance_to(&start), !a.visible))
            .cloned()
    }

    fn actor_candidates(&self, start: WorldPoint, ids: &[i32], name: Option<&str>, radius: i32) -> Vec<&'a Actor> {
        let world: &'a W = self.world;
        world
            .actors()
            .iter()
            .filter(|a| {
                !a.dead
                    && ids.contains(&a.id)
                    && name.map_or(true, |n| a.name.as_deref().is_some_and(|an| an.eq_ignore_ascii_case(n)))
                    && a.location.plane == start.plane
                    && a.location.distance_to(&start) <= radius
            })
            .collect()
    }

    /// Two-phase pick over distance-sorted candidates.
    fn select<T, E>(&self, mut candidates: Vec<Candidate<T>>, mut eval: E) -> Option<Located<T>>
    where
        E: FnMut(&T) -> Option<(WorldPoint, i32)>,
    {
        candidates.sort_by(|a, b| a.distance.cmp(&b.distance).then(b.visible.cmp(&a.visible)));
        let total = candidates.len();
        let rest = candidates.split_off(self.initial_batch.min(total));

        let mut best: Option<(usize, WorldPoint, i32)> = None;
        for (i, c) in candidates.iter().enumerate() {
            if let Some((tile, cost)) = eval(&c.item) {
                if best.map_or(true, |(_, _, b)| cost < b) {
                    best = Some((i, tile, cost));
                }
            }
        }
        if let Some((i, tile, cost)) = best {
            let c = candidates.swap_remove(i);
            return Some(Located { entity: c.item, interaction_tile: tile, cost, distance: c.distance });
        }

        let batch = candidates.len();
        for (n, c) in rest.into_iter().enumerate() {
            if let Some((tile, cost)) = eval(&c.item) {
                debug!(batch, checked = n + 1, total, "reachable candidate found past initial batch");
                return Some(Located { entity: c.item, interaction_tile: tile, cost, distance: c.distance });
            }
        }
        None
    }

    fn object_cost<P>(
        &self,
        start: WorldPoint,
        object: &SceneObject,
        footprints: &mut FxHashMap<FootprintKey, Vec<WorldPoint>>,
        path_cost: &mut P,
    ) -> Option<(WorldPoint, i32)>
    where
        P: FnMut(WorldPoint, WorldPoint) -> Option<i32>,
    {
        let footprint: &Vec<WorldPoint> = footprints
            .entry((object.id, object.orientation, object.location))
            .or_insert_with(|| object.footprint());

        if footprint.contains(&start) {
            return Some((start, 1));
        }
        if footprint.iter().any(|t| t.distance_to(&start) <= 1 && self.world.can_interact(start, *t)) {
            return Some((start, 1));
        }

        let mut adjacent: Vec<WorldPoint> = footprint
            .iter()
            .flat_map(|t| SCAN_ORDER.into_iter().map(move |m| (t.translate(m.dx, m.dy), *t)))
            .filter(|(a, t)| !footprint.contains(a) && !self.world.is_blocked_at(*a) && self.world.can_interact(*a, *t))
            .map(|(a, _)| a)
            .collect();
        adjacent.sort_by_key(|a| (a.distance_to(&start), *a));
        adjacent.dedup();

        adjacent.into_iter().find_map(|a| path_cost(start, a).map(|c| (a, c + 1)))
    }

    fn melee_cost<P>(&self, start: WorldPoint, target: WorldPoint, path_cost: &mut P) -> Option<(WorldPoint, i32)>
    where
        P: FnMut(WorldPoint, WorldPoint) -> Option<i32>,
    {
        if start.distance_to(&target) <= 1 && self.world.can_interact(start, target) {
            return Some((start, 1));
        }
        let mut best: Option<(WorldPoint, i32)> = None;
        for m in SCAN_ORDER {
            let adj = target.translate(m.dx, m.dy);
            if self.world.is_blocked_at(adj) || !self.world.can_step_to(adj, target) {
                continue;
            }
            if let Some(c) = path_cost(start, adj) {
                if best.map_or(true, |(_, b)| c < b) {
                    best = Some((adj, c));
                }
            }
        }
        best.map(|(t, c)| (t, c + 1))
    }

    fn ranged_cost<P>(&self, start: WorldPoint, target: WorldPoint, range: i32, path_cost: &mut P) -> Option<(WorldPoint, i32)>
    where
        P: FnMut(WorldPoint, WorldPoint) -> Option<i32>,
    {
        if start.distance_to(&target) <= range {
            if let Some(pos) = self.attack_position(start, target, range) {
                if pos == start {
                    return Some((start, 1));
                }
                if let Some(c) = path_cost(start, pos) {
                    return Some((pos, c + 1));
                }
            }
        }

        // Widen from range-2 out to range; the first ring with a reachable
        // tile decides.
        for r in (range - 2).max(1)..=range {
            let mut best: Option<(WorldPoint, i32)> = None;
            for dx in -r..=r {
                for dy in -r..=r {
                    if dx.abs() != r && dy.abs() != r {
                        continue;
                    }
                    let cand = target.translate(dx, dy);
                    if self.world.is_blocked_at(cand) || !self.world.has_line_of_sight(cand, target) {
                        continue;
                    }
                    if let Some(c) = path_cost(start, cand) {
                        if best.map_or(true, |(_, b)| c < b) {
                            best = Some((cand, c));
                        }
                    }
                }
            }
            if let Some((t, c)) = best {
                return Some((t, c + 1));
            }
        }
        None
    }

    /// Where to attack from without a long walk: the current tile when it
    /// has range and sight, else the closest walkable neighbour that does.
    pub fn attack_position(&self, start: WorldPoint, target: WorldPoint, range: i32) -> Option<WorldPoint> {
        if range < 1 || start.plane != target.plane {
            return None;
        }
        let distance = start.distance_to(&target);
        if distance <= range && self.world.has_line_of_sight(start, target) {
            return Some(start);
        }
        if distance > range.saturating_add(1) {
            return None;
        }
        SCAN_ORDER
            .into_iter()
            .map(|m| start.translate(m.dx, m.dy))
            .filter(|adj| {
                adj.distance_to(&target) <= range
                    && self.world.can_step_to(start, *adj)
                    && self.world.has_line_of_sight(*adj, target)
            })
            .min_by_key(|adj| adj.distance_to(&target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::movement::WALL_EAST;
    use crate::local::LocalCostEstimator;
    use crate::scene::SceneSnapshot;

    const TREE: i32 = 1276;

    fn p(x: i32, y: i32) -> WorldPoint {
        WorldPoint::new(x, y, 0)
    }

    fn ring(scene: &mut SceneSnapshot, center: WorldPoint, r: i32) {
        for dx in -r..=r {
            for dy in -r..=r {
                if dx.abs() == r || dy.abs() == r {
                    scene.collision_mut().set_blocked(center.translate(dx, dy), true);
                }
            }
        }
    }

    fn tree(scene: &mut SceneSnapshot, at: WorldPoint) {
        scene.collision_mut().set_blocked(at, true);
        scene.add_object(SceneObject::new(TREE, at));
    }

    fn actor(id: i32, at: WorldPoint) -> Actor {
        Actor { index: 0, id, name: Some("Goblin".into()), location: at, dead: false, visible: true }
    }

    #[test]
    fn farther_reachable_object_beats_closer_walled_ones() {
        let mut scene = SceneSnapshot::new(3200, 3200);
        for at in [p(3214, 3210), p(3210, 3214)] {
            tree(&mut scene, at);
            ring(&mut scene, at, 2);
        }
        tree(&mut scene, p(3225, 3210));
        let index = SpatialIndex::new();
        let mut est = LocalCostEstimator::new();
        let start = p(3210, 3210);

        let locator = EntityLocator::new(&scene, &index);
        let m = locator
            .find_nearest_reachable_object(start, &[TREE], 20, |a, b| est.estimate(&scene, &[], a, b))
            .unwrap();
        assert_eq!(m.entity.location, p(3225, 3210));
        assert_eq!(m.interaction_tile.x, 3224);
        let walk = LocalCostEstimator::new().estimate(&scene, &[], start, m.interaction_tile).unwrap();
        assert_eq!(m.cost, walk + 1);

        // A batch of one still falls through to the reachable candidate.
        let narrow = EntityLocator::new(&scene, &index).with_initial_batch(1);
        let m = narrow
            .find_nearest_reachable_object(start, &[TREE], 20, |a, b| est.estimate(&scene, &[], a, b))
            .unwrap();
        assert_eq!(m.entity.location, p(3225, 3210));
    }

    #[test]
    fn adjacent_object_costs_one() {
        let mut scene = SceneSnapshot::new(3200, 3200);
        tree(&mut scene, p(3211, 3211));
        let index = SpatialIndex::new();
        let m = EntityLocator::new(&scene, &index)
            .find_nearest_reachable_object(p(3210, 3210), &[TREE], 5, |_, _| None)
            .unwrap();
        assert_eq!((m.cost, m.interaction_tile), (1, p(3210, 3210)));
        assert!(EntityLocator::new(&scene, &index).find_nearest_reachable_object(p(3210, 3210), &[], 5, |_, _| None).is_none());
    }

    #[test]
    fn melee_walks_around_a_wall() {
        let mut scene = SceneSnapshot::new(3200, 3200);
        let start = p(3210, 3210);
        scene.add_actor(actor(3029, p(3211, 3210)));
        let index = SpatialIndex::new();
        let mut est = LocalCostEstimator::new();

        let m = EntityLocator::new(&scene, &index)
            .find_nearest_reachable_actor(start, &[3029], None, 10, InteractionModel::Melee, |a, b| est.estimate(&scene, &[], a, b))
            .unwrap();
        assert_eq!(m.cost, 1);

        scene.collision_mut().add_wall(start, WALL_EAST);
        let m = EntityLocator::new(&scene, &index)
            .find_nearest_reachable_actor(start, &[3029], Some("goblin"), 10, InteractionModel::Melee, |a, b| {
                est.estimate(&scene, &[], a, b)
            })
            .unwrap();
        assert_eq!(m.interaction_tile, p(3211, 3209));
        assert_eq!(m.cost, 3);
    }

    #[test]
    fn ranged_uses_current_tile_or_nearest_ring() {
        let mut scene = SceneSnapshot::new(3200, 3200);
        let start = p(3210, 3210);
        scene.add_actor(actor(3029, p(3214, 3210)));
        scene.add_actor(actor(3030, p(3220, 3210)));
        let index = SpatialIndex::new();
        let mut est = LocalCostEstimator::new();
        let ranged = InteractionModel::Ranged { range: 7 };

        let locator = EntityLocator::new(&scene, &index);
        let near = locator
            .find_nearest_reachable_actor(start, &[3029], None, 15, ranged, |a, b| est.estimate(&scene, &[], a, b))
            .unwrap();
        assert_eq!((near.interaction_tile, near.cost), (start, 1));

        let far = locator
            .find_nearest_reachable_actor(start, &[3030], None, 15, ranged, |a, b| est.estimate(&scene, &[], a, b))
            .unwrap();
        assert_eq!(far.interaction_tile, p(3215, 3205));
        assert_eq!(far.cost, 6);
        assert!(locator
            .find_nearest_reachable_actor(start, &[3030], None, 15, InteractionModel::Ranged { range: 0 }, |_, _| Some(1))
            .is_none());
    }

    #[test]
    fn unbounded_radius_and_range_stay_inside_the_window() {
        let mut scene = SceneSnapshot::new(3200, 3200);
        let start = p(3210, 3210);
        tree(&mut scene, p(3215, 3210));
        scene.add_actor(actor(3030, p(3220, 3210)));
        let index = SpatialIndex::new();
        let mut est = LocalCostEstimator::new();
        let locator = EntityLocator::new(&scene, &index);

        let m = locator
            .find_nearest_reachable_object(start, &[TREE], i32::MAX, |a, b| est.estimate(&scene, &[], a, b))
            .unwrap();
        assert_eq!(m.cost, 5);

        let ranged = InteractionModel::Ranged { range: i32::MAX };
        let a = locator
            .find_nearest_reachable_actor(start, &[3030], None, i32::MAX, ranged, |a, b| est.estimate(&scene, &[], a, b))
            .unwrap();
        assert_eq!((a.interaction_tile, a.cost), (start, 1));
        assert!(locator.attack_position(start, p(3220, 3210), i32::MAX).is_some());
    }

    #[test]
    fn distance_only_helpers() {
        let mut scene = SceneSnapshot::new(3200, 3200);
        tree(&mut scene, p(3215, 3210));
        tree(&mut scene, p(3207, 3211));
        let mut dead = actor(3029, p(3211, 3210));
        dead.dead = true;
        scene.add_actor(dead);
        scene.add_actor(actor(3029, p(3213, 3210)));
        let index = SpatialIndex::new();
        let locator = EntityLocator::new(&scene, &index);
        assert_eq!(locator.nearest_object(p(3210, 3210), &[TREE], 10).unwrap().location, p(3207, 3211));
        assert_eq!(locator.nearest_actor(p(3210, 3210), &[3029], None, 10).unwrap().location, p(3213, 3210));
        assert!(locator.nearest_actor(p(3210, 3210), &[3029], Some("Guard"), 10).is_none());
    }
}
