//! Registry of traversable obstacles and floor transitions.
//!
//! A catalog is assembled once with [`ObstacleCatalogBuilder`] and is
//! read-only afterwards; share it through `Arc`.

pub mod definition;
pub mod registry;
pub mod shortcuts;
pub mod transitions;

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::info;

pub use definition::{DetectedObstacle, ObstacleDefinition, ObstacleType};
pub use shortcuts::ShortcutDescription;
pub use transitions::{PlaneTransition, TransitionDirection, TransitionType};

use crate::config::NavConfig;
use crate::error::Result;
use crate::models::WorldPoint;
use crate::scene::Scene;
use crate::spatial::SpatialIndex;

/// A transition object found in the loaded scene.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectedTransition {
    pub transition: PlaneTransition,
    pub object_id: i32,
    pub location: WorldPoint,
}

#[derive(Debug, Default)]
pub struct ObstacleCatalog {
    definitions: Vec<Arc<ObstacleDefinition>>,
    by_object: FxHashMap<i32, Arc<ObstacleDefinition>>,
    shortcuts: Vec<Arc<ObstacleDefinition>>,
    transitions: FxHashMap<i32, PlaneTransition>,
}

impl ObstacleCatalog {
    /// Built-in doors, gates and transitions; no shortcut table.
    pub fn builtin(config: &NavConfig) -> Self {
        ObstacleCatalogBuilder::new(config).with_builtin().build()
    }

    pub fn definition(&self, object_id: i32) -> Option<&Arc<ObstacleDefinition>> {
        self.by_object.get(&object_id)
    }

    pub fn is_known(&self, object_id: i32) -> bool {
        self.by_object.contains_key(&object_id)
    }

    /// Known obstacle or transition.
    pub fn contains(&self, object_id: i32) -> bool {
        self.is_known(object_id) || self.transitions.contains_key(&object_id)
    }

    /// Ticks to pass the obstacle, 0 when unknown.
    pub fn traversal_cost(&self, object_id: i32) -> i32 {
        self.definition(object_id).map(|d| d.traversal_cost).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[Arc<ObstacleDefinition>] {
        &self.definitions
    }

    pub fn shortcuts(&self) -> &[Arc<ObstacleDefinition>] {
        &self.shortcuts
    }

    pub fn shortcuts_near(&self, point: WorldPoint, max_distance: i32) -> Vec<Arc<ObstacleDefinition>> {
        self.shortcuts
            .iter()
            .filter(|d| d.location.map(|l| l.distance_to(&point) <= max_distance).unwrap_or(false))
            .cloned()
            .collect()
    }

    pub fn usable_shortcuts(&self, level: i32) -> Vec<Arc<ObstacleDefinition>> {
        self.shortcuts.iter().filter(|d| d.can_attempt(level)).cloned().collect()
    }

    /// Shortcuts the traveler can attempt whose failure rate stays within `risk`.
    pub fn safe_shortcuts(&self, level: i32, risk: f64) -> Vec<Arc<ObstacleDefinition>> {
        self.shortcuts
            .iter()
            .filter(|d| d.can_attempt(level) && !d.is_risky(level, risk))
            .cloned()
            .collect()
    }

    /// All shortcuts ordered by required level, lowest first.
    pub fn shortcuts_by_level(&self) -> Vec<Arc<ObstacleDefinition>> {
        let mut v = self.shortcuts.clone();
        v.sort_by_key(|d| d.required_level);
        v
    }

    pub fn max_required_level(&self) -> i32 {
        self.shortcuts.iter().map(|d| d.required_level).max().unwrap_or(0)
    }

    pub fn transition(&self, object_id: i32) -> Option<&PlaneTransition> {
        self.transitions.get(&object_id)
    }

    pub fn transitions_of_type(&self, kind: TransitionType) -> Vec<&PlaneTransition> {
        let mut v: Vec<_> = self.transitions.values().filter(|t| t.kind == kind).collect();
        v.sort_by_key(|t| t.object_id);
        v
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// Known obstacles standing within `radius` of `center`.
    pub fn find_obstacles_nearby<S: Scene + ?Sized>(
        &self,
        index: &SpatialIndex,
        scene: &S,
        center: WorldPoint,
        radius: i32,
    ) -> Vec<DetectedObstacle> {
        index
            .find_nearby(scene, center, radius, |id| self.by_object.contains_key(&id))
            .into_iter()
            .filter_map(|o| {
                let def = self.by_object.get(&o.id)?;
                Some(DetectedObstacle {
                    blocked: def.is_blocked_state(o.id),
                    definition: Arc::clone(def),
                    object_id: o.id,
                    location: o.location,
                })
            })
            .collect()
    }

    pub fn find_transitions_nearby<S: Scene + ?Sized>(
        &self,
        index: &SpatialIndex,
        scene: &S,
        center: WorldPoint,
        radius: i32,
    ) -> Vec<DetectedTransition> {
        index
            .find_nearby(scene, center, radius, |id| self.transitions.contains_key(&id))
            .into_iter()
            .filter_map(|o| {
                let t = self.transitions.get(&o.id)?;
                Some(DetectedTransition { transition: t.clone(), object_id: o.id, location: o.location })
            })
            .collect()
    }

    /// Closest transition heading toward `target_plane`.
    pub fn find_transition_to_plane<S: Scene + ?Sized>(
        &self,
        index: &SpatialIndex,
        scene: &S,
        from: WorldPoint,
        target_plane: i32,
        radius: i32,
    ) -> Option<DetectedTransition> {
        let diff = target_plane - from.plane;
        if diff == 0 {
            return None;
        }
        self.find_transitions_nearby(index, scene, from, radius)
            .into_iter()
            .filter(|t| t.transition.goes_toward(diff))
            .min_by_key(|t| t.location.distance_to(&from))
    }
}

/// Assembles a catalog. Later registrations for the same object id win.
pub struct ObstacleCatalogBuilder {
    config: NavConfig,
    obstacles: Vec<ObstacleDefinition>,
    shortcuts: Vec<ObstacleDefinition>,
    transitions: Vec<PlaneTransition>,
}

impl ObstacleCatalogBuilder {
    pub fn new(config: &NavConfig) -> Self {
        Self { config: config.clone(), obstacles: Vec::new(), shortcuts: Vec::new(), transitions: Vec::new() }
    }

    pub fn with_builtin(mut self) -> Self {
        self.obstacles.extend(registry::builtin_obstacles());
        self.transitions.extend(transitions::builtin_transitions());
        self
    }

    pub fn obstacle(mut self, def: ObstacleDefinition) -> Self {
        self.obstacles.push(def);
        self
    }

    pub fn transition(mut self, t: PlaneTransition) -> Self {
        self.transitions.push(t);
        self
    }

    pub fn shortcut_table(mut self, rows: &[ShortcutDescription]) -> Self {
        let cfg = &self.config;
        self.shortcuts.extend(rows.iter().map(|r| shortcuts::to_definition(r, cfg)));
        self
    }

    pub fn shortcut_table_json(self, json: &str) -> Result<Self> {
        let rows = shortcuts::parse_table(json)?;
        Ok(self.shortcut_table(&rows))
    }

    pub fn build(self) -> ObstacleCatalog {
        let mut cat = ObstacleCatalog::default();
        for def in self.obstacles {
            let def = Arc::new(def);
            for &id in &def.object_ids {
                cat.by_object.insert(id, Arc::clone(&def));
            }
            cat.definitions.push(def);
        }
        for def in self.shortcuts {
            let def = Arc::new(def);
            for &id in &def.object_ids {
                cat.by_object.insert(id, Arc::clone(&def));
            }
            cat.shortcuts.push(Arc::clone(&def));
            cat.definitions.push(def);
        }
        for t in self.transitions {
            cat.transitions.insert(t.object_id, t);
        }
        info!(
            obstacles = cat.definitions.len(),
            shortcuts = cat.shortcuts.len(),
            transitions = cat.transitions.len(),
            "obstacle catalog built"
        );
        cat
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<ObstacleCatalog>();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneObject, SceneSnapshot};

    const TABLE: &str = r#"[
        {"name": "LUMBRIDGE_RIVER_STONES", "level": 1, "description": "Stepping stones", "obstacle_ids": [9000], "location": {"x": 3210, "y": 3210}},
        {"name": "SEERS_LOG", "level": 40, "description": "Log balance", "obstacle_ids": [9001], "location": {"x": 3300, "y": 3300}},
        {"name": "HARD_PIPE", "level": 70, "description": "Squeeze through pipe", "obstacle_ids": [9002]}
    ]"#;

    fn catalog() -> ObstacleCatalog {
        ObstacleCatalogBuilder::new(&NavConfig::default())
            .with_builtin()
            .shortcut_table_json(TABLE)
            .unwrap()
            .build()
    }

    #[test]
    fn builtin_lookups() {
        let c = catalog();
        assert!(c.is_known(1535));
        assert!(c.is_known(1534));
        assert_eq!(c.traversal_cost(23271), 3);
        assert_eq!(c.traversal_cost(999_999), 0);
        let toll = c.definition(2882).unwrap();
        assert_eq!(toll.kind, ObstacleType::TollGate);
        assert_eq!(toll.free_passage_quest.as_deref(), Some(registry::PRINCE_ALI_RESCUE));
        // Later rows override earlier ones for the same id.
        assert_eq!(c.transition(16671).unwrap().direction, TransitionDirection::Up);
        assert_eq!(c.transition(16671).unwrap().kind, TransitionType::Stairs);
        assert_eq!(c.transition(16672).unwrap().direction, TransitionDirection::Bidirectional);
        assert!(c.contains(3241));
    }

    #[test]
    fn shortcut_queries() {
        let c = catalog();
        assert_eq!(c.shortcuts().len(), 3);
        assert_eq!(c.max_required_level(), 70);
        assert_eq!(c.usable_shortcuts(45).len(), 2);
        // Level 40 log: 10% failure is not above a 10% threshold.
        assert_eq!(c.safe_shortcuts(40, 0.10).len(), 2);
        assert_eq!(c.safe_shortcuts(40, 0.05).len(), 1);
        assert_eq!(c.shortcuts_near(WorldPoint::new(3212, 3212, 0), 5).len(), 1);
        let levels: Vec<i32> = c.shortcuts_by_level().iter().map(|d| d.required_level).collect();
        assert_eq!(levels, vec![1, 40, 70]);
    }

    #[test]
    fn scene_scans_resolve_definitions() {
        let c = catalog();
        let mut s = SceneSnapshot::new(3200, 3200);
        s.add_object(SceneObject::new(1535, WorldPoint::new(3210, 3210, 0)));
        s.add_object(SceneObject::new(1534, WorldPoint::new(3212, 3210, 0)));
        s.add_object(SceneObject::new(4, WorldPoint::new(3211, 3210, 0)));
        s.add_object(SceneObject::new(17386, WorldPoint::new(3215, 3210, 0)));
        s.add_object(SceneObject::new(11789, WorldPoint::new(3207, 3210, 0)));
        let idx = SpatialIndex::new();
        let found = c.find_obstacles_nearby(&idx, &s, WorldPoint::new(3210, 3210, 0), 5);
        assert_eq!(found.len(), 2);
        assert_eq!(found.iter().filter(|d| d.blocked).count(), 1);

        let up = c.find_transition_to_plane(&idx, &s, WorldPoint::new(3210, 3210, 0), 1, 10).unwrap();
        // The bank ladder is closer than the dungeon exit ladder.
        assert_eq!(up.object_id, 11789);
        let down = c.find_transition_to_plane(&idx, &s, WorldPoint::new(3210, 3210, 0), -1, 10).unwrap();
        assert_eq!(down.object_id, 11789);
        assert!(c.find_transition_to_plane(&idx, &s, WorldPoint::new(3210, 3210, 0), 0, 10).is_none());
    }
}
