//! The host's loaded region: objects, actors and collision, plus the event
//! feed that keeps derived indexes coherent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::collision::movement::decode_walls;
use crate::collision::{CollisionOracle, GridCollision, PLANES, SCENE_SIZE};
use crate::models::{HasWorldLocation, WorldPoint};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Scenery with a rectangular footprint anchored at its south-west tile.
    Game { size_x: i32, size_y: i32 },
    Wall,
    Decorative,
    Ground,
}

impl Default for ObjectKind {
    fn default() -> Self {
        ObjectKind::Game { size_x: 1, size_y: 1 }
    }
}

impl ObjectKind {
    /// Boundary objects are interacted with from either side of the edge they sit on.
    pub fn is_boundary(&self) -> bool {
        matches!(self, ObjectKind::Wall | ObjectKind::Decorative)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: i32,
    #[serde(default)]
    pub kind: ObjectKind,
    pub location: WorldPoint,
    #[serde(default)]
    pub orientation: i32,
    #[serde(default = "default_true")]
    pub visible: bool,
}

fn default_true() -> bool {
    true
}

impl SceneObject {
    pub fn new(id: i32, location: WorldPoint) -> Self {
        Self { id, kind: ObjectKind::default(), location, orientation: 0, visible: true }
    }

    pub fn with_kind(mut self, kind: ObjectKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_orientation(mut self, orientation: i32) -> Self {
        self.orientation = orientation;
        self
    }

    /// Width and height in tiles after rotation. Odd orientations swap the axes.
    /// Each side is clamped to `1..=SCENE_SIZE`.
    pub fn dimensions(&self) -> (i32, i32) {
        match self.kind {
            ObjectKind::Game { size_x, size_y } => {
                let (w, h) = (size_x.clamp(1, SCENE_SIZE), size_y.clamp(1, SCENE_SIZE));
                if self.orientation % 2 != 0 {
                    (h, w)
                } else {
                    (w, h)
                }
            }
            _ => (1, 1),
        }
    }

    /// Every tile the object occupies.
    pub fn footprint(&self) -> Vec<WorldPoint> {
        let (w, h) = self.dimensions();
        let mut tiles = Vec::with_capacity((w * h) as usize);
        for dy in 0..h {
            for dx in 0..w {
                tiles.push(self.location.translate(dx, dy));
            }
        }
        tiles
    }
}

impl HasWorldLocation for SceneObject {
    fn world_location(&self) -> WorldPoint {
        self.location
    }
}

/// A mobile entity (npc or player).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub index: u32,
    pub id: i32,
    #[serde(default)]
    pub name: Option<String>,
    pub location: WorldPoint,
    #[serde(default)]
    pub dead: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl HasWorldLocation for Actor {
    fn world_location(&self) -> WorldPoint {
        self.location
    }
}

/// Read access to the currently materialized region.
pub trait Scene {
    fn is_loaded(&self) -> bool;

    /// South-west corner of the loaded window.
    fn base(&self) -> (i32, i32);

    fn objects(&self) -> Box<dyn Iterator<Item = &SceneObject> + '_>;

    /// Live object with `id` at `tile`, if it is still there.
    fn object_at(&self, id: i32, tile: WorldPoint) -> Option<&SceneObject>;

    fn actors(&self) -> &[Actor];

    fn contains(&self, p: WorldPoint) -> bool {
        if !self.is_loaded() {
            return false;
        }
        let (bx, by) = self.base();
        let (Some(lx), Some(ly)) = (p.x.checked_sub(bx), p.y.checked_sub(by)) else {
            return false;
        };
        (0..SCENE_SIZE).contains(&lx) && (0..SCENE_SIZE).contains(&ly) && (0..PLANES).contains(&p.plane)
    }

    fn both_loaded(&self, a: WorldPoint, b: WorldPoint) -> bool {
        self.contains(a) && self.contains(b)
    }
}

/// Everything a query needs from the host: scene contents and collision.
pub trait WorldView: Scene + CollisionOracle {}

impl<T: Scene + CollisionOracle + ?Sized> WorldView for T {}

/// Notifications from the host's event feed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldEvent {
    ObjectSpawned {
        id: i32,
        tile: WorldPoint,
        #[serde(default)]
        kind: ObjectKind,
        #[serde(default)]
        orientation: i32,
    },
    ObjectDespawned {
        id: i32,
        tile: WorldPoint,
    },
    SceneReloaded,
}

/// Receiver of world events. Implementors synchronise internally; events may
/// arrive on a different thread than queries.
pub trait WorldEventSink: Send + Sync {
    fn on_event(&self, event: &WorldEvent);
}

/// Forwards each event to every registered sink in order.
#[derive(Clone, Default)]
pub struct EventFanout {
    sinks: Vec<std::sync::Arc<dyn WorldEventSink>>,
}

impl EventFanout {
    pub fn new(sinks: Vec<std::sync::Arc<dyn WorldEventSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl WorldEventSink for EventFanout {
    fn on_event(&self, event: &WorldEvent) {
        for s in &self.sinks {
            s.on_event(event);
        }
    }
}

/// In-memory scene posted by a host. Implements both [`Scene`] and
/// [`CollisionOracle`].
#[derive(Clone, Debug)]
pub struct SceneSnapshot {
    collision: GridCollision,
    objects: IndexMap<WorldPoint, Vec<SceneObject>>,
    actors: Vec<Actor>,
    loaded: bool,
}

impl SceneSnapshot {
    pub fn new(base_x: i32, base_y: i32) -> Self {
        Self {
            collision: GridCollision::new(base_x, base_y),
            objects: IndexMap::new(),
            actors: Vec::new(),
            loaded: true,
        }
    }

    /// A snapshot that reports nothing loaded.
    pub fn unloaded() -> Self {
        Self { loaded: false, ..Self::new(0, 0) }
    }

    pub fn collision(&self) -> &GridCollision {
        &self.collision
    }

    pub fn collision_mut(&mut self) -> &mut GridCollision {
        &mut self.collision
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.entry(object.location).or_default().push(object);
    }

    pub fn remove_object(&mut self, id: i32, tile: WorldPoint) -> bool {
        let Some(list) = self.objects.get_mut(&tile) else { return false };
        let before = list.len();
        list.retain(|o| o.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.objects.shift_remove(&tile);
        }
        removed
    }

    pub fn add_actor(&mut self, actor: Actor) {
        self.actors.push(actor);
    }

    pub fn set_actors(&mut self, actors: Vec<Actor>) {
        self.actors = actors;
    }

    pub fn object_count(&self) -> usize {
        self.objects.values().map(Vec::len).sum()
    }

    /// Apply a host event to the snapshot contents.
    pub fn apply(&mut self, event: &WorldEvent) {
        match event {
            WorldEvent::ObjectSpawned { id, tile, kind, orientation } => {
                self.add_object(SceneObject {
                    id: *id,
                    kind: *kind,
                    location: *tile,
                    orientation: *orientation,
                    visible: true,
                });
            }
            WorldEvent::ObjectDespawned { id, tile } => {
                self.remove_object(*id, *tile);
            }
            WorldEvent::SceneReloaded => {}
        }
    }
}

impl Scene for SceneSnapshot {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn base(&self) -> (i32, i32) {
        self.collision.base()
    }

    fn objects(&self) -> Box<dyn Iterator<Item = &SceneObject> + '_> {
        Box::new(self.objects.values().flatten())
    }

    fn object_at(&self, id: i32, tile: WorldPoint) -> Option<&SceneObject> {
        self.objects.get(&tile)?.iter().find(|o| o.id == id)
    }

    fn actors(&self) -> &[Actor] {
        &self.actors
    }
}

impl CollisionOracle for SceneSnapshot {
    fn is_blocked(&self, x: i32, y: i32, plane: i32) -> bool {
        self.collision.is_blocked(x, y, plane)
    }
    fn can_move_north(&self, x: i32, y: i32, plane: i32) -> bool {
        self.collision.can_move_north(x, y, plane)
    }
    fn can_move_south(&self, x: i32, y: i32, plane: i32) -> bool {
        self.collision.can_move_south(x, y, plane)
    }
    fn can_move_east(&self, x: i32, y: i32, plane: i32) -> bool {
        self.collision.can_move_east(x, y, plane)
    }
    fn can_move_west(&self, x: i32, y: i32, plane: i32) -> bool {
        self.collision.can_move_west(x, y, plane)
    }
    fn can_interact(&self, from: WorldPoint, to: WorldPoint) -> bool {
        self.collision.can_interact(from, to)
    }
    fn has_line_of_sight(&self, from: WorldPoint, to: WorldPoint) -> bool {
        self.collision.has_line_of_sight(from, to)
    }
}

/// A wall entry in the wire form of a snapshot: a tile plus its sides, e.g. `"north,east"`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WallDto {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub plane: i32,
    pub sides: String,
}

/// Wire form of a [`SceneSnapshot`] as posted by a host.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SceneSnapshotDto {
    pub base_x: i32,
    pub base_y: i32,
    #[serde(default)]
    pub blocked: Vec<WorldPoint>,
    #[serde(default)]
    pub walls: Vec<WallDto>,
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub actors: Vec<Actor>,
}

impl From<SceneSnapshotDto> for SceneSnapshot {
    fn from(dto: SceneSnapshotDto) -> Self {
        let mut snap = SceneSnapshot::new(dto.base_x, dto.base_y);
        for p in dto.blocked {
            snap.collision.set_blocked(p, true);
        }
        for w in dto.walls {
            snap.collision.add_wall(WorldPoint::new(w.x, w.y, w.plane), decode_walls(&w.sides));
        }
        for o in dto.objects {
            snap.add_object(o);
        }
        snap.actors = dto.actors;
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_rotates_with_odd_orientation() {
        let o = SceneObject::new(1, WorldPoint::new(10, 10, 0))
            .with_kind(ObjectKind::Game { size_x: 3, size_y: 1 });
        assert_eq!(o.dimensions(), (3, 1));
        assert_eq!(o.footprint().len(), 3);
        let rotated = o.clone().with_orientation(1);
        assert_eq!(rotated.dimensions(), (1, 3));
        assert!(rotated.footprint().contains(&WorldPoint::new(10, 12, 0)));
        let wall = SceneObject::new(2, WorldPoint::new(1, 1, 0)).with_kind(ObjectKind::Wall);
        assert_eq!(wall.footprint(), vec![WorldPoint::new(1, 1, 0)]);
    }

    #[test]
    fn oversized_objects_are_clamped_to_the_window() {
        let huge = SceneObject::new(1, WorldPoint::new(3200, 3200, 0))
            .with_kind(ObjectKind::Game { size_x: i32::MAX, size_y: -7 });
        assert_eq!(huge.dimensions(), (SCENE_SIZE, 1));
        assert_eq!(huge.footprint().len(), SCENE_SIZE as usize);
        let edge = SceneObject::new(1, WorldPoint::new(i32::MAX - 1, 0, 0))
            .with_kind(ObjectKind::Game { size_x: 4, size_y: 1 });
        assert_eq!(edge.footprint().last(), Some(&WorldPoint::new(i32::MAX, 0, 0)));
    }

    #[test]
    fn snapshot_applies_events() {
        let mut s = SceneSnapshot::new(3200, 3200);
        let tile = WorldPoint::new(3210, 3210, 0);
        s.apply(&WorldEvent::ObjectSpawned { id: 7, tile, kind: ObjectKind::default(), orientation: 0 });
        assert!(s.object_at(7, tile).is_some());
        assert_eq!(s.object_count(), 1);
        s.apply(&WorldEvent::ObjectDespawned { id: 7, tile });
        assert!(s.object_at(7, tile).is_none());
        assert_eq!(s.object_count(), 0);
    }

    #[test]
    fn contains_tracks_window_and_load_state() {
        let s = SceneSnapshot::new(3200, 3200);
        assert!(s.contains(WorldPoint::new(3200, 3303, 3)));
        assert!(!s.contains(WorldPoint::new(3304, 3210, 0)));
        assert!(!SceneSnapshot::unloaded().contains(WorldPoint::new(0, 0, 0)));
    }

    #[test]
    fn dto_builds_collision_and_contents() {
        let dto: SceneSnapshotDto = serde_json::from_value(serde_json::json!({
            "base_x": 3200, "base_y": 3200,
            "blocked": [{"x": 3205, "y": 3205}],
            "walls": [{"x": 3210, "y": 3210, "sides": "north"}],
            "objects": [{"id": 1530, "kind": "wall", "location": {"x": 3210, "y": 3210}}],
            "actors": [{"index": 1, "id": 3010, "name": "Guard", "location": {"x": 3212, "y": 3212}}]
        }))
        .unwrap();
        let s = SceneSnapshot::from(dto);
        assert!(s.is_blocked(3205, 3205, 0));
        assert!(!s.can_move_north(3210, 3210, 0));
        assert_eq!(s.object_at(1530, WorldPoint::new(3210, 3210, 0)).map(|o| o.kind), Some(ObjectKind::Wall));
        assert_eq!(s.actors().len(), 1);
        assert!(s.actors()[0].visible);
    }

    #[test]
    fn world_events_use_tagged_json() {
        let e: WorldEvent = serde_json::from_str(
            r#"{"type":"object_spawned","id":5,"tile":{"x":1,"y":2,"plane":0}}"#,
        )
        .unwrap();
        assert!(matches!(e, WorldEvent::ObjectSpawned { id: 5, kind: ObjectKind::Game { size_x: 1, size_y: 1 }, .. }));
        let r: WorldEvent = serde_json::from_str(r#"{"type":"scene_reloaded"}"#).unwrap();
        assert_eq!(r, WorldEvent::SceneReloaded);
    }
}
