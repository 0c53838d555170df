//! Grid-bucketed index of scene objects for radius queries.
//!
//! The loaded window is split into 8x8 cells (13 per axis, 4 planes). The
//! index is built lazily on the first query after a region change and then
//! kept current from spawn/despawn events. Queries resolve every hit back to
//! a live object; entries whose object has gone are skipped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tracing::debug;

use crate::collision::{PLANES, SCENE_SIZE};
use crate::models::WorldPoint;
use crate::scene::{Scene, SceneObject, WorldEvent, WorldEventSink};

pub const CELL_SIZE: i32 = 8;
pub const CELLS_PER_AXIS: i32 = SCENE_SIZE / CELL_SIZE;
const CELLS_PER_PLANE: i32 = CELLS_PER_AXIS * CELLS_PER_AXIS;
const TOTAL_CELLS: usize = (CELLS_PER_PLANE * PLANES) as usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct CellEntry {
    id: i32,
    local_x: u8,
    local_y: u8,
}

#[derive(Default)]
struct IndexState {
    base: Option<(i32, i32)>,
    cells: Vec<Vec<CellEntry>>,
    entries: usize,
}

impl IndexState {
    fn is_built(&self) -> bool {
        self.base.is_some()
    }

    fn slot(&self, p: WorldPoint) -> Option<(usize, u8, u8)> {
        let (bx, by) = self.base?;
        let lx = p.x.checked_sub(bx)?;
        let ly = p.y.checked_sub(by)?;
        if !(0..SCENE_SIZE).contains(&lx) || !(0..SCENE_SIZE).contains(&ly) || !(0..PLANES).contains(&p.plane) {
            return None;
        }
        Some((cell_index(p.plane, lx / CELL_SIZE, ly / CELL_SIZE), lx as u8, ly as u8))
    }

    fn insert(&mut self, id: i32, p: WorldPoint) {
        if let Some((cell, local_x, local_y)) = self.slot(p) {
            self.cells[cell].push(CellEntry { id, local_x, local_y });
            self.entries += 1;
        }
    }

    fn remove(&mut self, id: i32, p: WorldPoint) {
        if let Some((cell, local_x, local_y)) = self.slot(p) {
            let bucket = &mut self.cells[cell];
            if let Some(pos) = bucket.iter().position(|e| *e == CellEntry { id, local_x, local_y }) {
                bucket.swap_remove(pos);
                self.entries -= 1;
            }
        }
    }
}

#[inline]
fn cell_index(plane: i32, cx: i32, cy: i32) -> usize {
    (plane * CELLS_PER_PLANE + cy * CELLS_PER_AXIS + cx) as usize
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SpatialStats {
    pub queries: u64,
    pub cells_scanned: u64,
    pub rebuilds: u64,
    pub entries: usize,
}

pub struct SpatialIndex {
    state: RwLock<IndexState>,
    queries: AtomicU64,
    cells_scanned: AtomicU64,
    rebuilds: AtomicU64,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            queries: AtomicU64::new(0),
            cells_scanned: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Rebuild from the scene when the index is empty or the region origin moved.
    fn ensure_built<S: Scene + ?Sized>(&self, scene: &S) {
        let base = scene.base();
        if self.read().base == Some(base) {
            return;
        }
        let mut st = self.write();
        if st.base == Some(base) {
            return;
        }
        st.base = Some(base);
        st.cells = vec![Vec::new(); TOTAL_CELLS];
        st.entries = 0;
        for o in scene.objects() {
            st.insert(o.id, o.location);
        }
        self.rebuilds.fetch_add(1, Ordering::Relaxed);
        debug!(base_x = base.0, base_y = base.1, entries = st.entries, "spatial index rebuilt");
    }

    /// Live objects within Chebyshev `radius` of `center` whose id passes `filter`.
    pub fn find_nearby<S, F>(&self, scene: &S, center: WorldPoint, radius: i32, filter: F) -> Vec<SceneObject>
    where
        S: Scene + ?Sized,
        F: Fn(i32) -> bool,
    {
        let mut out = Vec::new();
        self.visit_nearby(scene, center, radius, &filter, |o| {
            out.push(o.clone());
            true
        });
        out
    }

    pub fn find_nearby_ids<S: Scene + ?Sized>(
        &self,
        scene: &S,
        center: WorldPoint,
        radius: i32,
        ids: &[i32],
    ) -> Vec<SceneObject> {
        self.find_nearby(scene, center, radius, |id| ids.contains(&id))
    }

    pub fn has_object_nearby<S: Scene + ?Sized>(&self, scene: &S, center: WorldPoint, radius: i32, ids: &[i32]) -> bool {
        let mut found = false;
        self.visit_nearby(scene, center, radius, &|id| ids.contains(&id), |_| {
            found = true;
            false
        });
        found
    }

    /// Core scan. `visit` returns false to stop early.
    fn visit_nearby<'s, S, F, V>(&self, scene: &'s S, center: WorldPoint, radius: i32, filter: &F, mut visit: V)
    where
        S: Scene + ?Sized,
        F: Fn(i32) -> bool,
        V: FnMut(&'s SceneObject) -> bool,
    {
        if !scene.is_loaded() || radius < 0 || !(0..PLANES).contains(&center.plane) {
            return;
        }
        self.ensure_built(scene);
        self.queries.fetch_add(1, Ordering::Relaxed);

        let st = self.read();
        let Some((bx, by)) = st.base else { return };
        // Window-local bounds in i64: centre and radius come from callers unchecked.
        let (lx, ly, r) = (center.x as i64 - bx as i64, center.y as i64 - by as i64, radius as i64);
        let size = SCENE_SIZE as i64;
        if lx + r < 0 || ly + r < 0 || lx - r >= size || ly - r >= size {
            return;
        }
        let cell = |v: i64| (v.clamp(0, size - 1) / CELL_SIZE as i64) as i32;
        let (cx0, cx1) = (cell(lx - r), cell(lx + r));
        let (cy0, cy1) = (cell(ly - r), cell(ly + r));

        let mut scanned = 0u64;
        for cy in cy0..=cy1 {
            for cx in cx0..=cx1 {
                scanned += 1;
                for e in &st.cells[cell_index(center.plane, cx, cy)] {
                    if !filter(e.id) {
                        continue;
                    }
                    let tile = WorldPoint::new(bx + e.local_x as i32, by + e.local_y as i32, center.plane);
                    if tile.distance_to(&center) > radius {
                        continue;
                    }
                    // Stale entries (object already gone) are skipped.
                    let Some(obj) = scene.object_at(e.id, tile) else { continue };
                    if !visit(obj) {
                        self.cells_scanned.fetch_add(scanned, Ordering::Relaxed);
                        return;
                    }
                }
            }
        }
        self.cells_scanned.fetch_add(scanned, Ordering::Relaxed);
    }

    /// Drop the index; the next query rebuilds it.
    pub fn invalidate(&self) {
        let mut st = self.write();
        st.base = None;
        st.cells.clear();
        st.entries = 0;
    }

    pub fn is_built(&self) -> bool {
        self.read().is_built()
    }

    pub fn len(&self) -> usize {
        self.read().entries
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> SpatialStats {
        SpatialStats {
            queries: self.queries.load(Ordering::Relaxed),
            cells_scanned: self.cells_scanned.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl WorldEventSink for SpatialIndex {
    fn on_event(&self, event: &WorldEvent) {
        match event {
            WorldEvent::SceneReloaded => self.invalidate(),
            WorldEvent::ObjectSpawned { id, tile, .. } => {
                let mut st = self.write();
                // Events before the first build are covered by the build itself.
                if st.is_built() {
                    st.insert(*id, *tile);
                }
            }
            WorldEvent::ObjectDespawned { id, tile } => {
                let mut st = self.write();
                if st.is_built() {
                    st.remove(*id, *tile);
                }
            }
        }
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<SpatialIndex>();
}
