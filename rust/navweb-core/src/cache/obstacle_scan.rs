//! Per-region memo of obstacle scans around the traveler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

use crate::config::NavConfig;
use crate::models::WorldPoint;
use crate::obstacles::{DetectedObstacle, ObstacleCatalog};
use crate::scene::{Scene, WorldEvent, WorldEventSink};
use crate::spatial::SpatialIndex;

#[inline]
pub fn scan_key(region: i32, plane: i32, radius: i32) -> u64 {
    ((region as u64) << 16) | (((plane as u64) & 0xFF) << 8) | (radius as u64 & 0xFF)
}

struct ScanEntry {
    obstacles: Arc<Vec<DetectedObstacle>>,
    center: WorldPoint,
}

#[derive(Default)]
struct ScanState {
    entries: FxHashMap<u64, ScanEntry>,
    last_position: Option<WorldPoint>,
    last_region: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScanCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

pub struct SceneObstacleCache {
    catalog: Arc<ObstacleCatalog>,
    index: Arc<SpatialIndex>,
    state: Mutex<ScanState>,
    hits: AtomicU64,
    misses: AtomicU64,
    drift_threshold: i32,
    entry_drift: i32,
    capacity: usize,
}

impl SceneObstacleCache {
    pub fn new(config: &NavConfig, catalog: Arc<ObstacleCatalog>, index: Arc<SpatialIndex>) -> Self {
        Self {
            catalog,
            index,
            state: Mutex::new(ScanState::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            drift_threshold: config.scene_drift_threshold,
            entry_drift: config.scene_entry_drift,
            capacity: config.scene_cache_entries.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Obstacles within `radius` of `center`, scanning the scene on a miss.
    pub fn obstacles_nearby<S: Scene + ?Sized>(&self, scene: &S, center: WorldPoint, radius: i32) -> Arc<Vec<DetectedObstacle>> {
        let key = scan_key(center.region_id(), center.plane, radius);
        {
            let mut st = self.lock();
            self.track(&mut st, center);
            if let Some(e) = st.entries.get(&key) {
                if e.center.distance_to(&center) <= self.entry_drift {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Arc::clone(&e.obstacles);
                }
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        let found = Arc::new(self.catalog.find_obstacles_nearby(&self.index, scene, center, radius));
        let elapsed = started.elapsed();
        if elapsed.as_millis() > 5 {
            debug!(ms = elapsed.as_millis() as u64, count = found.len(), %center, radius, "slow obstacle scan");
        }

        let mut st = self.lock();
        if st.entries.len() >= self.capacity {
            st.entries.clear();
            debug!("obstacle scan cache cleared at capacity");
        }
        st.entries.insert(key, ScanEntry { obstacles: Arc::clone(&found), center });
        found
    }

    /// Drop everything on a region change or a large move within a region.
    fn track(&self, st: &mut ScanState, position: WorldPoint) {
        let region = position.region_id();
        let region_changed = st.last_region.is_some_and(|r| r != region);
        let drifted = st.last_position.is_some_and(|p| p.distance_to(&position) > self.drift_threshold);
        if region_changed || drifted {
            let n = st.entries.len();
            st.entries.clear();
            if n > 0 {
                debug!(entries = n, region_changed, "obstacle scan cache invalidated");
            }
        }
        st.last_region = Some(region);
        st.last_position = Some(position);
    }

    pub fn invalidate(&self) {
        self.lock().entries.clear();
    }

    /// Forget entries and the tracked position, as after a scene reload.
    pub fn reset(&self) {
        let mut st = self.lock();
        st.entries.clear();
        st.last_position = None;
        st.last_region = None;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hit_rate(&self) -> f64 {
        let h = self.hits.load(Ordering::Relaxed);
        let m = self.misses.load(Ordering::Relaxed);
        if h + m == 0 {
            0.0
        } else {
            h as f64 / (h + m) as f64
        }
    }

    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> ScanCacheStats {
        ScanCacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            hit_rate: self.hit_rate(),
        }
    }
}

impl WorldEventSink for SceneObstacleCache {
    fn on_event(&self, event: &WorldEvent) {
        match event {
            WorldEvent::SceneReloaded => self.reset(),
            // A door opening or closing changes what a scan would return.
            WorldEvent::ObjectSpawned { id, .. } | WorldEvent::ObjectDespawned { id, .. } => {
                if self.catalog.is_known(*id) {
                    self.invalidate();
                }
            }
        }
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<SceneObstacleCache>();
}
