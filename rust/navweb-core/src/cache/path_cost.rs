//! Memoized local path costs keyed by a packed (start, end) pair.
//!
//! An entry is authoritative while it is younger than the TTL and the
//! tracked anchor has stayed within the drift threshold of the anchor
//! recorded when it was written. Moving the anchor by the threshold or more
//! drops everything.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::NavConfig;
use crate::models::WorldPoint;

const COORD_MASK: u64 = 0xFFF;
const PLANE_MASK: u64 = 0x3;

/// `(sx, sy, sz, ex, ey, ez)` packed into the upper 52 bits of a u64.
/// Coordinates keep their low 12 bits, planes their low 2 bits.
#[inline]
pub fn pack_key(start: WorldPoint, end: WorldPoint) -> u64 {
    ((start.x as u64 & COORD_MASK) << 52)
        | ((start.y as u64 & COORD_MASK) << 40)
        | ((start.plane as u64 & PLANE_MASK) << 38)
        | ((end.x as u64 & COORD_MASK) << 26)
        | ((end.y as u64 & COORD_MASK) << 14)
        | ((end.plane as u64 & PLANE_MASK) << 12)
}

#[inline]
pub fn unpack_key(key: u64) -> (WorldPoint, WorldPoint) {
    let f = |shift: u32, mask: u64| ((key >> shift) & mask) as i32;
    (
        WorldPoint::new(f(52, COORD_MASK), f(40, COORD_MASK), f(38, PLANE_MASK)),
        WorldPoint::new(f(26, COORD_MASK), f(14, COORD_MASK), f(12, PLANE_MASK)),
    )
}

#[derive(Clone, Debug)]
struct Entry {
    cost: i32,
    path: Option<Vec<WorldPoint>>,
    written: Instant,
    anchor: WorldPoint,
}

#[derive(Default)]
struct State {
    entries: FxHashMap<u64, Entry>,
    anchor: Option<WorldPoint>,
}

pub struct PathCostCache {
    state: Mutex<State>,
    ttl: Duration,
    drift: i32,
}

impl PathCostCache {
    pub fn new(config: &NavConfig) -> Self {
        Self::with_limits(config.path_cache_ttl(), config.path_cache_drift)
    }

    pub fn with_limits(ttl: Duration, drift: i32) -> Self {
        Self { state: Mutex::new(State::default()), ttl, drift }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn moved_too_far(&self, from: WorldPoint, to: WorldPoint) -> bool {
        from.distance_to(&to) >= self.drift
    }

    fn fresh<'a>(&self, st: &'a mut State, start: WorldPoint, end: WorldPoint) -> Option<&'a Entry> {
        let key = pack_key(start, end);
        let current = st.anchor.unwrap_or(start);
        let stale = match st.entries.get(&key) {
            None => return None,
            Some(e) => e.written.elapsed() > self.ttl || self.moved_too_far(e.anchor, current),
        };
        if stale {
            st.entries.remove(&key);
            return None;
        }
        st.entries.get(&key)
    }

    pub fn get(&self, start: WorldPoint, end: WorldPoint) -> Option<i32> {
        let mut st = self.lock();
        self.fresh(&mut st, start, end).map(|e| e.cost)
    }

    pub fn get_path(&self, start: WorldPoint, end: WorldPoint) -> Option<Vec<WorldPoint>> {
        let mut st = self.lock();
        self.fresh(&mut st, start, end).and_then(|e| e.path.clone())
    }

    pub fn put(&self, start: WorldPoint, end: WorldPoint, cost: i32) {
        self.insert(start, end, cost, None);
    }

    /// Store a walked path; its cost is the number of steps.
    pub fn put_path(&self, start: WorldPoint, end: WorldPoint, path: Vec<WorldPoint>) {
        if path.is_empty() {
            return;
        }
        self.insert(start, end, path.len() as i32, Some(path));
    }

    fn insert(&self, start: WorldPoint, end: WorldPoint, cost: i32, path: Option<Vec<WorldPoint>>) {
        let mut st = self.lock();
        let anchor = st.anchor.unwrap_or(start);
        st.entries.insert(pack_key(start, end), Entry { cost, path, written: Instant::now(), anchor });
    }

    /// Track the anchor. The first call only records it; later calls drop
    /// every entry once the anchor has moved by the drift threshold or more.
    pub fn invalidate_if_moved(&self, position: WorldPoint) {
        let mut st = self.lock();
        let Some(last) = st.anchor else {
            st.anchor = Some(position);
            return;
        };
        if self.moved_too_far(last, position) {
            let cleared = st.entries.len();
            st.entries.clear();
            debug!(moved = last.distance_2d(&position), cleared, "path cost cache invalidated");
        }
        st.anchor = Some(position);
    }

    pub fn anchor(&self) -> Option<WorldPoint> {
        self.lock().anchor
    }

    pub fn clear(&self) {
        let mut st = self.lock();
        st.entries.clear();
        st.anchor = None;
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<PathCostCache>();
}
