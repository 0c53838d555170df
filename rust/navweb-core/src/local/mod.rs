//! Bounded, obstacle-aware grid search over the loaded scene window.
//!
//! All state lives in fixed-size buffers indexed by the tile offset inside
//! the 104x104 window. A generation counter marks which entries belong to
//! the current search, so nothing is cleared or allocated per call.
//!
//! Not reentrant: one search at a time per estimator.

use aligned_vec::AVec;
use tracing::{debug, trace};

use crate::collision::movement::SCAN_ORDER;
use crate::collision::{SCENE_SIZE, SCENE_TILES};
use crate::config::DEFAULT_LOCAL_RADIUS;
use crate::models::WorldPoint;
use crate::obstacles::DetectedObstacle;
use crate::scene::WorldView;

/// Initial ring buffer capacity: every tile once plus slack for re-enqueued
/// tiles. The ring doubles when a search needs more.
pub const QUEUE_CAPACITY: usize = SCENE_TILES + 256;

/// FIFO of `(tile index, cost)` labels over two parallel ring buffers.
struct RingQueue {
    idx: AVec<u32>,
    cost: AVec<i32>,
    head: usize,
    len: usize,
}

impl RingQueue {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { idx: AVec::__from_elem(64, 0, capacity), cost: AVec::__from_elem(64, 0, capacity), head: 0, len: 0 }
    }

    fn capacity(&self) -> usize {
        self.idx.len()
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    fn push(&mut self, i: usize, c: i32) {
        if self.len == self.capacity() {
            self.grow();
        }
        let cap = self.capacity();
        let tail = (self.head + self.len) % cap;
        self.idx[tail] = i as u32;
        self.cost[tail] = c;
        self.len += 1;
    }

    fn pop(&mut self) -> Option<(usize, i32)> {
        if self.len == 0 {
            return None;
        }
        let out = (self.idx[self.head] as usize, self.cost[self.head]);
        self.head = (self.head + 1) % self.capacity();
        self.len -= 1;
        Some(out)
    }

    /// Doubles the ring, unrolling the live labels to the front.
    fn grow(&mut self) {
        let cap = self.capacity();
        let mut idx = AVec::__from_elem(64, 0, cap * 2);
        let mut cost = AVec::__from_elem(64, 0, cap * 2);
        for k in 0..self.len {
            let j = (self.head + k) % cap;
            idx[k] = self.idx[j];
            cost[k] = self.cost[j];
        }
        self.idx = idx;
        self.cost = cost;
        self.head = 0;
        debug!(capacity = cap * 2, "local search queue grown");
    }
}

struct SearchBuffers {
    visited_gen: AVec<u32>,
    cost: AVec<i32>,
    obstacle_gen: AVec<u32>,
    obstacle_cost: AVec<i32>,
    queue: RingQueue,
    generation: u32,
    obstacle_generation: u32,
}

impl SearchBuffers {
    fn new(queue_capacity: usize) -> Self {
        Self {
            visited_gen: AVec::__from_elem(64, 0, SCENE_TILES),
            cost: AVec::__from_elem(64, i32::MAX, SCENE_TILES),
            obstacle_gen: AVec::__from_elem(64, 0, SCENE_TILES),
            obstacle_cost: AVec::__from_elem(64, 0, SCENE_TILES),
            queue: RingQueue::with_capacity(queue_capacity),
            generation: 0,
            obstacle_generation: 0,
        }
    }

    fn next_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.visited_gen.fill(0);
            self.generation = 1;
        }
    }

    fn next_obstacle_generation(&mut self) {
        self.obstacle_generation = self.obstacle_generation.wrapping_add(1);
        if self.obstacle_generation == 0 {
            self.obstacle_gen.fill(0);
            self.obstacle_generation = 1;
        }
    }

    #[inline]
    fn best(&self, i: usize) -> i32 {
        if self.visited_gen[i] == self.generation { self.cost[i] } else { i32::MAX }
    }

    #[inline]
    fn set_best(&mut self, i: usize, c: i32) {
        self.visited_gen[i] = self.generation;
        self.cost[i] = c;
    }

    #[inline]
    fn obstacle(&self, i: usize) -> i32 {
        if self.obstacle_gen[i] == self.obstacle_generation { self.obstacle_cost[i] } else { 0 }
    }
}

pub struct LocalCostEstimator {
    buf: SearchBuffers,
    max_distance: i32,
    searches: u64,
}

impl Default for LocalCostEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalCostEstimator {
    pub fn new() -> Self {
        Self::with_max_distance(DEFAULT_LOCAL_RADIUS)
    }

    pub fn with_max_distance(max_distance: i32) -> Self {
        Self::with_queue_capacity(max_distance, QUEUE_CAPACITY)
    }

    fn with_queue_capacity(max_distance: i32, queue_capacity: usize) -> Self {
        Self { buf: SearchBuffers::new(queue_capacity), max_distance, searches: 0 }
    }

    pub fn max_distance(&self) -> i32 {
        self.max_distance
    }

    /// Number of grid searches actually run.
    pub fn searches(&self) -> u64 {
        self.searches
    }

    /// Tick cost from `start` to `end` inside the loaded window.
    ///
    /// `obstacles` are the doors and gates around `start`; their tiles may be
    /// crossed for `1 + traversal_cost`. Returns `None` across planes, beyond
    /// the search radius, outside the loaded scene, or when unreachable.
    pub fn estimate<W: WorldView + ?Sized>(
        &mut self,
        world: &W,
        obstacles: &[DetectedObstacle],
        start: WorldPoint,
        end: WorldPoint,
    ) -> Option<i32> {
        if start == end {
            return Some(0);
        }
        if start.plane != end.plane || start.distance_to(&end) > self.max_distance {
            return None;
        }
        if !world.both_loaded(start, end) {
            return None;
        }
        let base = world.base();
        self.load_obstacles(base, obstacles);
        self.searches += 1;
        let result = self.search(world, base, start, end);
        trace!(%start, %end, cost = ?result, "local search");
        result
    }

    fn load_obstacles(&mut self, (bx, by): (i32, i32), obstacles: &[DetectedObstacle]) {
        self.buf.next_obstacle_generation();
        for o in obstacles {
            if !o.definition.is_door_or_gate() {
                continue;
            }
            let (Some(lx), Some(ly)) = (o.location.x.checked_sub(bx), o.location.y.checked_sub(by)) else {
                continue;
            };
            if (0..SCENE_SIZE).contains(&lx) && (0..SCENE_SIZE).contains(&ly) {
                let i = (ly * SCENE_SIZE + lx) as usize;
                self.buf.obstacle_gen[i] = self.buf.obstacle_generation;
                self.buf.obstacle_cost[i] = o.definition.traversal_cost.max(1);
            }
        }
    }

    /// Label-correcting breadth-first search. Plain tiles relax in FIFO order;
    /// obstacle tiles can make a later label cheaper, in which case the tile
    /// is queued again and stale entries are dropped on dequeue.
    fn search<W: WorldView + ?Sized>(&mut self, world: &W, (bx, by): (i32, i32), start: WorldPoint, end: WorldPoint) -> Option<i32> {
        let buf = &mut self.buf;
        buf.next_generation();
        let plane = start.plane;
        let size = SCENE_SIZE as usize;
        let start_i = ((start.y - by) * SCENE_SIZE + (start.x - bx)) as usize;
        let end_i = ((end.y - by) * SCENE_SIZE + (end.x - bx)) as usize;

        buf.queue.clear();
        buf.queue.push(start_i, 0);
        buf.set_best(start_i, 0);
        let mut best_end = i32::MAX;

        while let Some((cur, cur_cost)) = buf.queue.pop() {
            if cur_cost > buf.best(cur) || cur_cost >= best_end {
                continue;
            }
            if cur == end_i {
                best_end = cur_cost;
                continue;
            }

            let cx = (cur % size) as i32;
            let cy = (cur / size) as i32;
            let wx = cx + bx;
            let wy = cy + by;
            let on_door = buf.obstacle(cur) > 0 && world.is_blocked(wx, wy, plane);

            for m in SCAN_ORDER {
                let nx = cx + m.dx;
                let ny = cy + m.dy;
                if !(0..SCENE_SIZE).contains(&nx) || !(0..SCENE_SIZE).contains(&ny) {
                    continue;
                }
                let ni = (ny * SCENE_SIZE + nx) as usize;
                let (tx, ty) = (wx + m.dx, wy + m.dy);

                let diagonal = m.dx != 0 && m.dy != 0;
                let step = if world.is_blocked(tx, ty, plane) {
                    let oc = buf.obstacle(ni);
                    if oc == 0 || (diagonal && !corner_clear(world, (wx, wy), (tx, ty), plane)) {
                        continue;
                    }
                    1 + oc
                } else if on_door && !diagonal {
                    // The door tile's own collision stands in for its edges.
                    1
                } else if world.can_step(wx, wy, tx, ty, plane) {
                    1
                } else if !diagonal {
                    // A closed door is a wall on the door tile; crossing it from
                    // either side costs the door.
                    match buf.obstacle(ni).max(buf.obstacle(cur)) {
                        0 => continue,
                        oc => 1 + oc,
                    }
                } else {
                    continue;
                };

                let next = cur_cost + step;
                if next >= buf.best(ni) || next >= best_end {
                    continue;
                }
                buf.set_best(ni, next);
                buf.queue.push(ni, next);
            }
        }

        (best_end != i32::MAX).then_some(best_end)
    }
}

/// Diagonal step from `a` onto the blocked door tile `b`: both flanking tiles
/// must be open and no wall may sit on the four edges around the corner, the
/// same test a diagonal step between open tiles gets.
fn corner_clear<W: WorldView + ?Sized>(world: &W, (ax, ay): (i32, i32), (bx, by): (i32, i32), plane: i32) -> bool {
    let (a, b) = (WorldPoint::new(ax, ay, plane), WorldPoint::new(bx, by, plane));
    [WorldPoint::new(bx, ay, plane), WorldPoint::new(ax, by, plane)]
        .into_iter()
        .all(|f| !world.is_blocked_at(f) && world.can_interact(a, f) && world.can_interact(f, b))
}
