use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};

use arc_swap::ArcSwapOption;
use navweb_core::{Navigator, SceneSnapshot, WorldEvent, WorldEventSink, WorldGraph};

/// Shared handles for every request. The graph is swapped atomically on
/// reload; the scene and the navigator sit behind std locks that are never
/// held across an await.
#[derive(Clone)]
pub struct AppState {
    graph: Arc<ArcSwapOption<WorldGraph>>,
    graph_path: Option<PathBuf>,
    navigator: Arc<Mutex<Navigator>>,
    scene: Arc<RwLock<SceneSnapshot>>,
    events: Arc<dyn WorldEventSink>,
}

impl AppState {
    pub fn new(navigator: Navigator, graph: Option<WorldGraph>, graph_path: Option<PathBuf>) -> Self {
        let events = navigator.event_sink();
        Self {
            graph: Arc::new(ArcSwapOption::from(graph.map(Arc::new))),
            graph_path,
            navigator: Arc::new(Mutex::new(navigator)),
            scene: Arc::new(RwLock::new(SceneSnapshot::unloaded())),
            events,
        }
    }

    pub fn graph(&self) -> Option<Arc<WorldGraph>> {
        self.graph.load_full()
    }

    pub fn set_graph(&self, graph: WorldGraph) {
        self.graph.store(Some(Arc::new(graph)));
    }

    pub fn graph_path(&self) -> Option<&Path> {
        self.graph_path.as_deref()
    }

    pub fn scene(&self) -> RwLockReadGuard<'_, SceneSnapshot> {
        self.scene.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Install a new snapshot and tell the shared caches the scene changed.
    pub fn replace_scene(&self, snapshot: SceneSnapshot) {
        *self.scene.write().unwrap_or_else(|e| e.into_inner()) = snapshot;
        self.events.on_event(&WorldEvent::SceneReloaded);
    }

    /// Apply host events to the snapshot, then forward them to the caches.
    pub fn apply_events(&self, events: &[WorldEvent]) -> usize {
        {
            let mut scene = self.scene.write().unwrap_or_else(|e| e.into_inner());
            for e in events {
                scene.apply(e);
            }
        }
        for e in events {
            self.events.on_event(e);
        }
        events.len()
    }

    /// Run `f` with the navigator (pointed at the current graph) and the scene.
    /// Lock order: scene, then navigator.
    pub fn with_navigator<R>(&self, f: impl FnOnce(&mut Navigator, &SceneSnapshot) -> R) -> R {
        let scene = self.scene();
        let mut nav = self.navigator.lock().unwrap_or_else(|e| e.into_inner());
        nav.set_graph(self.graph());
        f(&mut nav, &scene)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("graph_loaded", &self.graph.load().is_some())
            .field("graph_path", &self.graph_path.as_ref().map(|p| p.display().to_string()))
            .finish()
    }
}
