use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_INITIAL_BATCH: usize = 10;
pub const DEFAULT_SCENE_DRIFT: i32 = 40;
pub const DEFAULT_SCENE_ENTRY_DRIFT: i32 = 10;
pub const DEFAULT_SCENE_CACHE_ENTRIES: usize = 16;
pub const DEFAULT_PATH_CACHE_DRIFT: i32 = 25;
pub const DEFAULT_PATH_CACHE_TTL_MS: u64 = 60_000;
pub const DEFAULT_SHORTCUT_BASE_RATE: f64 = 0.90;
pub const DEFAULT_SHORTCUT_BONUS: f64 = 0.02;
pub const DEFAULT_SHORTCUT_BONUS_STEP: i32 = 5;
pub const DEFAULT_RISK_THRESHOLD: f64 = 0.10;
pub const DEFAULT_NEAR_NODE: i32 = 15;
pub const DEFAULT_ISOLATION: i32 = 100;
pub const DEFAULT_FIRST_MILE_WALK: i32 = 100;
pub const DEFAULT_LAST_MILE_WALK: i32 = 50;
pub const DEFAULT_TRAINING_TTL_DAYS: i64 = 7;
pub const DEFAULT_TRAINING_MEMORY: usize = 500;
pub const DEFAULT_TRAINING_RADIUS: i32 = 25;
pub const DEFAULT_TRAINING_TOP_N: usize = 10;
pub const DEFAULT_LOCAL_RADIUS: i32 = 52;

/// Tunables for every component. All of them are hand-tuned values carried
/// over from field use, so each one is overridable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Candidates path-costed before the locator falls back to first-reachable.
    pub initial_batch: usize,

    pub scene_drift_threshold: i32,
    pub scene_entry_drift: i32,
    pub scene_cache_entries: usize,

    pub path_cache_drift: i32,
    pub path_cache_ttl_ms: u64,

    pub shortcut_base_rate: f64,
    pub shortcut_bonus: f64,
    pub shortcut_bonus_step: i32,
    pub risk_threshold: f64,

    pub near_node_threshold: i32,
    pub isolation_threshold: i32,
    pub first_mile_walk_threshold: i32,
    pub last_mile_walk_threshold: i32,

    pub training_ttl_days: i64,
    pub training_memory_entries: usize,
    pub training_radius: i32,
    pub training_top_n: usize,
    pub training_cache_dir: Option<PathBuf>,

    pub local_radius: i32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            initial_batch: DEFAULT_INITIAL_BATCH,
            scene_drift_threshold: DEFAULT_SCENE_DRIFT,
            scene_entry_drift: DEFAULT_SCENE_ENTRY_DRIFT,
            scene_cache_entries: DEFAULT_SCENE_CACHE_ENTRIES,
            path_cache_drift: DEFAULT_PATH_CACHE_DRIFT,
            path_cache_ttl_ms: DEFAULT_PATH_CACHE_TTL_MS,
            shortcut_base_rate: DEFAULT_SHORTCUT_BASE_RATE,
            shortcut_bonus: DEFAULT_SHORTCUT_BONUS,
            shortcut_bonus_step: DEFAULT_SHORTCUT_BONUS_STEP,
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            near_node_threshold: DEFAULT_NEAR_NODE,
            isolation_threshold: DEFAULT_ISOLATION,
            first_mile_walk_threshold: DEFAULT_FIRST_MILE_WALK,
            last_mile_walk_threshold: DEFAULT_LAST_MILE_WALK,
            training_ttl_days: DEFAULT_TRAINING_TTL_DAYS,
            training_memory_entries: DEFAULT_TRAINING_MEMORY,
            training_radius: DEFAULT_TRAINING_RADIUS,
            training_top_n: DEFAULT_TRAINING_TOP_N,
            training_cache_dir: None,
            local_radius: DEFAULT_LOCAL_RADIUS,
        }
    }
}

impl NavConfig {
    /// Defaults overlaid with `NAVWEB_*` environment variables. Unparseable
    /// values are logged and ignored.
    pub fn from_env() -> Self {
        let mut c = Self::default();
        overlay(&mut c.initial_batch, "NAVWEB_INITIAL_BATCH");
        overlay(&mut c.scene_drift_threshold, "NAVWEB_SCENE_DRIFT");
        overlay(&mut c.scene_entry_drift, "NAVWEB_SCENE_ENTRY_DRIFT");
        overlay(&mut c.scene_cache_entries, "NAVWEB_SCENE_CACHE_ENTRIES");
        overlay(&mut c.path_cache_drift, "NAVWEB_PATH_CACHE_DRIFT");
        overlay(&mut c.path_cache_ttl_ms, "NAVWEB_PATH_CACHE_TTL_MS");
        overlay(&mut c.shortcut_base_rate, "NAVWEB_SHORTCUT_BASE_RATE");
        overlay(&mut c.shortcut_bonus, "NAVWEB_SHORTCUT_BONUS");
        overlay(&mut c.shortcut_bonus_step, "NAVWEB_SHORTCUT_BONUS_STEP");
        overlay(&mut c.risk_threshold, "NAVWEB_RISK_THRESHOLD");
        overlay(&mut c.near_node_threshold, "NAVWEB_NEAR_NODE");
        overlay(&mut c.isolation_threshold, "NAVWEB_ISOLATION");
        overlay(&mut c.first_mile_walk_threshold, "NAVWEB_FIRST_MILE_WALK");
        overlay(&mut c.last_mile_walk_threshold, "NAVWEB_LAST_MILE_WALK");
        overlay(&mut c.training_ttl_days, "NAVWEB_TRAINING_TTL_DAYS");
        overlay(&mut c.training_memory_entries, "NAVWEB_TRAINING_MEMORY");
        overlay(&mut c.training_radius, "NAVWEB_TRAINING_RADIUS");
        overlay(&mut c.training_top_n, "NAVWEB_TRAINING_TOP_N");
        overlay(&mut c.local_radius, "NAVWEB_LOCAL_RADIUS");
        c.training_cache_dir = env::var("TRAINING_SPOT_CACHE_DIR")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        c
    }

    pub fn path_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.path_cache_ttl_ms)
    }

    pub fn training_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.training_ttl_days)
    }
}

fn overlay<T: FromStr>(slot: &mut T, name: &str) {
    let Ok(raw) = env::var(name) else { return };
    match raw.trim().parse::<T>() {
        Ok(v) => *slot = v,
        Err(_) => warn!(var = name, value = %raw, "ignoring unparseable config value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_keep_field_tuned_values() {
        let c = NavConfig::default();
        assert_eq!(c.initial_batch, 10);
        assert_eq!(c.scene_drift_threshold, 40);
        assert!((c.risk_threshold - 0.10).abs() < 1e-12);
        assert!((c.shortcut_bonus - 0.02).abs() < 1e-12);
        assert_eq!(c.shortcut_bonus_step, 5);
        assert_eq!(c.path_cache_ttl(), Duration::from_secs(60));
        assert_eq!(c.training_ttl(), chrono::Duration::days(7));
    }

    #[test]
    fn deserializes_with_defaults_when_missing_fields() {
        let c: NavConfig = serde_json::from_value(json!({ "initial_batch": 4 })).unwrap();
        assert_eq!(c.initial_batch, 4);
        assert_eq!(c.isolation_threshold, DEFAULT_ISOLATION);
        assert!(c.training_cache_dir.is_none());
    }

    #[test]
    fn env_overlay_parses_and_ignores_garbage() {
        let mut batch = 10usize;
        std::env::set_var("NAVWEB_TEST_BATCH_OK", " 3 ");
        overlay(&mut batch, "NAVWEB_TEST_BATCH_OK");
        assert_eq!(batch, 3);
        std::env::set_var("NAVWEB_TEST_BATCH_BAD", "three");
        overlay(&mut batch, "NAVWEB_TEST_BATCH_BAD");
        assert_eq!(batch, 3);
        overlay(&mut batch, "NAVWEB_TEST_BATCH_UNSET");
        assert_eq!(batch, 3);
    }
}
