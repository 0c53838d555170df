//! Two-tier (memory + disk) cache of ranked training spots.
//!
//! Rankings survive restarts as one JSON file per key under the cache
//! directory. Disk access is best effort: failures are logged and treated as
//! misses, and a corrupt file is removed when it is read.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use itertools::Itertools;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::NavConfig;
use crate::models::WorldPoint;
use crate::ranking::RankedCandidate;

const FILE_EXTENSION: &str = "json";

/// `training:{region}:{id digest}:{bank_required}`. The id digest is order
/// independent.
pub fn training_spot_key(region: i32, object_ids: &[i32], bank_required: bool) -> String {
    let ids = if object_ids.is_empty() {
        "empty".to_string()
    } else {
        let joined = object_ids.iter().sorted().join(",");
        hex::encode(&Sha256::digest(joined.as_bytes())[..4])
    };
    format!("training:{region}:{ids}:{bank_required}")
}

/// File name for a key: the first 16 bytes of its SHA-256, hex encoded.
pub fn file_name(key: &str) -> String {
    format!("{}.{FILE_EXTENSION}", hex::encode(&Sha256::digest(key.as_bytes())[..16]))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSpotEntry {
    pub key: String,
    pub candidates: Vec<RankedCandidate>,
    #[serde(default)]
    pub bank: Option<WorldPoint>,
    pub cached_at: DateTime<Utc>,
}

impl TrainingSpotEntry {
    pub fn new(key: &str, candidates: Vec<RankedCandidate>, bank: Option<WorldPoint>) -> Self {
        Self { key: key.to_string(), candidates, bank, cached_at: Utc::now() }
    }

    pub fn is_stale(&self, ttl: chrono::Duration) -> bool {
        Utc::now() - self.cached_at > ttl
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrainingSpotStats {
    pub memory_hits: u64,
    pub memory_misses: u64,
    pub file_hits: u64,
    pub file_misses: u64,
    pub memory_size: usize,
    pub file_count: usize,
}

impl TrainingSpotStats {
    fn rate(hits: u64, misses: u64) -> f64 {
        if hits + misses == 0 {
            0.0
        } else {
            hits as f64 / (hits + misses) as f64
        }
    }

    pub fn memory_hit_rate(&self) -> f64 {
        Self::rate(self.memory_hits, self.memory_misses)
    }

    pub fn file_hit_rate(&self) -> f64 {
        Self::rate(self.file_hits, self.file_misses)
    }

    pub fn overall_hit_rate(&self) -> f64 {
        Self::rate(self.memory_hits + self.file_hits, self.memory_misses + self.file_misses)
    }
}

pub struct TrainingSpotCache {
    memory: Mutex<LruCache<String, TrainingSpotEntry>>,
    dir: Option<PathBuf>,
    ttl: chrono::Duration,
    memory_hits: AtomicU64,
    memory_misses: AtomicU64,
    file_hits: AtomicU64,
    file_misses: AtomicU64,
}

/// `<platform cache dir>/training_spots`.
pub fn default_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "navweb").map(|p| p.cache_dir().join("training_spots"))
}

impl TrainingSpotCache {
    /// Disk tier under `training_cache_dir`, else the platform cache dir.
    pub fn new(config: &NavConfig) -> Self {
        let dir = config.training_cache_dir.clone().or_else(default_cache_dir);
        Self::with_dir(dir, config.training_memory_entries, config.training_ttl())
    }

    /// `None` keeps the cache in memory only.
    pub fn with_dir(dir: Option<PathBuf>, capacity: usize, ttl: chrono::Duration) -> Self {
        let dir = dir.and_then(|d| match fs::create_dir_all(&d) {
            Ok(()) => {
                info!(dir = %d.display(), "training spot cache directory ready");
                Some(d)
            }
            Err(e) => {
                warn!(dir = %d.display(), error = %e, "cannot create training spot cache directory, disk tier disabled");
                None
            }
        });
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            memory: Mutex::new(LruCache::new(cap)),
            dir,
            ttl,
            memory_hits: AtomicU64::new(0),
            memory_misses: AtomicU64::new(0),
            file_hits: AtomicU64::new(0),
            file_misses: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn has_disk_tier(&self) -> bool {
        self.dir.is_some()
    }

    fn memory(&self) -> MutexGuard<'_, LruCache<String, TrainingSpotEntry>> {
        self.memory.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(file_name(key)))
    }

    /// Fresh rankings for `key`, promoting disk entries into memory.
    pub fn get(&self, key: &str) -> Option<Vec<RankedCandidate>> {
        if key.is_empty() {
            return None;
        }
        {
            let mut mem = self.memory();
            if let Some(e) = mem.get(key).filter(|e| !e.is_stale(self.ttl)) {
                self.memory_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "training spot memory hit");
                return Some(e.candidates.clone());
            }
        }
        self.memory_misses.fetch_add(1, Ordering::Relaxed);

        match self.read_file(key) {
            Some(e) if !e.is_stale(self.ttl) => {
                self.file_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "training spot file hit");
                let out = e.candidates.clone();
                self.memory().put(key.to_string(), e);
                Some(out)
            }
            Some(_) => {
                debug!(key, "training spot file entry is stale");
                self.file_misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.file_misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Rankings for `key` regardless of age.
    pub fn get_including_stale(&self, key: &str) -> Option<Vec<RankedCandidate>> {
        if key.is_empty() {
            return None;
        }
        if let Some(e) = self.memory().get(key) {
            return Some(e.candidates.clone());
        }
        let e = self.read_file(key)?;
        let out = e.candidates.clone();
        self.memory().put(key.to_string(), e);
        Some(out)
    }

    /// Store rankings in both tiers. Empty rankings are not cached.
    pub fn put(&self, key: &str, candidates: Vec<RankedCandidate>, bank: Option<WorldPoint>) {
        if key.is_empty() || candidates.is_empty() {
            return;
        }
        let n = candidates.len();
        let entry = TrainingSpotEntry::new(key, candidates, bank);
        self.write_file(&entry);
        self.memory().put(key.to_string(), entry);
        debug!(key, candidates = n, "training spots cached");
    }

    pub fn invalidate(&self, key: &str) {
        self.memory().pop(key);
        if let Some(path) = self.path_for(key) {
            if let Err(e) = remove_if_exists(&path) {
                warn!(path = %path.display(), error = %e, "failed to delete training spot cache file");
            }
        }
    }

    pub fn invalidate_all(&self) {
        self.memory().clear();
        for path in self.cache_files() {
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to delete training spot cache file");
            }
        }
        info!("training spot cache cleared");
    }

    pub fn stats(&self) -> TrainingSpotStats {
        TrainingSpotStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            memory_misses: self.memory_misses.load(Ordering::Relaxed),
            file_hits: self.file_hits.load(Ordering::Relaxed),
            file_misses: self.file_misses.load(Ordering::Relaxed),
            memory_size: self.memory().len(),
            file_count: self.cache_files().len(),
        }
    }

    fn cache_files(&self) -> Vec<PathBuf> {
        let Some(dir) = &self.dir else { return Vec::new() };
        let Ok(rd) = fs::read_dir(dir) else { return Vec::new() };
        rd.filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|x| x == FILE_EXTENSION))
            .collect()
    }

    fn read_file(&self, key: &str) -> Option<TrainingSpotEntry> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return None;
        }
        let raw = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read training spot cache file");
                return None;
            }
        };
        match serde_json::from_str::<TrainingSpotEntry>(&raw) {
            Ok(e) => Some(e),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt training spot cache file, deleting");
                if let Err(e) = remove_if_exists(&path) {
                    debug!(path = %path.display(), error = %e, "could not delete corrupt cache file");
                }
                None
            }
        }
    }

    fn write_file(&self, entry: &TrainingSpotEntry) {
        let Some(path) = self.path_for(&entry.key) else { return };
        let res = serde_json::to_vec_pretty(entry)
            .map_err(std::io::Error::other)
            .and_then(|bytes| fs::write(&path, bytes));
        if let Err(e) = res {
            warn!(path = %path.display(), error = %e, "failed to write training spot cache file");
        }
    }
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[allow(dead_code)]
fn _assert_send_sync() {
    fn is_send_sync<T: Send + Sync>() {}
    is_send_sync::<TrainingSpotCache>();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked() -> Vec<RankedCandidate> {
        vec![
            RankedCandidate::without_banking(WorldPoint::new(3200, 3200, 0), 1276, 4),
            RankedCandidate::without_banking(WorldPoint::new(3205, 3201, 0), 1276, 9),
        ]
    }

    fn week() -> chrono::Duration {
        chrono::Duration::days(7)
    }

    #[test]
    fn key_is_order_independent() {
        let a = training_spot_key(12850, &[1278, 1276, 1277], true);
        let b = training_spot_key(12850, &[1276, 1277, 1278], true);
        assert_eq!(a, b);
        assert!(a.starts_with("training:12850:"));
        assert!(a.ends_with(":true"));
        // 4 digest bytes -> 8 hex chars.
        assert_eq!(a.split(':').nth(2).map(str::len), Some(8));
        assert_ne!(a, training_spot_key(12850, &[1276], true));
        assert_eq!(training_spot_key(1, &[], false), "training:1:empty:false");
        assert_eq!(file_name(&a).len(), 32 + 5);
    }

    #[test]
    fn memory_then_file_hits() {
        let tmp = tempfile::tempdir().unwrap();
        let key = training_spot_key(12850, &[1276], false);
        let c = TrainingSpotCache::with_dir(Some(tmp.path().to_path_buf()), 500, week());
        assert!(c.get(&key).is_none());
        c.put(&key, ranked(), None);
        assert_eq!(c.get(&key), Some(ranked()));
        assert_eq!(c.stats().memory_hits, 1);
        assert_eq!(c.stats().file_count, 1);

        // A fresh process only has the disk tier.
        let c2 = TrainingSpotCache::with_dir(Some(tmp.path().to_path_buf()), 500, week());
        assert_eq!(c2.get(&key), Some(ranked()));
        assert_eq!(c2.stats().file_hits, 1);
        assert_eq!(c2.get(&key), Some(ranked()));
        let st = c2.stats();
        assert_eq!((st.memory_hits, st.memory_size), (1, 1));
        assert!((st.overall_hit_rate() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn stale_entries_only_come_back_on_request() {
        let tmp = tempfile::tempdir().unwrap();
        let key = training_spot_key(12850, &[1276], true);
        let mut old = TrainingSpotEntry::new(&key, ranked(), Some(WorldPoint::new(3208, 3220, 0)));
        old.cached_at = Utc::now() - chrono::Duration::days(8);
        fs::write(tmp.path().join(file_name(&key)), serde_json::to_vec(&old).unwrap()).unwrap();

        let c = TrainingSpotCache::with_dir(Some(tmp.path().to_path_buf()), 500, week());
        assert!(c.get(&key).is_none());
        assert_eq!(c.stats().file_misses, 1);
        assert_eq!(c.get_including_stale(&key), Some(ranked()));
        // Promoted to memory, but still too old for a normal lookup.
        assert!(c.get(&key).is_none());
    }

    #[test]
    fn corrupt_file_is_deleted() {
        let tmp = tempfile::tempdir().unwrap();
        let key = training_spot_key(1, &[2], false);
        let path = tmp.path().join(file_name(&key));
        fs::write(&path, b"{ not json").unwrap();
        let c = TrainingSpotCache::with_dir(Some(tmp.path().to_path_buf()), 500, week());
        assert!(c.get(&key).is_none());
        assert!(!path.exists());
    }

    #[test]
    fn empty_rankings_and_invalidation() {
        let tmp = tempfile::tempdir().unwrap();
        let c = TrainingSpotCache::with_dir(Some(tmp.path().to_path_buf()), 500, week());
        c.put("k1", Vec::new(), None);
        assert_eq!(c.stats().file_count, 0);
        c.put("k1", ranked(), None);
        c.put("k2", ranked(), None);
        c.invalidate("k1");
        assert!(c.get("k1").is_none());
        assert_eq!(c.stats().file_count, 1);
        c.invalidate_all();
        assert!(c.get_including_stale("k2").is_none());
        assert_eq!(c.stats().file_count, 0);
    }

    #[test]
    fn unusable_directory_disables_disk_tier() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let c = TrainingSpotCache::with_dir(Some(blocker.join("sub")), 500, week());
        assert!(!c.has_disk_tier());
        c.put("k", ranked(), None);
        assert_eq!(c.get("k"), Some(ranked()));
        assert_eq!(c.stats().file_count, 0);
    }
}
