//! Memoization layers: local path costs, obstacle scans and persisted
//! training-spot rankings. Each has its own invalidation policy.

pub mod obstacle_scan;
pub mod path_cost;
pub mod training_spot;

pub use obstacle_scan::{ScanCacheStats, SceneObstacleCache};
pub use path_cost::{pack_key, unpack_key, PathCostCache};
pub use training_spot::{training_spot_key, TrainingSpotCache, TrainingSpotEntry, TrainingSpotStats};
