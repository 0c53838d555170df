use std::path::Path;

use anyhow::Context;
use navweb_core::{ObstacleCatalog, ObstacleCatalogBuilder, WorldGraph};
use tracing::info;

pub mod config;
pub mod errors;
pub mod models;
pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

pub fn load_graph(path: &Path) -> anyhow::Result<WorldGraph> {
    WorldGraph::load(path).with_context(|| format!("loading graph from {}", path.display()))
}

/// Built-in obstacles plus the shortcut table, when one is configured.
pub fn build_catalog(cfg: &config::Config) -> anyhow::Result<ObstacleCatalog> {
    let mut builder = ObstacleCatalogBuilder::new(&cfg.nav).with_builtin();
    if let Some(path) = &cfg.shortcuts_path {
        let json = std::fs::read_to_string(path).with_context(|| format!("reading shortcut table {}", path.display()))?;
        builder = builder
            .shortcut_table_json(&json)
            .with_context(|| format!("parsing shortcut table {}", path.display()))?;
        info!(path = %path.display(), "shortcut table loaded");
    }
    Ok(builder.build())
}
