use std::sync::Arc;

use anyhow::Context;
use navweb_core::cache::TrainingSpotCache;
use navweb_core::Navigator;
use navweb_service::config::Config;
use navweb_service::{build_catalog, build_router, load_graph, AppState};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cfg = Config::from_env()?;
    let graph = match &cfg.graph_path {
        Some(path) => Some(load_graph(path)?),
        None => {
            tracing::warn!("NAVWEB_GRAPH not set, routing stays unavailable until /admin/reload");
            None
        }
    };
    let catalog = Arc::new(build_catalog(&cfg)?);
    let navigator = Navigator::new(cfg.nav.clone(), catalog).with_training_cache(TrainingSpotCache::new(&cfg.nav));
    let state = AppState::new(navigator, graph, cfg.graph_path.clone());
    let app = build_router(state);

    let addr = cfg.addr()?;
    tracing::info!(core_version = %navweb_core::version(), %addr, "starting navweb-service");
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
