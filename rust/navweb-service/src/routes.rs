use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use navweb_core::scene::SceneSnapshotDto;
use navweb_core::{NavigationResult, Scene, WorldEvent};
use serde_json::{json, Value};
use tracing::{info, info_span};

use crate::errors::AppError;
use crate::models::{
    EstimateRequest, EstimateResponse, Healthz, NearestActorRequest, NearestObjectRequest, RankRequest, RouteRequest,
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/version", get(version))
        .route("/route", post(route))
        .route("/estimate", post(estimate))
        .route("/nearest/object", post(nearest_object))
        .route("/nearest/actor", post(nearest_actor))
        .route("/training/rank", post(rank_training))
        .route("/scene", post(load_scene))
        .route("/scene/events", post(scene_events))
        .route("/admin/reload", post(reload))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(Healthz { status: "ok" }))
}

async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let scene_loaded = state.scene().is_loaded();
    match state.graph() {
        Some(g) => (
            StatusCode::OK,
            Json(json!({
                "ready": true,
                "graph_version": g.version(),
                "nodes": g.node_count(),
                "edges": g.edge_count(),
                "scene_loaded": scene_loaded,
            })),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"ready": false, "scene_loaded": scene_loaded, "error": "graph not loaded"})),
        )
            .into_response(),
    }
}

async fn version() -> impl IntoResponse {
    let svc_version = env!("CARGO_PKG_VERSION");
    let core_version = navweb_core::version();
    (StatusCode::OK, Json(json!({"service_version": svc_version, "core_version": core_version})))
}

async fn route(State(state): State<AppState>, Json(req): Json<RouteRequest>) -> Json<NavigationResult> {
    let span = info_span!("route", start = %req.start, destination = %req.destination, best_effort = req.best_effort);
    let result = span.in_scope(|| {
        let result = state.with_navigator(|nav, scene| {
            nav.observe_position(req.start);
            if req.best_effort {
                nav.best_effort_route(scene, req.start, req.destination, &req.traveler)
            } else {
                nav.route(scene, req.start, req.destination, &req.traveler)
            }
        });
        info!(status = ?result.status, ticks = ?result.estimated_ticks, suggestions = result.suggestions.len(), "route done");
        result
    });
    Json(result)
}

async fn estimate(State(state): State<AppState>, Json(req): Json<EstimateRequest>) -> Json<EstimateResponse> {
    let cost = state.with_navigator(|nav, scene| nav.estimate_local_cost(scene, req.start, req.destination));
    Json(EstimateResponse { cost })
}

async fn nearest_object(State(state): State<AppState>, Json(req): Json<NearestObjectRequest>) -> Result<impl IntoResponse, AppError> {
    if req.ids.is_empty() {
        return Err(AppError::bad_request("ids must not be empty"));
    }
    let found = state.with_navigator(|nav, scene| {
        nav.observe_position(req.start);
        nav.find_nearest_reachable_object(scene, req.start, &req.ids, req.radius)
    });
    info!(start = %req.start, found = found.is_some(), cost = ?found.as_ref().map(|m| m.cost), "nearest object");
    Ok(Json(found))
}

async fn nearest_actor(State(state): State<AppState>, Json(req): Json<NearestActorRequest>) -> Result<impl IntoResponse, AppError> {
    if req.ids.is_empty() {
        return Err(AppError::bad_request("ids must not be empty"));
    }
    let found = state.with_navigator(|nav, scene| {
        nav.observe_position(req.start);
        nav.find_nearest_reachable_actor(scene, req.start, &req.ids, req.name.as_deref(), req.radius, req.interaction)
    });
    info!(start = %req.start, found = found.is_some(), cost = ?found.as_ref().map(|m| m.cost), "nearest actor");
    Ok(Json(found))
}

async fn rank_training(State(state): State<AppState>, Json(req): Json<RankRequest>) -> Result<impl IntoResponse, AppError> {
    if req.ids.is_empty() {
        return Err(AppError::bad_request("ids must not be empty"));
    }
    let ranked = state.with_navigator(|nav, scene| {
        let radius = req.radius.unwrap_or(nav.config().training_radius);
        nav.rank_training_candidates(scene, &req.ids, req.reference, radius, req.bank_required)
    });
    Ok(Json(ranked))
}

async fn load_scene(State(state): State<AppState>, Json(dto): Json<SceneSnapshotDto>) -> impl IntoResponse {
    let (base_x, base_y) = (dto.base_x, dto.base_y);
    state.replace_scene(dto.into());
    let objects = state.scene().object_count();
    info!(base_x, base_y, objects, "scene loaded");
    Json(json!({"loaded": true, "objects": objects}))
}

async fn scene_events(State(state): State<AppState>, Json(events): Json<Vec<WorldEvent>>) -> Json<Value> {
    let applied = state.apply_events(&events);
    Json(json!({"applied": applied}))
}

async fn reload(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let path = state
        .graph_path()
        .ok_or_else(|| AppError::unavailable("NAVWEB_GRAPH is not set"))?
        .to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || crate::load_graph(&path))
        .await
        .map_err(AppError::internal)?;
    let graph = loaded.map_err(|e| AppError::Internal(e.context("graph reload failed, keeping the current graph")))?;
    let body = json!({
        "reloaded": true,
        "graph_version": graph.version(),
        "nodes": graph.node_count(),
        "edges": graph.edge_count(),
    });
    state.set_graph(graph);
    info!("graph reloaded");
    Ok(Json(body))
}
