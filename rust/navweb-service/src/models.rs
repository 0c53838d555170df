use navweb_core::{InteractionModel, SimpleTraveler, WorldPoint};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SEARCH_RADIUS: i32 = 15;

fn default_radius() -> i32 {
    DEFAULT_SEARCH_RADIUS
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub start: WorldPoint,
    pub destination: WorldPoint,
    #[serde(default)]
    pub traveler: SimpleTraveler,
    /// Suggest a plain walk when the graph cannot connect nearby points.
    #[serde(default)]
    pub best_effort: bool,
}

#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    pub start: WorldPoint,
    pub destination: WorldPoint,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EstimateResponse {
    pub cost: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct NearestObjectRequest {
    pub start: WorldPoint,
    pub ids: Vec<i32>,
    #[serde(default = "default_radius")]
    pub radius: i32,
}

#[derive(Debug, Deserialize)]
pub struct NearestActorRequest {
    pub start: WorldPoint,
    pub ids: Vec<i32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_radius")]
    pub radius: i32,
    #[serde(default)]
    pub interaction: InteractionModel,
}

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub reference: WorldPoint,
    pub ids: Vec<i32>,
    /// Defaults to the configured training radius.
    #[serde(default)]
    pub radius: Option<i32>,
    #[serde(default)]
    pub bank_required: bool,
}

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
}
