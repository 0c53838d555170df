pub mod cache;
pub mod collision;
pub mod config;
pub mod error;
pub mod graph;
pub mod local;
pub mod locator;
pub mod models;
pub mod navigator;
pub mod obstacles;
pub mod ranking;
pub mod requirements;
pub mod resolver;
pub mod scene;
pub mod spatial;

pub use collision::{CollisionOracle, GridCollision};
pub use config::NavConfig;
pub use error::{NavError, Result};
pub use graph::{GraphDocument, NavigationPath, WorldGraph};
pub use local::LocalCostEstimator;
pub use locator::{ActorMatch, EntityLocator, InteractionModel, ObjectMatch};
pub use models::{HasWorldLocation, WorldPoint};
pub use navigator::Navigator;
pub use obstacles::{ObstacleCatalog, ObstacleCatalogBuilder};
pub use requirements::{SimpleTraveler, TravelerState};
pub use resolver::{NavigationResult, RouteResolver, RouteStatus, Suggestion};
pub use scene::{Scene, SceneSnapshot, WorldEvent, WorldEventSink, WorldView};
pub use spatial::SpatialIndex;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
