use axum::{Router, middleware, routing::get};
use tower_http::cors::CorsLayer;

use crate::{AppState, middleware as app_middleware};

pub mod health;
pub mod skill;

pub fn router(state: AppState) -> Router {
    let base_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(skill::skill_routes())
        .with_state(state);

    Router::new()
        .nest("/api", base_routes)
        .layer(middleware::from_fn(app_middleware::request_id_middleware))
        .layer(CorsLayer::permissive())
}
