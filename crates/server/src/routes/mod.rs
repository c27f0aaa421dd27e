use axum::{Router, http::Uri, middleware, routing::get};
use tower_http::cors::CorsLayer;

use crate::{AppState, error::ApiError, middleware::request_id_middleware};

pub mod capabilities;
pub mod health;
pub mod tasks;

async fn route_not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(tasks::router())
        .merge(capabilities::router());

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .fallback(route_not_found)
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}
