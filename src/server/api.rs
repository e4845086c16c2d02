//! API route definitions

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeFile,
    trace::TraceLayer,
};

use super::{handlers, state::AppState};

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let index = ServeFile::new(&state.config.index_path);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route_service("/", index)
        .route("/predict", post(handlers::predict))
        .route("/diet-with-model", get(handlers::diet_with_model))
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
