//! HTTP surface: health probe, `/api` feature routes, and the middleware stack

pub mod extract;
pub mod health;
pub mod response;

use axum::{routing::get, Router};
use tower_http::compression::CompressionLayer;

use crate::config::CorsConfig;
use crate::features::{self, FeatureState};
use crate::middleware;

/// Create the application router with all routes and middleware
pub fn create_router(state: FeatureState, cors: &CorsConfig) -> Router {
    let recorder = state.recorder.clone();
    let db = state.db.clone();

    Router::new()
        .route("/health", get(health::health_check))
        .with_state(db)
        .nest("/api", features::router(state))
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
        .layer(middleware::RequestAuditLayer::new(recorder))
}
