//! API Module
//!
//! HTTP API layer for the console backend.
//! Each submodule handles endpoints for a specific domain.

pub mod connection;
pub mod control;
pub mod error;
pub mod health;
pub mod mapping;
pub mod tags;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and status
        .route("/health", get(health::health_check))
        .route("/status", get(health::status))
        // Mapping endpoints
        .route("/single-mapping", post(mapping::single_mapping))
        .route("/bulk-mapping", post(mapping::bulk_mapping))
        .route("/map-subnet", post(mapping::map_subnet))
        // Tag endpoints
        .route("/update-ip-tags", post(tags::update_ip_tags))
        .route("/update-tags", post(tags::update_user_tags))
        // Job control and observation
        .route("/stop-mapping", post(control::stop_mapping))
        .route("/emergency-stop", post(control::emergency_stop))
        .route("/progress", get(control::progress))
        .route("/job", get(control::job))
        .route("/get-logs", get(control::get_logs))
        // Connection endpoints
        .route("/test-connection", post(connection::test_connection))
        .route("/cert-status", get(connection::cert_status))
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
