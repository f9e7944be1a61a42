//! API route definitions

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, middleware};
use crate::service::ResearchService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ResearchService>,
}

/// Build the complete API router
pub fn create_router(service: Arc<ResearchService>, cors_origins: &[String]) -> Router {
    let app_state = AppState { service };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/runs", post(handlers::create_run))
        .route("/api/v1/runs/:thread_id", get(handlers::get_run))
        .route("/api/v1/runs/:thread_id/feedback", post(handlers::submit_feedback))
        .route("/api/v1/runs/:thread_id/brief", get(handlers::get_brief))
        .route("/api/v1/runs/:thread_id/brief.md", get(handlers::get_brief_markdown))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer(cors_origins))
        .with_state(app_state)
}
