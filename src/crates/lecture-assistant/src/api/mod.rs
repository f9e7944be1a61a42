//! HTTP API
//!
//! Thin axum adapter over [`ResearchService`](crate::service::ResearchService):
//! create a run, submit a review decision, poll status, export the brief.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use routes::{create_router, AppState};
