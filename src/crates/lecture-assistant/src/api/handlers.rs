//! Request handlers

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use super::error::ApiResult;
use super::models::{CreateRunRequest, FeedbackRequest, HealthResponse};
use super::response;
use super::routes::AppState;
use crate::export::render_markdown;

/// GET /health
pub async fn health() -> impl IntoResponse {
    response::ok(HealthResponse::ok())
}

/// POST /api/v1/runs
///
/// Starts a run and returns once it reaches its first review point.
pub async fn create_run(
    State(state): State<AppState>,
    Json(request): Json<CreateRunRequest>,
) -> ApiResult<impl IntoResponse> {
    let report = state.service.start(&request.topic).await?;
    Ok(response::created(report))
}

/// POST /api/v1/runs/:thread_id/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(request): Json<FeedbackRequest>,
) -> ApiResult<impl IntoResponse> {
    let report = state
        .service
        .submit_feedback(&thread_id, &request.decision, &request.notes)
        .await?;
    Ok(response::ok(report))
}

/// GET /api/v1/runs/:thread_id
pub async fn get_run(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = state.service.get_status(&thread_id).await?;
    Ok(response::ok(report))
}

/// GET /api/v1/runs/:thread_id/brief
pub async fn get_brief(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let brief = state.service.final_brief(&thread_id).await?;
    Ok(response::ok(brief))
}

/// GET /api/v1/runs/:thread_id/brief.md
pub async fn get_brief_markdown(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let brief = state.service.final_brief(&thread_id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_markdown(&brief),
    ))
}
