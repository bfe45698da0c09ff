use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use super::detection::elapsed_ms;
use super::error::ApiError;
use super::extract::ApiJson;
use super::state::AppState;
use crate::models::detection_api::*;
use crate::models::pose::DetectionSnapshot;
use crate::services::session_store::SharedDetector;

async fn find_session(state: &AppState, session_id: &Uuid) -> Result<SharedDetector, ApiError> {
    state
        .sessions
        .get(session_id)
        .await
        .ok_or(ApiError::SessionNotFound)
}

/// Start a detection session for one video stream
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionCreatedResponse>), ApiError> {
    let session_id = state.sessions.create().await?;
    Ok((StatusCode::CREATED, Json(SessionCreatedResponse { session_id })))
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DetectionSnapshot>, ApiError> {
    let detector = find_session(&state, &session_id).await?;
    let snapshot = detector.lock().await.snapshot();
    Ok(Json(snapshot))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound)
    }
}

pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<DetectionSnapshot>, ApiError> {
    let detector = find_session(&state, &session_id).await?;
    let mut detector = detector.lock().await;
    detector.reset();
    Ok(Json(detector.snapshot()))
}

/// Run the model on a frame and advance the session
pub async fn submit_frame(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    ApiJson(request): ApiJson<DetectRequest>,
) -> Result<Json<FrameResponse>, ApiError> {
    let start_time = Instant::now();
    let detector = find_session(&state, &session_id).await?;

    // Hold the session lock across inference so frames stay in order
    let mut detector = detector.lock().await;
    let estimation = state.estimate(request.image).await?;
    let report = detector.process_frame(&estimation.persons);

    Ok(Json(FrameResponse {
        success: true,
        session_id,
        processing_time_ms: elapsed_ms(start_time),
        image_dimensions: Some(ImageDimensions::from(&estimation)),
        report,
    }))
}

/// Advance the session with client-supplied keypoints
pub async fn submit_keypoints(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Result<Json<FrameResponse>, ApiError> {
    let start_time = Instant::now();
    let detector = find_session(&state, &session_id).await?;
    let report = detector.lock().await.process_frame(&request.persons);

    Ok(Json(FrameResponse {
        success: true,
        session_id,
        processing_time_ms: elapsed_ms(start_time),
        image_dimensions: None,
        report,
    }))
}
