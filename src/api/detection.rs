use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use super::error::ApiError;
use super::extract::ApiJson;
use super::state::AppState;
use crate::models::detection_api::*;
use crate::models::keypoint::Landmark;
use crate::services::pose_detector::analyze_persons;

/// API info endpoint
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "Pose Alert API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/detect": "POST - Detect poses in image",
            "/detect_batch": "POST - Detect poses in multiple images",
            "/analyze": "POST - Analyze client-supplied keypoints",
            "/sessions": "POST - Start a detection session",
            "/sessions/:id": "GET - Session state, DELETE - Close session",
            "/sessions/:id/frames": "POST - Feed an image frame to a session",
            "/sessions/:id/keypoints": "POST - Feed client-supplied keypoints to a session",
            "/sessions/:id/reset": "POST - Reset a session's counters",
            "/health": "GET - Health check",
            "/config": "GET - Get current configuration"
        }
    }))
}

/// Current detection and model configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigResponse> {
    let keypoints: BTreeMap<&'static str, usize> = Landmark::ALL
        .iter()
        .map(|landmark| (landmark.name(), landmark.index()))
        .collect();

    Json(ConfigResponse {
        detection: state.detection_config.clone(),
        model: state.model_config.clone(),
        limits: state.limits.clone(),
        model_loaded: state.model_loaded(),
        keypoints,
    })
}

/// Detect poses in a single image; stateless
pub async fn detect(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<DetectRequest>,
) -> Result<Json<DetectResponse>, ApiError> {
    let start_time = Instant::now();

    let estimation = state.estimate(request.image).await?;
    let detections = analyze_persons(&state.analyzer, &estimation.persons);

    info!(
        people = detections.len(),
        inference_time_ms = estimation.inference_time_ms,
        "Processed detection request"
    );

    Ok(Json(DetectResponse {
        success: true,
        processing_time_ms: elapsed_ms(start_time),
        people_detected: detections.len(),
        image_dimensions: ImageDimensions::from(&estimation),
        detections,
    }))
}

/// Detect poses in several images; a bad image fails only its own entry
pub async fn detect_batch(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<DetectBatchRequest>,
) -> Result<Json<DetectBatchResponse>, ApiError> {
    let start_time = Instant::now();

    if request.images.is_empty() {
        return Err(ApiError::InvalidRequest(
            "Images must be a non-empty list".to_string(),
        ));
    }
    if !state.model_loaded() {
        return Err(ApiError::ModelUnavailable);
    }

    let total_images = request.images.len();
    let mut results = Vec::with_capacity(total_images);

    for (image_index, image) in request.images.into_iter().enumerate() {
        match state.estimate(image).await {
            Ok(estimation) => {
                let detections = analyze_persons(&state.analyzer, &estimation.persons);
                results.push(BatchItemResult::succeeded(
                    image_index,
                    ImageDimensions::from(&estimation),
                    detections,
                ));
            }
            Err(e) => {
                error!("Batch image {} failed: {}", image_index, e);
                results.push(BatchItemResult::failed(image_index, e.to_string()));
            }
        }
    }

    Ok(Json(DetectBatchResponse {
        success: true,
        processing_time_ms: elapsed_ms(start_time),
        total_images,
        results,
    }))
}

/// Analyze keypoints produced by a client-side model
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Json<AnalyzeResponse> {
    let detections = analyze_persons(&state.analyzer, &request.persons);

    Json(AnalyzeResponse {
        success: true,
        people_detected: detections.len(),
        detections,
    })
}

pub(crate) fn elapsed_ms(start_time: Instant) -> f64 {
    start_time.elapsed().as_secs_f64() * 1000.0
}
