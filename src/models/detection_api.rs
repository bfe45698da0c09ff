/// Request and response bodies for the detection API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::pose::{FrameReport, PersonPose, PoseDetection};
use crate::config::{DetectionConfig, LimitsConfig, ModelConfig};

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    /// Base64 image, optionally as a data URL
    pub image: String,
}

#[derive(Debug, Deserialize)]
pub struct DetectBatchRequest {
    pub images: Vec<String>,
}

/// Keypoints produced by a client-side model
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub persons: Vec<PersonPose>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub success: bool,
    pub processing_time_ms: f64,
    pub people_detected: usize,
    pub image_dimensions: ImageDimensions,
    pub detections: Vec<PoseDetection>,
}

#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub image_index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub people_detected: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
    /// Present on every successful item, even with nobody in frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<PoseDetection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    pub fn succeeded(
        image_index: usize,
        image_dimensions: ImageDimensions,
        detections: Vec<PoseDetection>,
    ) -> Self {
        Self {
            image_index,
            success: true,
            people_detected: Some(detections.len()),
            image_dimensions: Some(image_dimensions),
            detections: Some(detections),
            error: None,
        }
    }

    pub fn failed(image_index: usize, error: impl Into<String>) -> Self {
        Self {
            image_index,
            success: false,
            people_detected: None,
            image_dimensions: None,
            detections: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetectBatchResponse {
    pub success: bool,
    pub processing_time_ms: f64,
    pub total_images: usize,
    pub results: Vec<BatchItemResult>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub people_detected: usize,
    pub detections: Vec<PoseDetection>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct FrameResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub processing_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
    #[serde(flatten)]
    pub report: FrameReport,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub detection: DetectionConfig,
    pub model: ModelConfig,
    pub limits: LimitsConfig,
    pub model_loaded: bool,
    /// Landmark name to model output index
    pub keypoints: BTreeMap<&'static str, usize>,
}
