use anyhow::anyhow;
use std::sync::Arc;

use super::error::ApiError;
use crate::config::{DetectionConfig, LimitsConfig, ModelConfig};
use crate::models::detection_api::ImageDimensions;
use crate::services::frame_decoder;
use crate::services::{PoseAnalyzer, PoseEstimationResult, PoseEstimator, SessionStore};

/// Shared state for API handlers
pub struct AppState {
    pub detection_config: DetectionConfig,
    pub model_config: ModelConfig,
    pub limits: LimitsConfig,
    pub analyzer: PoseAnalyzer,
    pub estimator: Option<Arc<dyn PoseEstimator>>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(
        detection_config: DetectionConfig,
        model_config: ModelConfig,
        limits: LimitsConfig,
        estimator: Option<Arc<dyn PoseEstimator>>,
    ) -> Self {
        Self {
            analyzer: PoseAnalyzer::new(&detection_config),
            sessions: SessionStore::new(detection_config.clone(), &limits),
            detection_config,
            model_config,
            limits,
            estimator,
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.estimator.is_some()
    }

    /// Decode a base64 frame and run the model on it off the async runtime
    pub async fn estimate(&self, image_data: String) -> Result<PoseEstimationResult, ApiError> {
        let estimator = self.estimator.clone().ok_or(ApiError::ModelUnavailable)?;

        tokio::task::spawn_blocking(move || {
            let image = frame_decoder::decode_image(&image_data)?;
            estimator
                .estimate_pose(&image)
                .map_err(ApiError::Inference)
        })
        .await
        .map_err(|e| ApiError::Internal(anyhow!("Inference task failed: {}", e)))?
    }
}

impl From<&PoseEstimationResult> for ImageDimensions {
    fn from(result: &PoseEstimationResult) -> Self {
        Self {
            width: result.image_width,
            height: result.image_height,
        }
    }
}
