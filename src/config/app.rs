use anyhow::{ensure, Context, Result};
use serde::Serialize;
use std::env;
use std::path::PathBuf;

use super::detection::DetectionConfig;
use super::limits::LimitsConfig;

/// Smallest model input side; YOLOv8 downsamples by 32
const MIN_INPUT_SIZE: u32 = 32;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub model: ModelConfig,
    pub detection: DetectionConfig,
    pub limits: LimitsConfig,
}

/// Settings for the pose-estimation model
#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub input_size: u32,
    pub person_confidence_threshold: f32,
    pub nms_iou_threshold: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/yolov8n-pose.onnx"),
            input_size: 640,
            person_confidence_threshold: 0.4,
            nms_iou_threshold: 0.45,
        }
    }
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5110".to_string())
            .parse()
            .context("PORT must be a valid port number")?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(AppConfig {
            host,
            port,
            environment,
            log_level,
            model: ModelConfig::from_env()?,
            detection: DetectionConfig::from_env()?,
            limits: LimitsConfig::from_env()?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ModelConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let model_path = env::var("POSE_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let input_size = match env::var("MODEL_INPUT_SIZE") {
            Ok(raw) => raw.parse().context("MODEL_INPUT_SIZE must be an integer")?,
            Err(_) => defaults.input_size,
        };
        let person_confidence_threshold = match env::var("PERSON_CONFIDENCE_THRESHOLD") {
            Ok(raw) => raw
                .parse::<f32>()
                .context("PERSON_CONFIDENCE_THRESHOLD must be a number")?
                .clamp(0.0, 1.0),
            Err(_) => defaults.person_confidence_threshold,
        };
        let nms_iou_threshold = match env::var("NMS_IOU_THRESHOLD") {
            Ok(raw) => raw
                .parse::<f32>()
                .context("NMS_IOU_THRESHOLD must be a number")?
                .clamp(0.0, 1.0),
            Err(_) => defaults.nms_iou_threshold,
        };

        let config = Self {
            model_path,
            input_size,
            person_confidence_threshold,
            nms_iou_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.input_size >= MIN_INPUT_SIZE,
            "input_size must be at least {}, got {}",
            MIN_INPUT_SIZE,
            self.input_size
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_config_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_input_size() {
        for input_size in [0, 1, 31] {
            let config = ModelConfig {
                input_size,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "input_size {} accepted", input_size);
        }
        let config = ModelConfig {
            input_size: 32,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
