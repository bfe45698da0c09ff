use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Thresholds for pose analysis and alert confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Landmark confidence must exceed this to count as visible
    pub visibility_threshold: f32,
    /// Minimum thigh-length / body-height ratio for "standing"
    pub standing_height_ratio: f32,
    /// Pixels the elbow must be above the shoulder
    pub elbow_shoulder_threshold: f32,
    /// Pixels the wrist must be above the elbow
    pub hand_elbow_threshold: f32,
    /// Consecutive matching frames needed to confirm the pose
    pub consecutive_frames_threshold: u32,
    /// Cooldown between alerts, in seconds
    pub alert_duration_secs: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: 0.3,
            standing_height_ratio: 0.6,
            elbow_shoulder_threshold: 15.0,
            hand_elbow_threshold: 15.0,
            consecutive_frames_threshold: 5,
            alert_duration_secs: 2.0,
        }
    }
}

impl DetectionConfig {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            visibility_threshold: env_or("VISIBILITY_THRESHOLD", defaults.visibility_threshold)?,
            standing_height_ratio: env_or("STANDING_HEIGHT_RATIO", defaults.standing_height_ratio)?,
            elbow_shoulder_threshold: env_or(
                "ELBOW_SHOULDER_THRESHOLD",
                defaults.elbow_shoulder_threshold,
            )?,
            hand_elbow_threshold: env_or("HAND_ELBOW_THRESHOLD", defaults.hand_elbow_threshold)?,
            consecutive_frames_threshold: env_or(
                "CONSECUTIVE_FRAMES_THRESHOLD",
                defaults.consecutive_frames_threshold,
            )?,
            alert_duration_secs: env_or("ALERT_DURATION", defaults.alert_duration_secs)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.visibility_threshold),
            "visibility_threshold must be within [0, 1], got {}",
            self.visibility_threshold
        );
        for (name, value) in [
            ("standing_height_ratio", self.standing_height_ratio),
            ("elbow_shoulder_threshold", self.elbow_shoulder_threshold),
            ("hand_elbow_threshold", self.hand_elbow_threshold),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{} must be a finite non-negative number, got {}",
                name,
                value
            );
        }
        ensure!(
            self.consecutive_frames_threshold >= 1,
            "consecutive_frames_threshold must be at least 1"
        );
        ensure!(
            self.alert_duration_secs.is_finite() && self.alert_duration_secs >= 0.0,
            "alert_duration_secs must be a finite non-negative number, got {}",
            self.alert_duration_secs
        );
        Ok(())
    }

    /// Cooldown as a chrono duration (millisecond resolution)
    pub fn alert_duration(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.alert_duration_secs * 1000.0).round() as i64)
    }
}

pub(crate) fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.consecutive_frames_threshold, 5);
        assert_eq!(config.alert_duration(), chrono::Duration::seconds(2));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = DetectionConfig {
            consecutive_frames_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectionConfig {
            visibility_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DetectionConfig {
            hand_elbow_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DetectionConfig =
            serde_json::from_str(r#"{"consecutive_frames_threshold": 3}"#).unwrap();
        assert_eq!(config.consecutive_frames_threshold, 3);
        assert_eq!(config.elbow_shoulder_threshold, 15.0);
    }
}
