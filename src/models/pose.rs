/// Per-frame and per-session pose results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::keypoint::{BoundingBox, JointAngle, KeypointSet};

/// Pose predicates derived from one person's keypoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoseAnalysisResult {
    pub standing: bool,
    pub target_pose_detected: bool,
    /// Left arm alone satisfies the raised-arm condition
    pub left_arm_raised: bool,
    /// Right arm alone satisfies the raised-arm condition
    pub right_arm_raised: bool,
}

/// One person as reported by the pose-estimation model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonPose {
    /// Keypoints in frame pixel coordinates
    pub keypoints: KeypointSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    /// Overall detection confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl PersonPose {
    pub fn new(keypoints: KeypointSet) -> Self {
        Self {
            keypoints,
            bbox: None,
            confidence: None,
        }
    }
}

/// Analysis of one detected person, ready for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseDetection {
    /// 1-based position within the frame (not a tracking identity)
    pub person_id: usize,
    pub confidence: Option<f32>,
    pub bbox: Option<BoundingBox>,
    pub standing: bool,
    pub target_pose_detected: bool,
    pub pose_analysis: PoseAnalysisResult,
    pub keypoints: Vec<KeypointReport>,
    pub joint_angles: Vec<JointAngle>,
}

/// Keypoint as exposed to API consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeypointReport {
    pub name: &'static str,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
    pub visible: bool,
}

/// Outcome of feeding one frame through a detector session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub people_detected: usize,
    pub detections: Vec<PoseDetection>,
    /// Whether any person matched the target pose in this frame
    pub frame_match: bool,
    pub consecutive_detections: u32,
    pub confirmed: bool,
    /// An alert fired on this frame
    pub alert_triggered: bool,
}

/// Observable state of a detector session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionSnapshot {
    pub consecutive_detections: u32,
    pub confirmed: bool,
    /// Oldest first
    pub detection_history: Vec<bool>,
    pub last_alert_time: Option<DateTime<Utc>>,
    pub should_alert: bool,
}
