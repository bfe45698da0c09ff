// Pose analysis and detection services

pub mod detection_state;
pub mod frame_decoder;
pub mod geometry;
pub mod pose_analyzer;
pub mod pose_detector;
pub mod pose_estimation_service;
pub mod session_store;

pub use detection_state::{Clock, DetectionState, ManualClock, SystemClock};
pub use pose_analyzer::PoseAnalyzer;
pub use pose_detector::PoseDetector;
pub use pose_estimation_service::{PoseEstimationResult, PoseEstimationService, PoseEstimator};
pub use session_store::SessionStore;
