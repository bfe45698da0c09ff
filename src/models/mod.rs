// Keypoint, pose and API data models

pub mod detection_api;
pub mod keypoint;
pub mod pose;

pub use detection_api::*;
pub use keypoint::*;
pub use pose::*;
