pub mod app;
pub mod detection;
pub mod limits;

pub use app::{AppConfig, ModelConfig};
pub use detection::DetectionConfig;
pub use limits::LimitsConfig;
