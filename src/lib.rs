//! Raised-arm gesture detection over pose-estimation keypoints.
//!
//! The [`services::PoseAnalyzer`] turns one person's keypoints into pose
//! predicates, [`services::DetectionState`] confirms the gesture over
//! consecutive frames and debounces alerts, and [`api`] exposes both over
//! HTTP next to a YOLOv8-pose model.

pub mod api;
pub mod config;
pub mod models;
pub mod services;
