/// Per-stream pose detector
///
/// Owns the analyzer and the temporal state for one video stream. Frames
/// must be fed in arrival order; independent streams each get their own
/// `PoseDetector`.

use tracing::{debug, warn};

use crate::config::DetectionConfig;
use crate::models::pose::{DetectionSnapshot, FrameReport, PersonPose, PoseDetection};
use crate::services::detection_state::{Clock, DetectionState, SystemClock};
use crate::services::pose_analyzer::PoseAnalyzer;

pub struct PoseDetector<C: Clock = SystemClock> {
    analyzer: PoseAnalyzer,
    state: DetectionState<C>,
}

impl PoseDetector<SystemClock> {
    pub fn new(config: &DetectionConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> PoseDetector<C> {
    pub fn with_clock(config: &DetectionConfig, clock: C) -> Self {
        Self {
            analyzer: PoseAnalyzer::new(config),
            state: DetectionState::with_clock(config, clock),
        }
    }

    /// Analyze every person in a frame without touching session state
    pub fn analyze_persons(&self, persons: &[PersonPose]) -> Vec<PoseDetection> {
        analyze_persons(&self.analyzer, persons)
    }

    /// Analyze a frame, advance the confirmation counter and fire an alert
    /// when the pose is confirmed and the cooldown has elapsed.
    pub fn process_frame(&mut self, persons: &[PersonPose]) -> FrameReport {
        let detections = self.analyze_persons(persons);
        let frame_match = detections.iter().any(|d| d.target_pose_detected);
        let confirmed = self.state.update(frame_match);

        let alert_triggered = confirmed && self.state.should_show_alert();
        if alert_triggered {
            self.state.trigger_alert();
            warn!(
                consecutive_detections = self.state.consecutive_detections(),
                "Target pose detected: elbow above shoulder and hand above elbow"
            );
        }

        debug!(
            people = detections.len(),
            frame_match,
            consecutive_detections = self.state.consecutive_detections(),
            confirmed,
            "Frame processed"
        );

        FrameReport {
            people_detected: detections.len(),
            detections,
            frame_match,
            consecutive_detections: self.state.consecutive_detections(),
            confirmed,
            alert_triggered,
        }
    }

    pub fn snapshot(&self) -> DetectionSnapshot {
        self.state.snapshot()
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }
}

/// Stateless per-person analysis of a frame
pub fn analyze_persons(analyzer: &PoseAnalyzer, persons: &[PersonPose]) -> Vec<PoseDetection> {
    persons
        .iter()
        .enumerate()
        .map(|(index, person)| analyzer.describe(index, person))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::keypoint::{Keypoint, KeypointSet, Landmark};
    use crate::services::detection_state::ManualClock;
    use chrono::Duration;

    fn raised_left_arm() -> PersonPose {
        PersonPose::new(
            KeypointSet::default()
                .with(Landmark::LeftShoulder, Keypoint::new(100.0, 200.0, 0.9))
                .with(Landmark::LeftElbow, Keypoint::new(95.0, 150.0, 0.9))
                .with(Landmark::LeftWrist, Keypoint::new(90.0, 100.0, 0.9)),
        )
    }

    fn idle_person() -> PersonPose {
        PersonPose::new(
            KeypointSet::default()
                .with(Landmark::LeftShoulder, Keypoint::new(100.0, 200.0, 0.9))
                .with(Landmark::LeftElbow, Keypoint::new(100.0, 260.0, 0.9))
                .with(Landmark::LeftWrist, Keypoint::new(100.0, 320.0, 0.9)),
        )
    }

    #[test]
    fn test_any_person_matching_counts_for_the_frame() {
        let mut detector = PoseDetector::with_clock(&DetectionConfig::default(), ManualClock::default());
        let report = detector.process_frame(&[idle_person(), raised_left_arm()]);

        assert!(report.frame_match);
        assert_eq!(report.people_detected, 2);
        assert_eq!(report.consecutive_detections, 1);
        assert!(!report.detections[0].target_pose_detected);
        assert!(report.detections[1].target_pose_detected);
    }

    #[test]
    fn test_empty_frame_resets_counter() {
        let mut detector = PoseDetector::with_clock(&DetectionConfig::default(), ManualClock::default());
        detector.process_frame(&[raised_left_arm()]);
        let report = detector.process_frame(&[]);

        assert!(!report.frame_match);
        assert_eq!(report.consecutive_detections, 0);
    }

    #[test]
    fn test_alert_fires_once_per_cooldown() {
        let clock = ManualClock::default();
        let mut detector = PoseDetector::with_clock(&DetectionConfig::default(), clock.clone());
        let frame = [raised_left_arm()];

        let alerts: Vec<bool> = (0..5)
            .map(|_| detector.process_frame(&frame).alert_triggered)
            .collect();
        assert_eq!(alerts, vec![false, false, false, false, true]);

        clock.advance(Duration::milliseconds(500));
        let report = detector.process_frame(&frame);
        assert!(report.confirmed);
        assert!(!report.alert_triggered);

        clock.advance(Duration::milliseconds(1600));
        assert!(detector.process_frame(&frame).alert_triggered);
    }

    #[test]
    fn test_analyze_persons_leaves_state_alone() {
        let detector = PoseDetector::with_clock(&DetectionConfig::default(), ManualClock::default());
        let detections = detector.analyze_persons(&[raised_left_arm()]);

        assert_eq!(detections.len(), 1);
        assert_eq!(detector.snapshot().consecutive_detections, 0);
        assert!(detector.snapshot().detection_history.is_empty());
    }
}
