/// Geometric Pose Analyzer
///
/// Stateless classification of a single person's keypoints into pose
/// predicates. Image y grows downward, so "above" means a smaller y.
///
/// Every predicate fails closed: a landmark that is not visible, or whose
/// coordinates are not finite, makes the predicate false. Nothing in this
/// module returns an error.

use crate::config::DetectionConfig;
use crate::models::keypoint::{JointAngle, Keypoint, KeypointSet, Landmark};
use crate::models::pose::{KeypointReport, PersonPose, PoseAnalysisResult, PoseDetection};
use crate::services::geometry;

/// Landmarks that must all be visible to evaluate standing
pub const STANDING_LANDMARKS: [Landmark; 7] = [
    Landmark::LeftHip,
    Landmark::RightHip,
    Landmark::LeftKnee,
    Landmark::RightKnee,
    Landmark::LeftAnkle,
    Landmark::RightAnkle,
    Landmark::Nose,
];

/// Which arm to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// (shoulder, elbow, wrist) for this side
    pub fn arm(&self) -> (Landmark, Landmark, Landmark) {
        match self {
            Side::Left => (Landmark::LeftShoulder, Landmark::LeftElbow, Landmark::LeftWrist),
            Side::Right => (
                Landmark::RightShoulder,
                Landmark::RightElbow,
                Landmark::RightWrist,
            ),
        }
    }
}

/// Joints reported with an angle: (joint, first neighbour, second neighbour)
const REPORTED_JOINTS: [(Landmark, Landmark, Landmark); 4] = [
    (Landmark::LeftElbow, Landmark::LeftShoulder, Landmark::LeftWrist),
    (Landmark::RightElbow, Landmark::RightShoulder, Landmark::RightWrist),
    (Landmark::LeftShoulder, Landmark::LeftHip, Landmark::LeftElbow),
    (Landmark::RightShoulder, Landmark::RightHip, Landmark::RightElbow),
];

/// Visible iff present and confidence strictly exceeds the threshold
pub fn is_keypoint_visible(keypoint: Option<&Keypoint>, confidence_threshold: f32) -> bool {
    keypoint.map_or(false, |kp| kp.is_visible(confidence_threshold))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseAnalyzer {
    visibility_threshold: f32,
    standing_height_ratio: f32,
    elbow_shoulder_threshold: f32,
    hand_elbow_threshold: f32,
}

impl Default for PoseAnalyzer {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl PoseAnalyzer {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            visibility_threshold: config.visibility_threshold,
            standing_height_ratio: config.standing_height_ratio,
            elbow_shoulder_threshold: config.elbow_shoulder_threshold,
            hand_elbow_threshold: config.hand_elbow_threshold,
        }
    }

    fn visible<'a>(&self, keypoints: &'a KeypointSet, landmark: Landmark) -> Option<&'a Keypoint> {
        keypoints.visible(landmark, self.visibility_threshold)
    }

    /// Thigh length relative to nose-to-ankle height exceeds the standing ratio
    pub fn is_person_standing(&self, keypoints: &KeypointSet) -> bool {
        self.standing_ratio(keypoints)
            .map_or(false, |ratio| ratio > self.standing_height_ratio)
    }

    fn standing_ratio(&self, keypoints: &KeypointSet) -> Option<f32> {
        let all_visible = STANDING_LANDMARKS
            .iter()
            .all(|landmark| self.visible(keypoints, *landmark).is_some());
        if !all_visible {
            return None;
        }

        let y = |landmark: Landmark| keypoints[landmark].y;
        let avg_ankle_y = geometry::midpoint(y(Landmark::LeftAnkle), y(Landmark::RightAnkle))?;
        let avg_hip_y = geometry::midpoint(y(Landmark::LeftHip), y(Landmark::RightHip))?;
        let avg_knee_y = geometry::midpoint(y(Landmark::LeftKnee), y(Landmark::RightKnee))?;

        let body_height = (avg_ankle_y - y(Landmark::Nose)).abs();
        let thigh_length = (avg_knee_y - avg_hip_y).abs();

        (body_height > 0.0).then(|| thigh_length / body_height)
    }

    /// Elbow above shoulder and wrist above elbow, each by its pixel margin
    pub fn arm_meets_target_condition(
        &self,
        shoulder: &Keypoint,
        elbow: &Keypoint,
        wrist: &Keypoint,
    ) -> bool {
        let all_visible = [shoulder, elbow, wrist]
            .iter()
            .all(|kp| kp.is_visible(self.visibility_threshold) && kp.has_finite_position());

        all_visible
            && elbow.y < shoulder.y - self.elbow_shoulder_threshold
            && wrist.y < elbow.y - self.hand_elbow_threshold
    }

    pub fn is_arm_raised(&self, keypoints: &KeypointSet, side: Side) -> bool {
        let (shoulder, elbow, wrist) = side.arm();
        self.arm_meets_target_condition(
            keypoints.get(shoulder),
            keypoints.get(elbow),
            keypoints.get(wrist),
        )
    }

    /// Either arm raised (inclusive OR)
    pub fn target_pose_detected(&self, keypoints: &KeypointSet) -> bool {
        self.is_arm_raised(keypoints, Side::Left) || self.is_arm_raised(keypoints, Side::Right)
    }

    /// Standing and target pose are independent; neither gates the other.
    pub fn analyze(&self, keypoints: &KeypointSet) -> PoseAnalysisResult {
        let left_arm_raised = self.is_arm_raised(keypoints, Side::Left);
        let right_arm_raised = self.is_arm_raised(keypoints, Side::Right);

        PoseAnalysisResult {
            standing: self.is_person_standing(keypoints),
            target_pose_detected: left_arm_raised || right_arm_raised,
            left_arm_raised,
            right_arm_raised,
        }
    }

    /// Angles at elbows and shoulders where all three landmarks are visible
    pub fn joint_angles(&self, keypoints: &KeypointSet) -> Vec<JointAngle> {
        REPORTED_JOINTS
            .iter()
            .filter_map(|&(joint, a, c)| {
                let vertex = self.visible(keypoints, joint)?;
                let a = self.visible(keypoints, a)?;
                let c = self.visible(keypoints, c)?;
                let angle_degrees = geometry::angle_at(a, vertex, c)?;

                Some(JointAngle {
                    joint,
                    angle_degrees,
                    confidence: a.confidence.min(vertex.confidence).min(c.confidence),
                })
            })
            .collect()
    }

    /// Full per-person report; `index` is the 0-based position in the frame
    pub fn describe(&self, index: usize, person: &PersonPose) -> PoseDetection {
        let analysis = self.analyze(&person.keypoints);

        let keypoints = person
            .keypoints
            .iter()
            .map(|(landmark, kp)| KeypointReport {
                name: landmark.name(),
                x: kp.x,
                y: kp.y,
                confidence: kp.confidence,
                visible: kp.is_visible(self.visibility_threshold),
            })
            .collect();

        PoseDetection {
            person_id: index + 1,
            confidence: person.confidence,
            bbox: person.bbox,
            standing: analysis.standing,
            target_pose_detected: analysis.target_pose_detected,
            pose_analysis: analysis,
            keypoints,
            joint_angles: self.joint_angles(&person.keypoints),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing_person() -> KeypointSet {
        // Long-legged figure: thigh 130px of a 200px body
        KeypointSet::default()
            .with(Landmark::Nose, Keypoint::new(320.0, 100.0, 0.9))
            .with(Landmark::LeftHip, Keypoint::new(300.0, 150.0, 0.9))
            .with(Landmark::RightHip, Keypoint::new(340.0, 150.0, 0.9))
            .with(Landmark::LeftKnee, Keypoint::new(300.0, 280.0, 0.9))
            .with(Landmark::RightKnee, Keypoint::new(340.0, 280.0, 0.9))
            .with(Landmark::LeftAnkle, Keypoint::new(300.0, 300.0, 0.9))
            .with(Landmark::RightAnkle, Keypoint::new(340.0, 300.0, 0.9))
    }

    #[test]
    fn test_is_keypoint_visible() {
        let kp = Keypoint::new(1.0, 1.0, 0.3);
        assert!(!is_keypoint_visible(Some(&kp), 0.3));
        assert!(is_keypoint_visible(Some(&Keypoint::new(1.0, 1.0, 0.3001)), 0.3));
        assert!(!is_keypoint_visible(None, 0.3));
    }

    #[test]
    fn test_standing_ratio_above_threshold() {
        let analyzer = PoseAnalyzer::default();
        assert!(analyzer.is_person_standing(&standing_person()));
    }

    #[test]
    fn test_standing_ratio_below_threshold() {
        let analyzer = PoseAnalyzer::default();
        // Thigh 100px of a 200px body: ratio 0.5
        let keypoints = standing_person()
            .with(Landmark::LeftKnee, Keypoint::new(300.0, 250.0, 0.9))
            .with(Landmark::RightKnee, Keypoint::new(340.0, 250.0, 0.9));
        assert!(!analyzer.is_person_standing(&keypoints));
    }

    #[test]
    fn test_standing_fails_closed_on_missing_landmark() {
        let analyzer = PoseAnalyzer::default();
        let keypoints = standing_person().with(Landmark::Nose, Keypoint::missing());
        assert!(!analyzer.is_person_standing(&keypoints));
    }

    #[test]
    fn test_standing_zero_body_height() {
        let analyzer = PoseAnalyzer::default();
        let keypoints = standing_person().with(Landmark::Nose, Keypoint::new(320.0, 300.0, 0.9));
        assert!(!analyzer.is_person_standing(&keypoints));
    }

    #[test]
    fn test_arm_condition_margins() {
        let analyzer = PoseAnalyzer::default();
        let shoulder = Keypoint::new(100.0, 200.0, 0.9);

        assert!(analyzer.arm_meets_target_condition(
            &shoulder,
            &Keypoint::new(100.0, 184.0, 0.9),
            &Keypoint::new(100.0, 168.0, 0.9),
        ));
        // Exactly on the margin is not enough
        assert!(!analyzer.arm_meets_target_condition(
            &shoulder,
            &Keypoint::new(100.0, 185.0, 0.9),
            &Keypoint::new(100.0, 100.0, 0.9),
        ));
        assert!(!analyzer.arm_meets_target_condition(
            &shoulder,
            &Keypoint::new(100.0, 150.0, 0.9),
            &Keypoint::new(100.0, 135.0, 0.9),
        ));
    }

    #[test]
    fn test_arm_condition_requires_visibility() {
        let analyzer = PoseAnalyzer::default();
        assert!(!analyzer.arm_meets_target_condition(
            &Keypoint::new(100.0, 200.0, 0.9),
            &Keypoint::new(100.0, 150.0, 0.2),
            &Keypoint::new(100.0, 100.0, 0.9),
        ));
    }

    #[test]
    fn test_arm_condition_rejects_nan() {
        let analyzer = PoseAnalyzer::default();
        assert!(!analyzer.arm_meets_target_condition(
            &Keypoint::new(100.0, f32::NAN, 0.9),
            &Keypoint::new(100.0, 150.0, 0.9),
            &Keypoint::new(100.0, 100.0, 0.9),
        ));
    }

    #[test]
    fn test_right_arm_alone_is_enough() {
        let analyzer = PoseAnalyzer::default();
        let keypoints = KeypointSet::default()
            .with(Landmark::RightShoulder, Keypoint::new(400.0, 200.0, 0.8))
            .with(Landmark::RightElbow, Keypoint::new(410.0, 160.0, 0.8))
            .with(Landmark::RightWrist, Keypoint::new(420.0, 110.0, 0.8));

        let result = analyzer.analyze(&keypoints);
        assert!(result.target_pose_detected);
        assert!(result.right_arm_raised);
        assert!(!result.left_arm_raised);
    }

    #[test]
    fn test_custom_margins() {
        let config = DetectionConfig {
            elbow_shoulder_threshold: 60.0,
            ..Default::default()
        };
        let analyzer = PoseAnalyzer::new(&config);
        let keypoints = KeypointSet::default()
            .with(Landmark::LeftShoulder, Keypoint::new(100.0, 200.0, 0.9))
            .with(Landmark::LeftElbow, Keypoint::new(95.0, 150.0, 0.9))
            .with(Landmark::LeftWrist, Keypoint::new(90.0, 100.0, 0.9));
        assert!(!analyzer.target_pose_detected(&keypoints));
    }

    #[test]
    fn test_joint_angles_only_for_visible_joints() {
        let analyzer = PoseAnalyzer::default();
        let keypoints = KeypointSet::default()
            .with(Landmark::LeftShoulder, Keypoint::new(0.0, 0.0, 0.9))
            .with(Landmark::LeftElbow, Keypoint::new(0.0, 10.0, 0.8))
            .with(Landmark::LeftWrist, Keypoint::new(10.0, 10.0, 0.7));

        let angles = analyzer.joint_angles(&keypoints);
        assert_eq!(angles.len(), 1);
        assert_eq!(angles[0].joint, Landmark::LeftElbow);
        assert!((angles[0].angle_degrees - 90.0).abs() < 0.01);
        assert_eq!(angles[0].confidence, 0.7);
    }

    #[test]
    fn test_describe_numbers_people_from_one() {
        let analyzer = PoseAnalyzer::default();
        let detection = analyzer.describe(2, &PersonPose::new(standing_person()));
        assert_eq!(detection.person_id, 3);
        assert!(detection.standing);
        assert!(!detection.target_pose_detected);
        assert_eq!(detection.keypoints.len(), 17);
        assert_eq!(detection.keypoints[0].name, "nose");
        assert!(detection.keypoints[0].visible);
        assert!(!detection.keypoints[1].visible);
    }
}
