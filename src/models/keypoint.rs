/// Keypoint models for pose analysis
///
/// A detected person is described by the 17 COCO landmarks. Every
/// `KeypointSet` carries all of them; a landmark the model did not find is
/// stored with confidence 0.0 rather than left out.

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::ops::Index;

/// Number of landmarks in the COCO pose layout
pub const LANDMARK_COUNT: usize = 17;

/// COCO landmark identifiers, in model output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Landmark {
    /// All landmarks in index order
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Get landmark name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// Position in the model's flat output
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Look up a landmark by its snake_case name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|landmark| landmark.name() == name)
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single landmark position in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Placeholder for a landmark the model did not report
    pub fn missing() -> Self {
        Self::default()
    }

    /// Visible iff confidence strictly exceeds the threshold
    pub fn is_visible(&self, confidence_threshold: f32) -> bool {
        self.confidence > confidence_threshold
    }

    pub fn has_finite_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The complete set of 17 landmarks for one detected person
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeypointSet {
    points: [Keypoint; LANDMARK_COUNT],
}

impl KeypointSet {
    pub fn new(points: [Keypoint; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a flat `[x, y, conf, x, y, conf, ...]` buffer.
    ///
    /// Triples past the end of the buffer are filled with confidence 0.0.
    pub fn from_flat(values: &[f32]) -> Self {
        let mut points = [Keypoint::missing(); LANDMARK_COUNT];
        for (point, triple) in points.iter_mut().zip(values.chunks_exact(3)) {
            *point = Keypoint::new(triple[0], triple[1], triple[2]);
        }
        Self { points }
    }

    /// Build from a partial mapping; absent landmarks get confidence 0.0
    pub fn from_map(map: &HashMap<Landmark, Keypoint>) -> Self {
        let mut set = Self::default();
        for (landmark, keypoint) in map {
            set.set(*landmark, *keypoint);
        }
        set
    }

    pub fn get(&self, landmark: Landmark) -> &Keypoint {
        &self.points[landmark.index()]
    }

    pub fn set(&mut self, landmark: Landmark, keypoint: Keypoint) {
        self.points[landmark.index()] = keypoint;
    }

    /// Builder-style variant of [`KeypointSet::set`]
    pub fn with(mut self, landmark: Landmark, keypoint: Keypoint) -> Self {
        self.set(landmark, keypoint);
        self
    }

    /// Try-get a landmark that is visible and has a finite position
    pub fn visible(&self, landmark: Landmark, confidence_threshold: f32) -> Option<&Keypoint> {
        let keypoint = self.get(landmark);
        (keypoint.is_visible(confidence_threshold) && keypoint.has_finite_position())
            .then_some(keypoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Landmark, &Keypoint)> {
        Landmark::ALL.iter().copied().zip(self.points.iter())
    }
}

impl Index<Landmark> for KeypointSet {
    type Output = Keypoint;

    fn index(&self, landmark: Landmark) -> &Keypoint {
        self.get(landmark)
    }
}

impl Serialize for KeypointSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(LANDMARK_COUNT))?;
        for (landmark, keypoint) in self.iter() {
            map.serialize_entry(landmark.name(), keypoint)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for KeypointSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = HashMap::<Landmark, Keypoint>::deserialize(deserializer)?;
        Ok(Self::from_map(&map))
    }
}

/// Detection bounding box in pixel corner coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Convert from center/size form
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x1: cx - width / 2.0,
            y1: cy - height / 2.0,
            x2: cx + width / 2.0,
            y2: cy + height / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection over Union
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter_width = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let inter_height = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter_area = inter_width * inter_height;
        let union_area = self.area() + other.area() - inter_area;

        if union_area > 0.0 {
            inter_area / union_area
        } else {
            0.0
        }
    }
}

/// Joint angle measured at a landmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointAngle {
    /// Vertex landmark (e.g. "left_elbow")
    pub joint: Landmark,
    pub angle_degrees: f32,
    /// Minimum confidence of the three landmarks used
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_names_and_indices() {
        assert_eq!(Landmark::Nose.name(), "nose");
        assert_eq!(Landmark::LeftShoulder.index(), 5);
        assert_eq!(Landmark::RightAnkle.index(), 16);
        for (idx, landmark) in Landmark::ALL.iter().enumerate() {
            assert_eq!(landmark.index(), idx);
            assert_eq!(Landmark::from_name(landmark.name()), Some(*landmark));
        }
        assert_eq!(Landmark::from_name("tail"), None);
    }

    #[test]
    fn test_keypoint_visibility_is_strict() {
        assert!(!Keypoint::new(0.0, 0.0, 0.3).is_visible(0.3));
        assert!(Keypoint::new(0.0, 0.0, 0.31).is_visible(0.3));
        assert!(!Keypoint::new(0.0, 0.0, f32::NAN).is_visible(0.3));
    }

    #[test]
    fn test_from_flat_pads_missing_triples() {
        let set = KeypointSet::from_flat(&[10.0, 20.0, 0.9, 30.0, 40.0, 0.8]);
        assert_eq!(*set.get(Landmark::Nose), Keypoint::new(10.0, 20.0, 0.9));
        assert_eq!(*set.get(Landmark::LeftEye), Keypoint::new(30.0, 40.0, 0.8));
        assert_eq!(set.get(Landmark::RightAnkle).confidence, 0.0);
    }

    #[test]
    fn test_visible_rejects_non_finite_positions() {
        let set = KeypointSet::default()
            .with(Landmark::Nose, Keypoint::new(f32::NAN, 5.0, 0.9))
            .with(Landmark::LeftEye, Keypoint::new(1.0, 5.0, 0.9));
        assert!(set.visible(Landmark::Nose, 0.3).is_none());
        assert!(set.visible(Landmark::LeftEye, 0.3).is_some());
        assert!(set.visible(Landmark::RightEye, 0.3).is_none());
    }

    #[test]
    fn test_keypoint_set_json_fills_absent_landmarks() {
        let json = serde_json::json!({
            "left_wrist": { "x": 1.0, "y": 2.0, "confidence": 0.7 }
        });
        let set: KeypointSet = serde_json::from_value(json).unwrap();
        assert_eq!(set[Landmark::LeftWrist].confidence, 0.7);
        assert_eq!(set[Landmark::Nose].confidence, 0.0);

        let back = serde_json::to_value(set).unwrap();
        assert_eq!(back.as_object().unwrap().len(), LANDMARK_COUNT);
        assert_eq!(back["left_wrist"]["y"], 2.0);
    }

    #[test]
    fn test_bounding_box_iou() {
        let a = BoundingBox::from_center(100.0, 100.0, 50.0, 50.0);
        assert!((a.iou(&a) - 1.0).abs() < 0.001);

        let far = BoundingBox::from_center(200.0, 200.0, 50.0, 50.0);
        assert!(a.iou(&far) < 0.001);

        let near = BoundingBox::from_center(120.0, 120.0, 50.0, 50.0);
        let iou = a.iou(&near);
        assert!(iou > 0.0 && iou < 1.0);
    }
}
