/// Pose Estimation Service using ONNX Runtime
///
/// Runs a YOLOv8-pose model and returns every detected person with 17 COCO
/// keypoints in the pixel space of the frame that was passed in.
///
/// Model Details:
/// - Input: [1, 3, S, S] FP32 (NCHW, RGB, normalized [0,1]), S = input size
/// - Output: [1, 56, N] FP32 (56 = 4 bbox + 1 conf + 51 keypoints)
use anyhow::{anyhow, Context, Result};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageBuffer, Rgb};
use ndarray::{Array4, ArrayViewD, Axis, Ix2};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use std::time::Instant;

use crate::config::ModelConfig;
use crate::models::keypoint::{BoundingBox, KeypointSet, Landmark, LANDMARK_COUNT};
use crate::models::pose::PersonPose;

/// Values per prediction row: 4 bbox + 1 confidence + 17 × (x, y, conf)
const PREDICTION_WIDTH: usize = 5 + LANDMARK_COUNT * 3;

/// Letterbox padding color
const PAD_COLOR: Rgb<u8> = Rgb([114, 114, 114]);

/// Result of pose estimation on one frame
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEstimationResult {
    pub persons: Vec<PersonPose>,
    pub inference_time_ms: u64,
    pub image_width: u32,
    pub image_height: u32,
}

/// Anything that can turn a frame into person detections
#[cfg_attr(test, mockall::automock)]
pub trait PoseEstimator: Send + Sync {
    fn estimate_pose(&self, image: &DynamicImage) -> Result<PoseEstimationResult>;
}

/// Letterbox transform from frame pixels to model input pixels
#[derive(Debug, Clone, Copy, PartialEq)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    fn fit(width: u32, height: u32, target: u32) -> Self {
        let scale = (target as f32 / width as f32).min(target as f32 / height as f32);
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;
        Self {
            scale,
            pad_x: (target.saturating_sub(new_width) / 2) as f32,
            pad_y: (target.saturating_sub(new_height) / 2) as f32,
        }
    }

    fn to_frame_x(&self, x: f32) -> f32 {
        (x - self.pad_x) / self.scale
    }

    fn to_frame_y(&self, y: f32) -> f32 {
        (y - self.pad_y) / self.scale
    }
}

/// Pose Estimation Service
pub struct PoseEstimationService {
    session: Mutex<Session>,
    model_input_size: u32,
    confidence_threshold: f32,
    nms_iou_threshold: f32,
}

impl PoseEstimationService {
    /// Load the ONNX model described by `config`
    pub fn new(config: &ModelConfig) -> Result<Self> {
        config.validate()?;

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(4)?
            .commit_from_file(&config.model_path)
            .with_context(|| {
                format!("Failed to load ONNX model from {}", config.model_path.display())
            })?;

        tracing::info!(
            "Loaded pose estimation model from {}",
            config.model_path.display()
        );

        Ok(Self {
            session: Mutex::new(session),
            model_input_size: config.input_size,
            confidence_threshold: config.person_confidence_threshold.clamp(0.0, 1.0),
            nms_iou_threshold: config.nms_iou_threshold.clamp(0.0, 1.0),
        })
    }

    /// Letterbox resize, RGB, [0, 1] normalization, NCHW layout
    fn preprocess_image(&self, image: &DynamicImage) -> (Array4<f32>, Letterbox) {
        let (width, height) = image.dimensions();
        let target_size = self.model_input_size;
        let letterbox = Letterbox::fit(width, height, target_size);

        let new_width = ((width as f32 * letterbox.scale) as u32).max(1);
        let new_height = ((height as f32 * letterbox.scale) as u32).max(1);
        let resized = image
            .resize_exact(new_width, new_height, FilterType::Triangle)
            .to_rgb8();

        let mut padded: ImageBuffer<Rgb<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(target_size, target_size, PAD_COLOR);
        image::imageops::overlay(
            &mut padded,
            &resized,
            letterbox.pad_x as i64,
            letterbox.pad_y as i64,
        );

        let size = target_size as usize;
        let mut input_tensor = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, pixel) in padded.enumerate_pixels() {
            for channel in 0..3 {
                input_tensor[[0, channel, y as usize, x as usize]] =
                    pixel[channel] as f32 / 255.0;
            }
        }

        (input_tensor, letterbox)
    }

    /// Decode `[1, 56, N]` into frame-space persons, filtered and NMS'd
    fn postprocess_output(
        &self,
        output: &ArrayViewD<f32>,
        letterbox: Letterbox,
    ) -> Result<Vec<PersonPose>> {
        if output.ndim() != 3 {
            return Err(anyhow!("Unexpected model output shape {:?}", output.shape()));
        }
        let output = output
            .index_axis(Axis(0), 0)
            .into_dimensionality::<Ix2>()
            .context("Model output is not a 2D prediction table")?;
        if output.shape()[0] != PREDICTION_WIDTH {
            return Err(anyhow!("Unexpected model output shape {:?}", output.shape()));
        }

        let mut candidates = Vec::new();
        for column in output.axis_iter(Axis(1)) {
            let confidence = column[4];
            if confidence.is_nan() || confidence < self.confidence_threshold {
                continue;
            }

            let bbox = BoundingBox::from_center(column[0], column[1], column[2], column[3]);
            let flat: Vec<f32> = column.iter().skip(5).copied().collect();
            candidates.push(PersonPose {
                keypoints: KeypointSet::from_flat(&flat),
                bbox: Some(bbox),
                confidence: Some(confidence),
            });
        }

        let persons = apply_nms(candidates, self.nms_iou_threshold)
            .into_iter()
            .map(|person| to_frame_space(person, letterbox))
            .collect();

        Ok(persons)
    }
}

impl PoseEstimator for PoseEstimationService {
    fn estimate_pose(&self, image: &DynamicImage) -> Result<PoseEstimationResult> {
        let start_time = Instant::now();
        let (image_width, image_height) = image.dimensions();

        let (input, letterbox) = self.preprocess_image(image);
        let input_tensor = Tensor::from_array(input).context("Failed to build input tensor")?;

        let persons = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow!("Pose estimation session lock poisoned"))?;
            let outputs = session
                .run(ort::inputs!["images" => input_tensor])
                .context("Failed to run inference")?;
            let output: ArrayViewD<f32> = outputs["output0"]
                .try_extract_array()
                .context("Failed to extract output tensor")?;
            self.postprocess_output(&output, letterbox)?
        };

        let inference_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(
            persons = persons.len(),
            inference_time_ms,
            "Pose estimation completed"
        );

        Ok(PoseEstimationResult {
            persons,
            inference_time_ms,
            image_width,
            image_height,
        })
    }
}

/// Greedy Non-Maximum Suppression, highest confidence first
fn apply_nms(mut detections: Vec<PersonPose>, iou_threshold: f32) -> Vec<PersonPose> {
    detections.sort_by(|a, b| {
        b.confidence
            .unwrap_or(0.0)
            .total_cmp(&a.confidence.unwrap_or(0.0))
    });

    let mut keep: Vec<PersonPose> = Vec::new();
    for candidate in detections {
        let overlaps = match candidate.bbox {
            Some(bbox) => keep
                .iter()
                .filter_map(|kept| kept.bbox)
                .any(|kept| kept.iou(&bbox) >= iou_threshold),
            None => false,
        };
        if !overlaps {
            keep.push(candidate);
        }
    }
    keep
}

fn to_frame_space(mut person: PersonPose, letterbox: Letterbox) -> PersonPose {
    person.bbox = person.bbox.map(|bbox| {
        BoundingBox::new(
            letterbox.to_frame_x(bbox.x1),
            letterbox.to_frame_y(bbox.y1),
            letterbox.to_frame_x(bbox.x2),
            letterbox.to_frame_y(bbox.y2),
        )
    });

    let mut keypoints = person.keypoints;
    for landmark in Landmark::ALL {
        let mut kp = *keypoints.get(landmark);
        kp.x = letterbox.to_frame_x(kp.x);
        kp.y = letterbox.to_frame_y(kp.y);
        keypoints.set(landmark, kp);
    }
    person.keypoints = keypoints;
    person
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::keypoint::Keypoint;

    fn candidate(cx: f32, confidence: f32) -> PersonPose {
        PersonPose {
            keypoints: KeypointSet::default(),
            bbox: Some(BoundingBox::from_center(cx, 100.0, 50.0, 50.0)),
            confidence: Some(confidence),
        }
    }

    #[test]
    fn test_new_rejects_zero_input_size() {
        let config = ModelConfig {
            input_size: 0,
            ..Default::default()
        };
        let error = PoseEstimationService::new(&config).err().unwrap();
        assert!(error.to_string().contains("input_size"));
    }

    #[test]
    fn test_letterbox_landscape_frame() {
        let letterbox = Letterbox::fit(1280, 720, 640);
        assert!((letterbox.scale - 0.5).abs() < 1e-6);
        assert_eq!(letterbox.pad_x, 0.0);
        assert_eq!(letterbox.pad_y, 140.0);
        assert!((letterbox.to_frame_y(140.0)).abs() < 1e-6);
        assert!((letterbox.to_frame_x(320.0) - 640.0).abs() < 1e-4);
    }

    #[test]
    fn test_nms_drops_overlapping_lower_confidence() {
        let kept = apply_nms(
            vec![candidate(100.0, 0.6), candidate(105.0, 0.9), candidate(400.0, 0.5)],
            0.45,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, Some(0.9));
        assert_eq!(kept[1].confidence, Some(0.5));
    }

    #[test]
    fn test_frame_space_keeps_confidence() {
        let letterbox = Letterbox::fit(1280, 720, 640);
        let person = PersonPose::new(
            KeypointSet::default().with(Landmark::Nose, Keypoint::new(320.0, 240.0, 0.8)),
        );
        let mapped = to_frame_space(person, letterbox);
        let nose = mapped.keypoints[Landmark::Nose];
        assert!((nose.x - 640.0).abs() < 1e-3);
        assert!((nose.y - 200.0).abs() < 1e-3);
        assert_eq!(nose.confidence, 0.8);
    }
}
