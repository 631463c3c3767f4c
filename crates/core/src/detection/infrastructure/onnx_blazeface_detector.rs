/// BlazeFace front-camera face detector using ONNX Runtime via `ort`.
///
/// Consumes 128×128 tiles in batches and reports boxes plus six landmarks
/// per face, normalized to the tile.
use std::path::Path;

use ndarray::{Array4, ArrayView4};

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::math::sigmoid;
use crate::detection::infrastructure::weighted_nms::weighted_nms;
use crate::shared::config::DetectorConfig;
use crate::shared::detection::{Detection, NUM_KEYPOINTS};
use crate::shared::onnx_session::{load_session, InferenceError};

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// Default confidence threshold.
pub const DEFAULT_MIN_SCORE: f32 = 0.75;

/// Default IoU above which weighted NMS blends detections.
pub const DEFAULT_NMS_IOU: f32 = 0.3;

/// Number of BlazeFace anchors (front-camera model).
const NUM_ANCHORS: usize = 896;

/// Box (4) plus landmark (2 × 6) regression values per anchor.
const NUM_COORDS: usize = 4 + 2 * NUM_KEYPOINTS;

/// Raw logits are clipped to this magnitude before the sigmoid.
const SCORE_CLIP: f32 = 100.0;

pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    min_score: f32,
    nms_iou: f32,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    pub fn new(model_path: &Path, config: &DetectorConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        Ok(Self {
            session,
            min_score: config.min_score,
            nms_iou: config.nms_iou,
            anchors: generate_anchors(),
        })
    }
}

impl FaceDetector for OnnxBlazefaceDetector {
    fn input_size(&self) -> (u32, u32) {
        (INPUT_SIZE, INPUT_SIZE)
    }

    fn predict_on_batch(
        &mut self,
        tiles: ArrayView4<'_, u8>,
    ) -> Result<Vec<Vec<Detection>>, Box<dyn std::error::Error>> {
        let (n, h, w, c) = tiles.dim();
        let size = INPUT_SIZE as usize;
        if (h, w, c) != (size, size, 3) {
            return Err(InferenceError::InputShape {
                expected: vec![n, size, size, 3],
                actual: vec![n, h, w, c],
            }
            .into());
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        // 1. Preprocess: [-1, 1], NCHW
        let input_value = ort::value::Tensor::from_array(preprocess(tiles))?;

        // 2. Inference
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Regressors: [N, 896, 16]; classificators: [N, 896, 1]. Export tools
        // disagree on output order, so tell them apart by shape.
        if outputs.len() < 2 {
            return Err(InferenceError::OutputCount {
                expected: 2,
                actual: outputs.len(),
            }
            .into());
        }
        let first = outputs[0].try_extract_array::<f32>()?;
        let second = outputs[1].try_extract_array::<f32>()?;
        let (regressors, scores) = if first.shape().last() == Some(&NUM_COORDS) {
            (first, second)
        } else {
            (second, first)
        };

        if regressors.shape() != [n, NUM_ANCHORS, NUM_COORDS] {
            return Err(InferenceError::OutputShape {
                name: "regressor",
                shape: regressors.shape().to_vec(),
            }
            .into());
        }
        if scores.len() != n * NUM_ANCHORS {
            return Err(InferenceError::OutputShape {
                name: "score",
                shape: scores.shape().to_vec(),
            }
            .into());
        }

        let reg_data = regressors
            .as_standard_layout()
            .iter()
            .copied()
            .collect::<Vec<f32>>();
        let score_data = scores
            .as_standard_layout()
            .iter()
            .copied()
            .collect::<Vec<f32>>();

        // 3. Decode anchor boxes + filter by confidence, per tile
        let detections = reg_data
            .chunks(NUM_ANCHORS * NUM_COORDS)
            .zip(score_data.chunks(NUM_ANCHORS))
            .map(|(raw_boxes, raw_scores)| {
                decode_tile(raw_boxes, raw_scores, &self.anchors, self.min_score)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "BlazeFace: {} tiles, {} raw detections",
            n,
            detections.iter().map(Vec::len).sum::<usize>()
        );
        Ok(detections)
    }

    fn nms(&self, detections: Vec<Detection>) -> Vec<Detection> {
        weighted_nms(detections, self.nms_iou)
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Maps `(N, H, W, 3)` u8 tiles to `(N, 3, H, W)` floats in `[-1, 1]`.
fn preprocess(tiles: ArrayView4<'_, u8>) -> Array4<f32> {
    tiles
        .mapv(|v| v as f32 / 127.5 - 1.0)
        .permuted_axes([0, 3, 1, 2])
        .as_standard_layout()
        .into_owned()
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Turns one tile's raw regressor and logit rows into normalized detections.
fn decode_tile(
    raw_boxes: &[f32],
    raw_scores: &[f32],
    anchors: &[[f32; 2]],
    min_score: f32,
) -> Vec<Detection> {
    let scale = INPUT_SIZE as f32;
    raw_scores
        .iter()
        .zip(anchors)
        .zip(raw_boxes.chunks(NUM_COORDS))
        .filter_map(|((&logit, &[ax, ay]), raw)| {
            let score = sigmoid(logit.clamp(-SCORE_CLIP, SCORE_CLIP));
            if score < min_score {
                return None;
            }

            let cx = raw[0] / scale + ax;
            let cy = raw[1] / scale + ay;
            let w = raw[2] / scale;
            let h = raw[3] / scale;
            let bbox = [cy - h / 2.0, cx - w / 2.0, cy + h / 2.0, cx + w / 2.0];

            let mut keypoints = [[0.0f32; 2]; NUM_KEYPOINTS];
            for (k, kp) in keypoints.iter_mut().enumerate() {
                kp[0] = raw[4 + 2 * k] / scale + ax;
                kp[1] = raw[5 + 2 * k] / scale + ay;
            }
            Some(Detection::new(bbox, keypoints, score))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Anchor generation (BlazeFace front camera)
// ---------------------------------------------------------------------------

/// Generate BlazeFace anchor centres.
///
/// The front-camera model uses two feature map sizes: 16×16 and 8×8,
/// with 2 and 6 anchors per cell respectively.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
