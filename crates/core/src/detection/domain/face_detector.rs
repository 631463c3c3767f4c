use std::sync::{Arc, Mutex};

use ndarray::ArrayView4;

use crate::shared::detection::Detection;

/// Domain interface for a fixed-input-size face detector.
///
/// Inference may mutate session state, hence `&mut self`; share one model
/// between threads through [`SharedFaceDetector`].
pub trait FaceDetector: Send {
    /// Model input as `(width, height)`.
    fn input_size(&self) -> (u32, u32);

    /// Runs the model on a `(N, height, width, 3)` tile batch.
    ///
    /// Returns one list per tile, in batch order, with coordinates
    /// normalized to the tile.
    fn predict_on_batch(
        &mut self,
        tiles: ArrayView4<'_, u8>,
    ) -> Result<Vec<Vec<Detection>>, Box<dyn std::error::Error>>;

    /// Collapses detections of the same face into one. No ordering contract.
    fn nms(&self, detections: Vec<Detection>) -> Vec<Detection>;
}

pub type SharedFaceDetector = Arc<Mutex<dyn FaceDetector>>;
