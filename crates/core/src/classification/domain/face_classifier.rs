use std::sync::{Arc, Mutex};

use ndarray::ArrayView4;

/// Domain interface for the downstream face classifier.
pub trait FaceClassifier: Send {
    /// Side length of the square images the model expects.
    fn input_size(&self) -> u32;

    /// Scores a `(N, size, size, 3)` RGB batch; one probability per slot.
    fn classify(&mut self, faces: ArrayView4<'_, u8>) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}

pub type SharedFaceClassifier = Arc<Mutex<dyn FaceClassifier>>;
