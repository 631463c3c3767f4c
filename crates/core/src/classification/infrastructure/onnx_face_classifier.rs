use std::path::Path;

use ndarray::{Array4, ArrayView4, Axis};

use crate::classification::domain::face_classifier::FaceClassifier;
use crate::detection::infrastructure::math::sigmoid;
use crate::shared::onnx_session::{load_session, InferenceError};

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Binary face classifier emitting one logit per image.
pub struct OnnxFaceClassifier {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxFaceClassifier {
    pub fn new(model_path: &Path, input_size: u32) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        Ok(Self {
            session,
            input_size,
        })
    }
}

impl FaceClassifier for OnnxFaceClassifier {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn classify(&mut self, faces: ArrayView4<'_, u8>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let (n, h, w, c) = faces.dim();
        let size = self.input_size as usize;
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

        let input_value = ort::value::Tensor::from_array(preprocess(faces))?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err(InferenceError::OutputCount {
                expected: 1,
                actual: 0,
            }
            .into());
        }

        let logits = outputs[0].try_extract_array::<f32>()?;
        if logits.len() != n {
            return Err(InferenceError::OutputShape {
                name: "logit",
                shape: logits.shape().to_vec(),
            }
            .into());
        }
        Ok(logits.iter().map(|&x| sigmoid(x)).collect())
    }
}

/// ImageNet-normalized `(N, 3, H, W)` floats from `(N, H, W, 3)` pixels.
fn preprocess(faces: ArrayView4<'_, u8>) -> Array4<f32> {
    let mut tensor = faces
        .mapv(|v| v as f32 / 255.0)
        .permuted_axes([0, 3, 1, 2])
        .as_standard_layout()
        .into_owned();
    for (c, mut plane) in tensor.axis_iter_mut(Axis(1)).enumerate() {
        plane.mapv_inplace(|v| (v - IMAGENET_MEAN[c]) / IMAGENET_STD[c]);
    }
    tensor
}
