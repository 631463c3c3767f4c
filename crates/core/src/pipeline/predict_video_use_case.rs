use std::path::Path;

use crate::classification::domain::face_batch::build_face_batch;
use crate::classification::domain::face_classifier::SharedFaceClassifier;
use crate::pipeline::face_extractor::FaceExtractor;
use crate::shared::constants::NEUTRAL_SCORE;

/// Scores one video as the mean classifier probability over its faces.
///
/// Never fails: a video with no faces, or any error along the way, gets
/// [`NEUTRAL_SCORE`].
pub struct VideoPredictor {
    extractor: FaceExtractor,
    classifier: SharedFaceClassifier,
    batch_size: usize,
}

impl VideoPredictor {
    /// `batch_size` is the number of classifier slots; faces beyond it are
    /// dropped.
    pub fn new(extractor: FaceExtractor, classifier: SharedFaceClassifier, batch_size: usize) -> Self {
        Self {
            extractor,
            classifier,
            batch_size,
        }
    }

    pub fn predict(&mut self, path: &Path) -> f32 {
        match self.try_predict(path) {
            Ok(Some(score)) => score,
            Ok(None) => {
                log::warn!("No faces found in {}; using neutral score", path.display());
                NEUTRAL_SCORE
            }
            Err(e) => {
                log::warn!("Prediction failed for {}: {e}", path.display());
                NEUTRAL_SCORE
            }
        }
    }

    fn try_predict(&mut self, path: &Path) -> Result<Option<f32>, Box<dyn std::error::Error>> {
        let results = self.extractor.process_video(path)?;

        let size = self
            .classifier
            .lock()
            .map_err(|_| "face classifier lock poisoned")?
            .input_size();
        let faces = results.iter().flat_map(|r| r.faces.iter());
        let batch = build_face_batch(faces, self.batch_size, size);
        if batch.filled == 0 {
            return Ok(None);
        }

        let probabilities = self
            .classifier
            .lock()
            .map_err(|_| "face classifier lock poisoned")?
            .classify(batch.images.view())?;
        if probabilities.len() < batch.filled {
            return Err(format!(
                "classifier returned {} scores for {} faces",
                probabilities.len(),
                batch.filled
            )
            .into());
        }

        let score = probabilities[..batch.filled].iter().sum::<f32>() / batch.filled as f32;
        log::debug!(
            "{}: {} face(s), score {score:.4}",
            path.display(),
            batch.filled
        );
        Ok(Some(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::face_classifier::FaceClassifier;
    use crate::detection::domain::face_detector::SharedFaceDetector;
    use crate::pipeline::face_extractor::ExtractionOptions;
    use crate::testing::{face_on_every_tile, StubClassifier, StubDetector, StubReader};
    use crate::video::domain::frame_sampler::{FrameSampler, SamplingStrategy};
    use approx::assert_relative_eq;
    use ndarray::ArrayView4;
    use std::sync::{Arc, Mutex};

    fn predictor(
        reader: StubReader,
        with_faces: bool,
        classifier: SharedFaceClassifier,
        batch_size: usize,
    ) -> VideoPredictor {
        let detector = if with_faces {
            face_on_every_tile()
        } else {
            StubDetector::new((128, 128))
        };
        let detector: SharedFaceDetector = Arc::new(Mutex::new(detector));
        let extractor = FaceExtractor::new(
            detector,
            FrameSampler::new(Box::new(reader)),
            SamplingStrategy::Stride {
                num_frames: 4,
                jitter: 0,
                seed: None,
            },
            ExtractionOptions::default(),
        );
        VideoPredictor::new(extractor, classifier, batch_size)
    }

    #[test]
    fn test_mean_of_face_probabilities() {
        let stub = StubClassifier::new(32, 0.8);
        let sizes = stub.batch_sizes.clone();
        let classifier: SharedFaceClassifier = Arc::new(Mutex::new(stub));
        let mut p = predictor(StubReader::with_frames(10, 128, 128), true, classifier, 6);

        assert_relative_eq!(p.predict(Path::new("clip.mp4")), 0.8);
        assert_eq!(*sizes.lock().unwrap(), vec![6]);
    }

    #[test]
    fn test_only_filled_slots_are_averaged() {
        // Empty slots would drag the mean toward their own score.
        struct SlotScores;
        impl FaceClassifier for SlotScores {
            fn input_size(&self) -> u32 {
                16
            }
            fn classify(
                &mut self,
                faces: ArrayView4<'_, u8>,
            ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
                Ok((0..faces.shape()[0])
                    .map(|i| if i < 4 { 0.9 } else { 0.0 })
                    .collect())
            }
        }

        let classifier: SharedFaceClassifier = Arc::new(Mutex::new(SlotScores));
        let mut p = predictor(StubReader::with_frames(10, 128, 128), true, classifier, 64);
        assert_relative_eq!(p.predict(Path::new("clip.mp4")), 0.9);
    }

    #[test]
    fn test_no_faces_is_neutral_without_classifying() {
        let stub = StubClassifier::new(32, 0.8);
        let sizes = stub.batch_sizes.clone();
        let classifier: SharedFaceClassifier = Arc::new(Mutex::new(stub));
        let mut p = predictor(StubReader::with_frames(10, 128, 128), false, classifier, 4);

        assert_relative_eq!(p.predict(Path::new("clip.mp4")), NEUTRAL_SCORE);
        assert!(sizes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_video_is_neutral() {
        let classifier: SharedFaceClassifier = Arc::new(Mutex::new(StubClassifier::new(32, 0.8)));
        let mut p = predictor(StubReader::with_frames(10, 128, 128).failing_open(), true, classifier, 4);
        assert_relative_eq!(p.predict(Path::new("clip.mp4")), NEUTRAL_SCORE);
    }

    #[test]
    fn test_classifier_error_is_neutral() {
        let classifier: SharedFaceClassifier =
            Arc::new(Mutex::new(StubClassifier::new(32, 0.8).failing()));
        let mut p = predictor(StubReader::with_frames(10, 128, 128), true, classifier, 4);
        assert_relative_eq!(p.predict(Path::new("clip.mp4")), NEUTRAL_SCORE);
    }

    #[test]
    fn test_overflow_faces_are_dropped() {
        let stub = StubClassifier::new(32, 0.3);
        let sizes = stub.batch_sizes.clone();
        let classifier: SharedFaceClassifier = Arc::new(Mutex::new(stub));
        // Four frames with one face each, two slots.
        let mut p = predictor(StubReader::with_frames(10, 128, 128), true, classifier, 2);

        assert_relative_eq!(p.predict(Path::new("clip.mp4")), 0.3);
        assert_eq!(*sizes.lock().unwrap(), vec![2]);
    }
}
