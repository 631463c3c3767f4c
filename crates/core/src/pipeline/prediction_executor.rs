use std::path::PathBuf;

use crate::pipeline::predict_video_use_case::VideoPredictor;

/// Builds a fresh predictor; called once per worker.
pub type PredictorFactory =
    dyn Fn() -> Result<VideoPredictor, Box<dyn std::error::Error>> + Send + Sync;

/// Progress callback receiving `(done, total)` after every video.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send>;

/// Abstracts how a list of videos is scored.
///
/// This is a port (application-layer interface). Infrastructure provides
/// concrete implementations.
pub trait PredictionExecutor: Send {
    /// Returns one score per video, in input order.
    fn execute(
        &self,
        videos: &[PathBuf],
        factory: &PredictorFactory,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
