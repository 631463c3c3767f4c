use std::path::{Path, PathBuf};

use ndarray::{Array4, ArrayView4, Axis};

use crate::detection::domain::face_cropper::{add_margin, crop_faces};
use crate::detection::domain::face_detector::SharedFaceDetector;
use crate::detection::domain::tile_geometry::TileGeometry;
use crate::detection::domain::tiler::{tile_frames, untile_detections};
use crate::pipeline::result_filter::{keep_only_best_face, remove_large_crops};
use crate::shared::config::ScanConfig;
use crate::shared::constants::{DEFAULT_MARGIN, DEFAULT_MAX_FACE_FRACTION};
use crate::shared::detection::Detection;
use crate::shared::face_crop::FrameResult;
use crate::shared::frame_batch::FrameBatch;
use crate::video::domain::frame_sampler::{FrameSampler, SamplingStrategy};

/// Post-detection settings for [`FaceExtractor`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOptions {
    /// Box growth as a fraction of box height.
    pub margin: f32,
    /// Crops covering this share of the frame or more are dropped.
    pub max_face_fraction: Option<f64>,
    pub best_face_only: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            margin: DEFAULT_MARGIN,
            max_face_fraction: Some(DEFAULT_MAX_FACE_FRACTION),
            best_face_only: true,
        }
    }
}

impl From<&ScanConfig> for ExtractionOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            margin: config.margin,
            max_face_fraction: config.max_face_fraction,
            best_face_only: config.best_face_only,
        }
    }
}

/// One sampled video waiting for detection.
struct SampledVideo {
    video_idx: usize,
    batch: FrameBatch,
    geometry: TileGeometry,
    tiles: Array4<u8>,
}

/// Samples frames from videos and cuts out the faces in them.
///
/// Frames are split into square tiles so a small-input detector still sees
/// faces at a usable scale; all tiles of a call go through the detector in
/// one batch.
pub struct FaceExtractor {
    detector: SharedFaceDetector,
    sampler: FrameSampler,
    strategy: SamplingStrategy,
    options: ExtractionOptions,
}

impl FaceExtractor {
    pub fn new(
        detector: SharedFaceDetector,
        sampler: FrameSampler,
        strategy: SamplingStrategy,
        options: ExtractionOptions,
    ) -> Self {
        Self {
            detector,
            sampler,
            strategy,
            options,
        }
    }

    /// Extracts faces from `videos[i]` for every `i` in `video_idxs`.
    ///
    /// Videos that yield no frames are skipped. Each [`FrameResult`] carries
    /// the index of its video in `videos`.
    pub fn process_videos(
        &mut self,
        videos: &[PathBuf],
        video_idxs: &[usize],
    ) -> Result<Vec<FrameResult>, Box<dyn std::error::Error>> {
        let input_size = self
            .detector
            .lock()
            .map_err(|_| "face detector lock poisoned")?
            .input_size();

        let mut sampled = Vec::with_capacity(video_idxs.len());
        for &video_idx in video_idxs {
            let Some(path) = videos.get(video_idx) else {
                log::warn!("Video index {video_idx} out of range ({} videos)", videos.len());
                continue;
            };
            let Some(batch) = self.sampler.sample(path, &self.strategy) else {
                log::warn!("Skipping {}: no frames sampled", path.display());
                continue;
            };
            let geometry = TileGeometry::new(batch.width(), batch.height(), input_size);
            let tiles = tile_frames(&batch, &geometry);
            sampled.push(SampledVideo {
                video_idx,
                batch,
                geometry,
                tiles,
            });
        }

        if sampled.is_empty() {
            return Ok(Vec::new());
        }

        let views: Vec<ArrayView4<'_, u8>> = sampled.iter().map(|v| v.tiles.view()).collect();
        let all_tiles = ndarray::concatenate(Axis(0), &views)?;
        let total_tiles = all_tiles.len_of(Axis(0));

        let raw = self
            .detector
            .lock()
            .map_err(|_| "face detector lock poisoned")?
            .predict_on_batch(all_tiles.view())?;
        assert_eq!(
            raw.len(),
            total_tiles,
            "detector returned {} tile results for a batch of {} tiles",
            raw.len(),
            total_tiles
        );
        log::debug!(
            "Detected faces on {} tiles from {} video(s)",
            total_tiles,
            sampled.len()
        );

        let mut results = Vec::new();
        let mut offset = 0;
        for video in &sampled {
            let count = video.tiles.len_of(Axis(0));
            let video_raw = &raw[offset..offset + count];
            offset += count;
            results.extend(self.frame_results(video, video_raw)?);
        }

        if let Some(pct) = self.options.max_face_fraction {
            remove_large_crops(&mut results, pct);
        }
        if self.options.best_face_only {
            keep_only_best_face(&mut results);
        }
        Ok(results)
    }

    pub fn process_video(&mut self, path: &Path) -> Result<Vec<FrameResult>, Box<dyn std::error::Error>> {
        self.process_videos(&[path.to_path_buf()], &[0])
    }

    fn frame_results(
        &self,
        video: &SampledVideo,
        raw: &[Vec<Detection>],
    ) -> Result<Vec<FrameResult>, Box<dyn std::error::Error>> {
        let merged = untile_detections(&video.geometry, video.batch.len(), raw);
        let detector = self
            .detector
            .lock()
            .map_err(|_| "face detector lock poisoned")?;

        let (width, height) = video.geometry.frame_size();
        let results = video
            .batch
            .frames()
            .iter()
            .zip(merged)
            .map(|(frame, detections)| {
                let mut detections = detector.nms(detections);
                detections.sort_by(|a, b| b.score.total_cmp(&a.score));
                let boxes = add_margin(&detections, width, height, self.options.margin);
                FrameResult {
                    video_idx: video.video_idx,
                    frame_idx: frame.index(),
                    frame_width: width,
                    frame_height: height,
                    faces: crop_faces(frame, &boxes),
                }
            })
            .collect();
        Ok(results)
    }
}
