//! In-memory test doubles shared by the unit tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ndarray::ArrayView4;

use crate::classification::domain::face_classifier::FaceClassifier;
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::face_extractor::{ExtractionOptions, FaceExtractor};
use crate::pipeline::predict_video_use_case::VideoPredictor;
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_sampler::{FrameSampler, SamplingStrategy};
use crate::video::domain::video_reader::VideoReader;

pub(crate) fn solid_frame(width: u32, height: u32, index: usize, value: u8) -> Frame {
    Frame::new(
        vec![value; (width * height * 3) as usize],
        width,
        height,
        3,
        index,
    )
}

#[derive(Clone, Default)]
pub(crate) struct ReaderCounters {
    grabs: Arc<AtomicUsize>,
    retrieves: Arc<AtomicUsize>,
    seeks: Arc<AtomicUsize>,
}

impl ReaderCounters {
    pub(crate) fn grabs(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }

    pub(crate) fn retrieves(&self) -> usize {
        self.retrieves.load(Ordering::SeqCst)
    }

    pub(crate) fn seeks(&self) -> usize {
        self.seeks.load(Ordering::SeqCst)
    }
}

/// Serves pre-built frames through the grab/retrieve interface.
pub(crate) struct StubReader {
    frames: Vec<Frame>,
    reported_frames: usize,
    position: Option<usize>,
    fail_open: bool,
    fail_open_paths: Vec<PathBuf>,
    fail_retrieve: HashSet<usize>,
    counters: ReaderCounters,
}

impl StubReader {
    pub(crate) fn with_frames(count: usize, width: u32, height: u32) -> Self {
        let frames = (0..count)
            .map(|i| solid_frame(width, height, i, (i % 256) as u8))
            .collect();
        Self {
            frames,
            reported_frames: count,
            position: None,
            fail_open: false,
            fail_open_paths: Vec::new(),
            fail_retrieve: HashSet::new(),
            counters: ReaderCounters::default(),
        }
    }

    /// Overrides the frame count reported in metadata.
    pub(crate) fn reporting_frames(mut self, count: usize) -> Self {
        self.reported_frames = count;
        self
    }

    pub(crate) fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub(crate) fn failing_open_for(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_open_paths.push(path.into());
        self
    }

    pub(crate) fn failing_retrieve_at(mut self, index: usize) -> Self {
        self.fail_retrieve.insert(index);
        self
    }

    pub(crate) fn counted(mut self, counters: ReaderCounters) -> Self {
        self.counters = counters;
        self
    }
}

impl VideoReader for StubReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        if self.fail_open || self.fail_open_paths.iter().any(|p| p == path) {
            return Err(format!("cannot open {}", path.display()).into());
        }
        self.position = None;
        let (width, height) = self
            .frames
            .first()
            .map(|f| (f.width(), f.height()))
            .unwrap_or((0, 0));
        Ok(VideoMetadata {
            width,
            height,
            fps: 30.0,
            total_frames: self.reported_frames,
            codec: "stub".to_string(),
            source_path: Some(path.to_path_buf()),
        })
    }

    fn grab(&mut self) -> Result<bool, Box<dyn std::error::Error>> {
        self.counters.grabs.fetch_add(1, Ordering::SeqCst);
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.frames.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn retrieve(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        self.counters.retrieves.fetch_add(1, Ordering::SeqCst);
        let position = self.position.ok_or("nothing grabbed")?;
        if self.fail_retrieve.contains(&position) {
            return Err(format!("corrupt frame {position}").into());
        }
        Ok(self.frames[position].clone())
    }

    fn read_at(&mut self, index: usize) -> Result<Frame, Box<dyn std::error::Error>> {
        self.counters.seeks.fetch_add(1, Ordering::SeqCst);
        self.position = Some(index);
        self.frames
            .get(index)
            .cloned()
            .ok_or_else(|| format!("frame {index} not found").into())
    }

    fn close(&mut self) {
        self.position = None;
    }
}

type TileFn = Box<dyn Fn(usize) -> Vec<Detection> + Send>;

/// Returns scripted detections per tile and records every batch it sees.
pub(crate) struct StubDetector {
    input_size: (u32, u32),
    per_tile: TileFn,
    pub(crate) batch_sizes: Arc<Mutex<Vec<usize>>>,
    tile_count_override: Option<usize>,
}

impl StubDetector {
    pub(crate) fn new(input_size: (u32, u32)) -> Self {
        Self {
            input_size,
            per_tile: Box::new(|_| Vec::new()),
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
            tile_count_override: None,
        }
    }

    /// `f(tile_index)` gives the detections for each tile of a batch.
    pub(crate) fn with_detections(
        mut self,
        f: impl Fn(usize) -> Vec<Detection> + Send + 'static,
    ) -> Self {
        self.per_tile = Box::new(f);
        self
    }

    /// Returns this many per-tile lists regardless of batch size.
    pub(crate) fn returning_tiles(mut self, count: usize) -> Self {
        self.tile_count_override = Some(count);
        self
    }
}

impl FaceDetector for StubDetector {
    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn predict_on_batch(
        &mut self,
        tiles: ArrayView4<'_, u8>,
    ) -> Result<Vec<Vec<Detection>>, Box<dyn std::error::Error>> {
        let n = tiles.shape()[0];
        self.batch_sizes
            .lock()
            .map_err(|_| "batch log poisoned")?
            .push(n);
        let count = self.tile_count_override.unwrap_or(n);
        Ok((0..count).map(|i| (self.per_tile)(i)).collect())
    }

    fn nms(&self, detections: Vec<Detection>) -> Vec<Detection> {
        detections
    }
}

/// Gives every slot the same probability, or fails on demand.
pub(crate) struct StubClassifier {
    input_size: u32,
    score: f32,
    fail: bool,
    pub(crate) batch_sizes: Arc<Mutex<Vec<usize>>>,
}

impl StubClassifier {
    pub(crate) fn new(input_size: u32, score: f32) -> Self {
        Self {
            input_size,
            score,
            fail: false,
            batch_sizes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl FaceClassifier for StubClassifier {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn classify(
        &mut self,
        faces: ArrayView4<'_, u8>,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        if self.fail {
            return Err("classifier failure".into());
        }
        let n = faces.shape()[0];
        self.batch_sizes
            .lock()
            .map_err(|_| "batch log poisoned")?
            .push(n);
        Ok(vec![self.score; n])
    }
}

/// A predictor over stubs sampling four evenly spaced frames per video.
pub(crate) fn stub_predictor(
    reader: StubReader,
    detector: StubDetector,
    classifier: StubClassifier,
    batch_size: usize,
) -> VideoPredictor {
    let extractor = FaceExtractor::new(
        Arc::new(Mutex::new(detector)),
        FrameSampler::new(Box::new(reader)),
        SamplingStrategy::Stride {
            num_frames: 4,
            jitter: 0,
            seed: None,
        },
        ExtractionOptions::default(),
    );
    VideoPredictor::new(extractor, Arc::new(Mutex::new(classifier)), batch_size)
}

/// Detector reporting one mid-sized face on every tile.
pub(crate) fn face_on_every_tile() -> StubDetector {
    StubDetector::new((128, 128))
        .with_detections(|_| vec![Detection::from_box(0.2, 0.2, 0.4, 0.4, 0.9)])
}
