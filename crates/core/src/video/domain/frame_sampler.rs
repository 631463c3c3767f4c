use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;
use crate::shared::frame_batch::FrameBatch;
use crate::video::domain::video_reader::VideoReader;

/// Fractional margins trimmed symmetrically from every sampled frame.
///
/// `horizontal` removes `floor(W * horizontal)` columns from both the left
/// and right edge; `vertical` does the same for rows at the top and bottom.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Insets {
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("horizontal", self.horizontal), ("vertical", self.vertical)] {
            if !(0.0..0.5).contains(&value) {
                return Err(format!(
                    "{name} inset must be in [0.0, 0.5), got {value}"
                ));
            }
        }
        Ok(())
    }

    pub fn apply(&self, frame: Frame) -> Frame {
        let w = frame.width();
        let h = frame.height();
        let p = (w as f64 * self.horizontal) as u32;
        let q = (h as f64 * self.vertical) as u32;
        if p == 0 && q == 0 {
            return frame;
        }
        frame.crop(p, q, w.saturating_sub(p), h.saturating_sub(q))
    }
}

/// Which frames to pull out of a video.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    /// Evenly spaced over the whole video, optionally jittered.
    Stride {
        num_frames: usize,
        jitter: usize,
        seed: Option<u64>,
    },
    /// Uniformly random, without replacement.
    Random { num_frames: usize, seed: Option<u64> },
    /// Caller-chosen indices.
    Indices(Vec<usize>),
    /// One frame, read by seeking.
    Single(usize),
    /// The frame halfway through the video, read by seeking.
    Middle,
}

/// `num_frames` indices evenly spaced over `[0, frame_count - 1]`,
/// including both endpoints and truncated toward zero.
pub fn stride_indices(frame_count: usize, num_frames: usize) -> Vec<usize> {
    if frame_count == 0 || num_frames == 0 {
        return Vec::new();
    }
    if num_frames == 1 {
        return vec![0];
    }
    let last = (frame_count - 1) as f64;
    let intervals = (num_frames - 1) as f64;
    (0..num_frames)
        .map(|i| (i as f64 * last / intervals) as usize)
        .collect()
}

/// Offsets each index by a uniform integer in `[-jitter, jitter)`, clamped
/// into the video.
pub fn jitter_indices<R: Rng>(
    indices: &[usize],
    jitter: usize,
    frame_count: usize,
    rng: &mut R,
) -> Vec<usize> {
    if jitter == 0 || frame_count == 0 {
        return indices.to_vec();
    }
    let jitter = jitter as i64;
    let last = frame_count as i64 - 1;
    indices
        .iter()
        .map(|&idx| {
            let offset = rng.random_range(-jitter..jitter);
            (idx as i64 + offset).clamp(0, last) as usize
        })
        .collect()
}

/// Up to `num_frames` distinct indices drawn uniformly from the video,
/// sorted ascending.
pub fn random_indices<R: Rng>(frame_count: usize, num_frames: usize, rng: &mut R) -> Vec<usize> {
    let amount = num_frames.min(frame_count);
    let mut indices = rand::seq::index::sample(rng, frame_count, amount).into_vec();
    indices.sort_unstable();
    indices
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Reads a sparse, ordered set of frames from a video.
///
/// Multi-frame reads walk the stream once from the start, grabbing every
/// frame but only converting the ones requested. Every read returns `None`
/// rather than an error when nothing could be read; failures are logged.
pub struct FrameSampler {
    reader: Box<dyn VideoReader>,
    insets: Insets,
}

impl FrameSampler {
    pub fn new(reader: Box<dyn VideoReader>) -> Self {
        Self {
            reader,
            insets: Insets::default(),
        }
    }

    pub fn with_insets(mut self, insets: Insets) -> Self {
        self.insets = insets;
        self
    }

    pub fn sample(&mut self, path: &Path, strategy: &SamplingStrategy) -> Option<FrameBatch> {
        match strategy {
            SamplingStrategy::Stride {
                num_frames,
                jitter,
                seed,
            } => self.read_frames(path, *num_frames, *jitter, *seed),
            SamplingStrategy::Random { num_frames, seed } => {
                self.read_random_frames(path, *num_frames, *seed)
            }
            SamplingStrategy::Indices(indices) => self.read_frames_at_indices(path, indices),
            SamplingStrategy::Single(index) => self.read_frame_at_index(path, *index),
            SamplingStrategy::Middle => self.read_middle_frame(path),
        }
    }

    pub fn read_frames(
        &mut self,
        path: &Path,
        num_frames: usize,
        jitter: usize,
        seed: Option<u64>,
    ) -> Option<FrameBatch> {
        if num_frames == 0 {
            log::warn!("Requested zero frames from {}", path.display());
            return None;
        }
        let frame_count = self.open(path)?;
        let mut indices = stride_indices(frame_count, num_frames);
        if jitter > 0 {
            let mut rng = seeded_rng(seed);
            indices = jitter_indices(&indices, jitter, frame_count, &mut rng);
        }
        let result = self.read_sequential(path, indices);
        self.reader.close();
        result
    }

    pub fn read_random_frames(
        &mut self,
        path: &Path,
        num_frames: usize,
        seed: Option<u64>,
    ) -> Option<FrameBatch> {
        if num_frames == 0 {
            log::warn!("Requested zero frames from {}", path.display());
            return None;
        }
        let frame_count = self.open(path)?;
        let mut rng = seeded_rng(seed);
        let indices = random_indices(frame_count, num_frames, &mut rng);
        let result = self.read_sequential(path, indices);
        self.reader.close();
        result
    }

    /// Reads the given frames. Indices are sorted and deduplicated first.
    pub fn read_frames_at_indices(&mut self, path: &Path, indices: &[usize]) -> Option<FrameBatch> {
        if indices.is_empty() {
            log::warn!("No frame indices requested from {}", path.display());
            return None;
        }
        self.open(path)?;
        let result = self.read_sequential(path, indices.to_vec());
        self.reader.close();
        result
    }

    pub fn read_frame_at_index(&mut self, path: &Path, index: usize) -> Option<FrameBatch> {
        let frame_count = self.open(path)?;
        let result = self.read_single(path, index, frame_count);
        self.reader.close();
        result
    }

    pub fn read_middle_frame(&mut self, path: &Path) -> Option<FrameBatch> {
        let frame_count = self.open(path)?;
        let result = self.read_single(path, frame_count / 2, frame_count);
        self.reader.close();
        result
    }

    /// Opens the reader and returns the frame count, or `None` if the video
    /// cannot be opened or reports no frames.
    fn open(&mut self, path: &Path) -> Option<usize> {
        let metadata = match self.reader.open(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Cannot open video {}: {e}", path.display());
                return None;
            }
        };
        if metadata.total_frames == 0 {
            log::warn!("Video {} reports no frames", path.display());
            self.reader.close();
            return None;
        }
        Some(metadata.total_frames)
    }

    fn read_sequential(&mut self, path: &Path, mut targets: Vec<usize>) -> Option<FrameBatch> {
        targets.sort_unstable();
        targets.dedup();
        let &last = targets.last()?;

        let mut frames = Vec::with_capacity(targets.len());
        let mut next = 0;
        for position in 0..=last {
            match self.reader.grab() {
                Ok(true) => {}
                Ok(false) => {
                    log::warn!(
                        "Video {} ended at frame {position}, before frame {last}",
                        path.display()
                    );
                    break;
                }
                Err(e) => {
                    log::warn!(
                        "Error grabbing frame {position} from {}: {e}",
                        path.display()
                    );
                    break;
                }
            }

            if position != targets[next] {
                continue;
            }
            next += 1;

            match self.reader.retrieve() {
                Ok(frame) => {
                    debug_assert_eq!(frame.index(), position);
                    frames.push(self.insets.apply(frame));
                }
                Err(e) => log::warn!(
                    "Error retrieving frame {position} from {}: {e}",
                    path.display()
                ),
            }
        }

        if frames.is_empty() {
            log::warn!("No frames read from {}", path.display());
        } else {
            log::debug!(
                "Read {}/{} frames from {}",
                frames.len(),
                targets.len(),
                path.display()
            );
        }
        FrameBatch::new(frames)
    }

    fn read_single(&mut self, path: &Path, index: usize, frame_count: usize) -> Option<FrameBatch> {
        if index >= frame_count {
            log::warn!(
                "Frame {index} is out of range for {} ({frame_count} frames)",
                path.display()
            );
            return None;
        }
        match self.reader.read_at(index) {
            Ok(frame) => FrameBatch::new(vec![self.insets.apply(frame)]),
            Err(e) => {
                log::warn!("Error retrieving frame {index} from {}: {e}", path.display());
                None
            }
        }
    }
}
