use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::infrastructure::onnx_blazeface_detector::{
    DEFAULT_MIN_SCORE, DEFAULT_NMS_IOU,
};
use crate::shared::constants::{
    DEFAULT_CLASSIFIER_INPUT_SIZE, DEFAULT_FAKE_THRESHOLD, DEFAULT_FRAMES_PER_VIDEO,
    DEFAULT_MARGIN, DEFAULT_MAX_FACE_FRACTION, DEFAULT_NUM_WORKERS,
};
use crate::video::domain::frame_sampler::{Insets, SamplingStrategy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub min_score: f32,
    pub nms_iou: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            nms_iou: DEFAULT_NMS_IOU,
        }
    }
}

/// Run settings for a scan, loadable from JSON.
///
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub frames_per_video: usize,
    pub jitter: usize,
    pub seed: Option<u64>,
    pub insets: Insets,
    pub num_workers: usize,
    pub margin: f32,
    pub max_face_fraction: Option<f64>,
    pub best_face_only: bool,
    pub classifier_input_size: u32,
    /// Classifier batch slots; defaults to `frames_per_video`.
    pub batch_size: Option<usize>,
    pub fake_threshold: f32,
    pub detector: DetectorConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            frames_per_video: DEFAULT_FRAMES_PER_VIDEO,
            jitter: 0,
            seed: None,
            insets: Insets::default(),
            num_workers: DEFAULT_NUM_WORKERS,
            margin: DEFAULT_MARGIN,
            max_face_fraction: Some(DEFAULT_MAX_FACE_FRACTION),
            best_face_only: true,
            classifier_input_size: DEFAULT_CLASSIFIER_INPUT_SIZE,
            batch_size: None,
            fake_threshold: DEFAULT_FAKE_THRESHOLD,
            detector: DetectorConfig::default(),
        }
    }
}

impl ScanConfig {
    /// `<config dir>/facetile/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("facetile").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` if given, else the default location if it exists,
    /// else the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Evenly spaced frames, as many as `frames_per_video`.
    pub fn sampling_strategy(&self) -> SamplingStrategy {
        SamplingStrategy::Stride {
            num_frames: self.frames_per_video,
            jitter: self.jitter,
            seed: self.seed,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(self.frames_per_video)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_per_video == 0 {
            return Err(ConfigError::Invalid(
                "frames_per_video must be at least 1".into(),
            ));
        }
        if self.num_workers == 0 {
            return Err(ConfigError::Invalid("num_workers must be at least 1".into()));
        }
        if self.margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "margin must be non-negative, got {}",
                self.margin
            )));
        }
        if let Some(fraction) = self.max_face_fraction {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(ConfigError::Invalid(format!(
                    "max_face_fraction must be between 0.0 and 1.0, got {fraction}"
                )));
            }
        }
        if self.classifier_input_size == 0 {
            return Err(ConfigError::Invalid(
                "classifier_input_size must be at least 1".into(),
            ));
        }
        if self.batch_size() == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.fake_threshold) {
            return Err(ConfigError::Invalid(format!(
                "fake_threshold must be between 0.0 and 1.0, got {}",
                self.fake_threshold
            )));
        }
        self.insets.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
