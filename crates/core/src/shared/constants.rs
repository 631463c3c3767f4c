/// Fraction of the box height added around each face (doubled above it).
pub const DEFAULT_MARGIN: f32 = 0.2;

/// Crops covering at least this fraction of the frame are treated as false positives.
pub const DEFAULT_MAX_FACE_FRACTION: f64 = 0.1;

/// Score reported for a video that could not be scored.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Videos scoring above this are labelled fake.
pub const DEFAULT_FAKE_THRESHOLD: f32 = 0.6;

pub const DEFAULT_FRAMES_PER_VIDEO: usize = 64;
pub const DEFAULT_NUM_WORKERS: usize = 4;
pub const DEFAULT_CLASSIFIER_INPUT_SIZE: u32 = 150;

pub const FAKE_LABEL: &str = "FAKE";
pub const REAL_LABEL: &str = "REAL";

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v"];
