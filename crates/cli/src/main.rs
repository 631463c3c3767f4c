use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};

use clap::{Args, Parser, Subcommand};

use facetile_core::classification::domain::face_classifier::SharedFaceClassifier;
use facetile_core::classification::infrastructure::onnx_face_classifier::OnnxFaceClassifier;
use facetile_core::detection::domain::face_detector::SharedFaceDetector;
use facetile_core::detection::infrastructure::onnx_blazeface_detector::OnnxBlazefaceDetector;
use facetile_core::pipeline::face_extractor::{ExtractionOptions, FaceExtractor};
use facetile_core::pipeline::infrastructure::threaded_prediction_executor::ThreadedPredictionExecutor;
use facetile_core::pipeline::predict_video_use_case::VideoPredictor;
use facetile_core::pipeline::prediction_executor::{PredictionExecutor, ProgressCallback};
use facetile_core::pipeline::prediction_writer::{write_predictions, PredictionRecord};
use facetile_core::shared::config::ScanConfig;
use facetile_core::shared::constants::{FAKE_LABEL, VIDEO_EXTENSIONS};
use facetile_core::video::domain::frame_sampler::{FrameSampler, Insets, SamplingStrategy};
use facetile_core::video::domain::image_writer::ImageWriter;
use facetile_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facetile_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Tiled face extraction and per-video face classification.
#[derive(Parser)]
#[command(name = "facetile", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score every video in a directory and write a CSV of verdicts.
    Predict(PredictArgs),
    /// Save the faces found in one video as PNG files.
    Extract(ExtractArgs),
}

#[derive(Args)]
struct PredictArgs {
    /// Directory of videos to score.
    input_dir: PathBuf,

    /// BlazeFace ONNX model.
    #[arg(long)]
    detector_model: PathBuf,

    /// Face classifier ONNX model (one logit per face).
    #[arg(long)]
    classifier_model: PathBuf,

    /// Output CSV file.
    #[arg(long, default_value = "predictions.csv")]
    output: PathBuf,

    /// Score above which a video is labelled FAKE (0.0-1.0).
    #[arg(long)]
    threshold: Option<f32>,

    /// Number of videos scored in parallel.
    #[arg(long)]
    workers: Option<usize>,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Args)]
struct ExtractArgs {
    /// Input video file.
    video: PathBuf,

    /// BlazeFace ONNX model.
    #[arg(long)]
    detector_model: PathBuf,

    /// Directory for the face images.
    #[arg(long)]
    out_dir: PathBuf,

    /// Keep every face per frame instead of only the most confident one.
    #[arg(long)]
    all_faces: bool,

    #[command(flatten)]
    scan: ScanArgs,
}

/// Settings shared by both commands; flags override the config file.
#[derive(Args)]
struct ScanArgs {
    /// JSON config file (default: <config dir>/facetile/config.json if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames sampled per video.
    #[arg(long)]
    frames: Option<usize>,

    /// Random offset (in frames) applied to each sampled frame index.
    #[arg(long)]
    jitter: Option<usize>,

    /// Seed for jittered sampling.
    #[arg(long)]
    seed: Option<u64>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    min_score: Option<f32>,

    /// Box growth around each face as a fraction of its height.
    #[arg(long)]
    margin: Option<f32>,

    /// Fraction of width trimmed from each side of every frame.
    #[arg(long)]
    inset_horizontal: Option<f64>,

    /// Fraction of height trimmed from the top and bottom of every frame.
    #[arg(long)]
    inset_vertical: Option<f64>,
}

impl ScanArgs {
    fn load_config(&self) -> Result<ScanConfig, Box<dyn std::error::Error>> {
        let mut config = ScanConfig::load_or_default(self.config.as_deref())?;
        if let Some(frames) = self.frames {
            config.frames_per_video = frames;
        }
        if let Some(jitter) = self.jitter {
            config.jitter = jitter;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(min_score) = self.min_score {
            config.detector.min_score = min_score;
        }
        if let Some(margin) = self.margin {
            config.margin = margin;
        }
        if self.inset_horizontal.is_some() || self.inset_vertical.is_some() {
            config.insets = Insets::new(
                self.inset_horizontal.unwrap_or(config.insets.horizontal),
                self.inset_vertical.unwrap_or(config.insets.vertical),
            );
        }
        Ok(config)
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Command::Predict(args) => run_predict(args),
        Command::Extract(args) => run_extract(args),
    }
}

fn run_predict(args: PredictArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = args.scan.load_config()?;
    if let Some(threshold) = args.threshold {
        config.fake_threshold = threshold;
    }
    if let Some(workers) = args.workers {
        config.num_workers = workers;
    }
    validate_predict(&args, &config)?;

    let videos = collect_videos(&args.input_dir)?;
    if videos.is_empty() {
        return Err(format!("No videos found in {}", args.input_dir.display()).into());
    }
    log::info!("Found {} video(s) in {}", videos.len(), args.input_dir.display());

    let detector: SharedFaceDetector = Arc::new(Mutex::new(OnnxBlazefaceDetector::new(
        &args.detector_model,
        &config.detector,
    )?));
    let classifier: SharedFaceClassifier = Arc::new(Mutex::new(OnnxFaceClassifier::new(
        &args.classifier_model,
        config.classifier_input_size,
    )?));

    let factory_config = config.clone();
    let factory = move || -> Result<VideoPredictor, Box<dyn std::error::Error>> {
        let extractor = build_extractor(
            detector.clone(),
            &factory_config,
            factory_config.sampling_strategy(),
            ExtractionOptions::from(&factory_config),
        );
        Ok(VideoPredictor::new(
            extractor,
            classifier.clone(),
            factory_config.batch_size(),
        ))
    };

    let progress: ProgressCallback = Box::new(|done, total| {
        eprint!("\rScored {done}/{total} videos");
    });
    let executor = ThreadedPredictionExecutor::new(config.num_workers);
    let scores = executor.execute(&videos, &factory, Some(progress))?;
    eprintln!();

    let records: Vec<PredictionRecord> = videos
        .iter()
        .zip(scores)
        .map(|(path, score)| PredictionRecord::new(file_name(path), score, config.fake_threshold))
        .collect();
    let fakes = records.iter().filter(|r| r.label == FAKE_LABEL).count();
    write_predictions(&args.output, &records)?;
    log::info!(
        "{fakes}/{} video(s) labelled FAKE; results written to {}",
        records.len(),
        args.output.display()
    );
    Ok(())
}

fn run_extract(args: ExtractArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = args.scan.load_config()?;
    if args.all_faces {
        config.best_face_only = false;
    }
    validate_extract(&args, &config)?;

    let detector: SharedFaceDetector = Arc::new(Mutex::new(OnnxBlazefaceDetector::new(
        &args.detector_model,
        &config.detector,
    )?));
    let mut extractor = build_extractor(
        detector,
        &config,
        config.sampling_strategy(),
        ExtractionOptions::from(&config),
    );

    let results = extractor.process_video(&args.video)?;
    let stem = args
        .video
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let written = ImageFileWriter::new().write_faces(&args.out_dir, &stem, &results, None)?;
    log::info!(
        "Saved {} face crop(s) from {} frame(s) to {}",
        written.len(),
        results.len(),
        args.out_dir.display()
    );
    Ok(())
}

fn build_extractor(
    detector: SharedFaceDetector,
    config: &ScanConfig,
    strategy: SamplingStrategy,
    options: ExtractionOptions,
) -> FaceExtractor {
    let sampler = FrameSampler::new(Box::new(FfmpegReader::new())).with_insets(config.insets);
    FaceExtractor::new(detector, sampler, strategy, options)
}

fn validate_predict(args: &PredictArgs, config: &ScanConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input_dir.is_dir() {
        return Err(format!("Input directory not found: {}", args.input_dir.display()).into());
    }
    require_file(&args.detector_model, "Detector model")?;
    require_file(&args.classifier_model, "Classifier model")?;
    validate_scan(config)
}

fn validate_extract(args: &ExtractArgs, config: &ScanConfig) -> Result<(), Box<dyn std::error::Error>> {
    require_file(&args.video, "Input file")?;
    require_file(&args.detector_model, "Detector model")?;
    validate_scan(config)
}

fn validate_scan(config: &ScanConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    if !(0.0..=1.0).contains(&config.detector.min_score) {
        return Err(format!(
            "Min score must be between 0.0 and 1.0, got {}",
            config.detector.min_score
        )
        .into());
    }
    Ok(())
}

fn require_file(path: &Path, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    if path.is_file() {
        Ok(())
    } else {
        Err(format!("{what} not found: {}", path.display()).into())
    }
}

/// Video files directly inside `dir`, sorted by name.
fn collect_videos(dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut videos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_video(&path) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
