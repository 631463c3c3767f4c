use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender};

use crate::pipeline::prediction_executor::{PredictionExecutor, PredictorFactory, ProgressCallback};
use crate::shared::constants::DEFAULT_NUM_WORKERS;

/// Scores videos on a fixed pool of worker threads.
///
/// Layout: `job queue → N workers [own predictor each] → result queue → caller`
///
/// Each worker builds its own predictor, so decoders are never shared;
/// models are shared through the predictor's locked handles.
pub struct ThreadedPredictionExecutor {
    num_workers: usize,
}

impl ThreadedPredictionExecutor {
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
        }
    }
}

impl Default for ThreadedPredictionExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_WORKERS)
    }
}

impl PredictionExecutor for ThreadedPredictionExecutor {
    fn execute(
        &self,
        videos: &[PathBuf],
        factory: &PredictorFactory,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let total = videos.len();
        if total == 0 {
            return Ok(Vec::new());
        }
        let workers = self.num_workers.min(total);
        log::info!("Scoring {total} video(s) on {workers} worker(s)");

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, PathBuf)>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, f32)>();
        for job in videos.iter().cloned().enumerate() {
            job_tx
                .send(job)
                .map_err(|_| "Job channel closed unexpectedly")?;
        }
        drop(job_tx);

        let mut scores: Vec<Option<f32>> = vec![None; total];
        let worker_errors = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|worker| {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    scope.spawn(move || run_worker(worker, factory, job_rx, result_tx))
                })
                .collect();
            drop(result_tx);

            let mut done = 0;
            for (idx, score) in result_rx.iter() {
                scores[idx] = Some(score);
                done += 1;
                if let Some(ref callback) = on_progress {
                    callback(done, total);
                }
            }

            join_workers(handles)
        });

        collect_scores(scores, worker_errors)
    }
}

/// Pulls jobs until the queue is empty. Fails only if no predictor can be
/// built; per-video failures are scored neutral by the predictor itself.
fn run_worker(
    worker: usize,
    factory: &PredictorFactory,
    job_rx: Receiver<(usize, PathBuf)>,
    result_tx: Sender<(usize, f32)>,
) -> Result<(), String> {
    let mut predictor = factory().map_err(|e| format!("worker {worker}: {e}"))?;
    for (idx, path) in job_rx {
        log::debug!("Worker {worker} scoring {}", path.display());
        let score = predictor.predict(&path);
        if result_tx.send((idx, score)).is_err() {
            break;
        }
    }
    Ok(())
}

/// Joins every worker, re-raising the first panic on the calling thread.
fn join_workers(
    handles: Vec<std::thread::ScopedJoinHandle<'_, Result<(), String>>>,
) -> Vec<String> {
    let mut errors = Vec::new();
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::warn!("Prediction worker failed to start: {e}");
                errors.push(e);
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
    errors
}

fn collect_scores(
    scores: Vec<Option<f32>>,
    worker_errors: Vec<String>,
) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    let missing = scores.iter().filter(|s| s.is_none()).count();
    if missing > 0 {
        let reason = worker_errors
            .into_iter()
            .next()
            .unwrap_or_else(|| "no worker reported an error".to_string());
        return Err(format!("{missing} video(s) were not scored: {reason}").into());
    }
    Ok(scores.into_iter().flatten().collect())
}
