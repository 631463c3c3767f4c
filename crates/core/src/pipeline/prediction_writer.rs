use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::shared::constants::{FAKE_LABEL, REAL_LABEL};

#[derive(Error, Debug)]
pub enum PredictionWriteError {
    #[error("failed to write predictions to {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to flush predictions to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One output row: a video file, its score and the resulting verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRecord {
    pub filename: String,
    pub score: f32,
    pub label: &'static str,
}

impl PredictionRecord {
    /// Labels the video fake when `score` is strictly above `threshold`.
    pub fn new(filename: impl Into<String>, score: f32, threshold: f32) -> Self {
        Self {
            filename: filename.into(),
            score,
            label: if score > threshold {
                FAKE_LABEL
            } else {
                REAL_LABEL
            },
        }
    }
}

/// Writes `filename,score,label` rows with a header line.
pub fn write_predictions(path: &Path, records: &[PredictionRecord]) -> Result<(), PredictionWriteError> {
    let csv_err = |source: csv::Error| PredictionWriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for record in records {
        writer.serialize(record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| PredictionWriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {} prediction(s) to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.61, "FAKE")]
    #[case(0.6, "REAL")]
    #[case(0.5, "REAL")]
    #[case(0.0, "REAL")]
    #[case(1.0, "FAKE")]
    fn test_label_threshold(#[case] score: f32, #[case] label: &str) {
        assert_eq!(PredictionRecord::new("a.mp4", score, 0.6).label, label);
    }

    #[test]
    fn test_write_predictions_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.csv");
        let records = vec![
            PredictionRecord::new("a.mp4", 0.9, 0.6),
            PredictionRecord::new("b.mp4", 0.5, 0.6),
        ];
        write_predictions(&path, &records).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["filename,score,label", "a.mp4,0.9,FAKE", "b.mp4,0.5,REAL"]);
    }

    #[test]
    fn test_write_predictions_empty_list_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_predictions(&path, &[]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_write_predictions_bad_directory() {
        let err = write_predictions(Path::new("/nonexistent/dir/out.csv"), &[]).unwrap_err();
        assert!(matches!(err, PredictionWriteError::Csv { .. }));
    }
}
