use std::path::{Path, PathBuf};

use crate::shared::face_crop::FrameResult;
use crate::shared::frame::Frame;

/// Writes frames and face crops to image files.
pub trait ImageWriter: Send {
    /// Writes a frame to `path`, optionally resized to `(width, height)`.
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Writes every crop as `<out_dir>/<stem>_f<frame>_<n>.png`, where `n`
    /// is the crop's rank within its frame. Returns the written paths.
    fn write_faces(
        &self,
        out_dir: &Path,
        stem: &str,
        results: &[FrameResult],
        size: Option<(u32, u32)>,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let mut written = Vec::new();
        for result in results {
            for (n, face) in result.faces.iter().enumerate() {
                let path = out_dir.join(face_file_name(stem, result.frame_idx, n));
                self.write(&path, &face.image, size)?;
                written.push(path);
            }
        }
        Ok(written)
    }
}

pub fn face_file_name(stem: &str, frame_idx: usize, rank: usize) -> String {
    format!("{stem}_f{frame_idx}_{rank}.png")
}
