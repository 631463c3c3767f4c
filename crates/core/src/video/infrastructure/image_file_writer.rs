use std::path::Path;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

#[derive(Error, Debug)]
pub enum ImageWriteError {
    #[error("cannot encode empty {0}x{1} frame")]
    Empty(u32, u32),
    #[error("expected 3-channel RGB frame, got {0} channels")]
    Channels(u8),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Encodes frames with the `image` crate; format follows the file extension.
#[derive(Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }

    fn encode(path: &Path, frame: &Frame, size: Option<(u32, u32)>) -> Result<(), ImageWriteError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(ImageWriteError::Empty(frame.width(), frame.height()));
        }
        if frame.channels() != 3 {
            return Err(ImageWriteError::Channels(frame.channels()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or(ImageWriteError::Empty(frame.width(), frame.height()))?;
        let img = match size {
            Some((w, h)) if (w, h) != (frame.width(), frame.height()) => {
                image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
            }
            _ => img,
        };
        img.save(path)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(Self::encode(path, frame, size)?)
    }
}
