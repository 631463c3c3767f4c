use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Sequential, grab/retrieve style access to a video's frames.
///
/// `grab` advances one frame without converting its pixels; `retrieve`
/// converts the last grabbed frame to RGB. Separating the two lets the
/// sampler walk a video once and pay for pixel conversion only on the
/// frames it keeps.
pub trait VideoReader: Send {
    /// Opens a video file and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Advances to the next frame. Returns `false` at end of stream.
    fn grab(&mut self) -> Result<bool, Box<dyn std::error::Error>>;

    /// Converts the most recently grabbed frame to an RGB [`Frame`].
    fn retrieve(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Seeks straight to `index` and decodes that single frame.
    fn read_at(&mut self, index: usize) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Releases any resources held by the reader.
    fn close(&mut self);
}
