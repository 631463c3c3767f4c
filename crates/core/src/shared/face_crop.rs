use crate::shared::frame::Frame;

/// A face cut out of a full-resolution frame, paired with its detection score.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceCrop {
    pub image: Frame,
    pub score: f32,
}

impl FaceCrop {
    pub fn area(&self) -> u64 {
        self.image.area()
    }
}

/// Faces found in one sampled frame of one video.
///
/// `faces` is best-first once produced by the face extractor.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameResult {
    pub video_idx: usize,
    pub frame_idx: usize,
    pub frame_width: u32,
    pub frame_height: u32,
    pub faces: Vec<FaceCrop>,
}

impl FrameResult {
    pub fn frame_area(&self) -> u64 {
        self.frame_width as u64 * self.frame_height as u64
    }

    pub fn scores(&self) -> Vec<f32> {
        self.faces.iter().map(|f| f.score).collect()
    }
}
