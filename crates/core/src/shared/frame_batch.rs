use crate::shared::frame::Frame;

/// Frames sampled from one video, in ascending source-index order.
///
/// Never empty: a sampling pass that reads nothing produces no batch at all.
#[derive(Clone, Debug)]
pub struct FrameBatch {
    frames: Vec<Frame>,
}

impl FrameBatch {
    /// Wraps `frames`, returning `None` when the list is empty.
    pub fn new(frames: Vec<Frame>) -> Option<Self> {
        if frames.is_empty() {
            return None;
        }
        debug_assert!(
            frames.windows(2).all(|w| w[0].index() < w[1].index()),
            "frame indices must be strictly increasing"
        );
        debug_assert!(
            frames
                .iter()
                .all(|f| f.width() == frames[0].width() && f.height() == frames[0].height()),
            "all frames in a batch must share dimensions"
        );
        Some(Self { frames })
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Original frame indices, parallel to [`frames`](Self::frames).
    pub fn indices(&self) -> Vec<usize> {
        self.frames.iter().map(Frame::index).collect()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.frames[0].width()
    }

    pub fn height(&self) -> u32 {
        self.frames[0].height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0u8; 4 * 2 * 3], 4, 2, 3, index)
    }

    #[test]
    fn test_empty_frames_yield_no_batch() {
        assert!(FrameBatch::new(Vec::new()).is_none());
    }

    #[test]
    fn test_indices_parallel_to_frames() {
        let batch = FrameBatch::new(vec![frame(0), frame(3), frame(9)]).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.indices(), vec![0, 3, 9]);
        assert_eq!(batch.width(), 4);
        assert_eq!(batch.height(), 2);
    }

    #[test]
    #[should_panic(expected = "frame indices must be strictly increasing")]
    fn test_unordered_indices_panic_in_debug() {
        FrameBatch::new(vec![frame(5), frame(2)]);
    }
}
