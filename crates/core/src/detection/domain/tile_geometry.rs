/// Maps detector tile coordinates back to the tile's square crop.
///
/// Tiles are plain resizes of square crops, so offsets are always zero; they
/// stay in the type because letterboxing detectors would need them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeInfo {
    pub scale_w: f32,
    pub scale_h: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// How one video's frames are cut into detector-sized tiles.
///
/// A frame is covered by a single row of `split × split` squares, where
/// `split` is the shorter side. Landscape frames get three columns (left,
/// centre, right); everything else gets one square anchored at the top-left.
/// Computed once per video and shared by tiling and untiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGeometry {
    frame_width: u32,
    frame_height: u32,
    target_width: u32,
    target_height: u32,
    split: u32,
    x_step: u32,
    y_step: u32,
    rows: u32,
    cols: u32,
}

impl TileGeometry {
    /// `target` is the detector input as `(width, height)`.
    pub fn new(frame_width: u32, frame_height: u32, target: (u32, u32)) -> Self {
        let split = frame_width.min(frame_height);
        Self {
            frame_width,
            frame_height,
            target_width: target.0,
            target_height: target.1,
            split,
            x_step: (frame_width - split) / 2,
            y_step: (frame_height - split) / 2,
            rows: 1,
            cols: if frame_width > frame_height { 3 } else { 1 },
        }
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    pub fn split(&self) -> u32 {
        self.split
    }

    pub fn tiles_per_frame(&self) -> usize {
        (self.rows * self.cols) as usize
    }

    /// Top-left `(x, y)` of every crop in a frame, row-major.
    pub fn origins(&self) -> Vec<(u32, u32)> {
        (0..self.rows)
            .flat_map(|row| {
                (0..self.cols).map(move |col| (col * self.x_step, row * self.y_step))
            })
            .collect()
    }

    pub fn resize_info(&self) -> ResizeInfo {
        ResizeInfo {
            scale_w: self.split as f32 / self.target_width as f32,
            scale_h: self.split as f32 / self.target_height as f32,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}
