/// Number of facial landmarks carried by a detection.
pub const NUM_KEYPOINTS: usize = 6;

/// A candidate face: bounding box, landmarks and confidence.
///
/// The box is stored as `(ymin, xmin, ymax, xmax)` while each landmark is an
/// `(x, y)` pair. Coordinates are normalized `[0, 1]` in tile space and
/// pixels once projected into a frame. Transforms return new values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: [f32; 4],
    pub keypoints: [[f32; 2]; NUM_KEYPOINTS],
    pub score: f32,
}

impl Detection {
    pub fn new(bbox: [f32; 4], keypoints: [[f32; 2]; NUM_KEYPOINTS], score: f32) -> Self {
        Self {
            bbox,
            keypoints,
            score,
        }
    }

    /// A detection with all landmarks at the origin.
    pub fn from_box(ymin: f32, xmin: f32, ymax: f32, xmax: f32, score: f32) -> Self {
        Self::new([ymin, xmin, ymax, xmax], [[0.0; 2]; NUM_KEYPOINTS], score)
    }

    pub fn ymin(&self) -> f32 {
        self.bbox[0]
    }

    pub fn xmin(&self) -> f32 {
        self.bbox[1]
    }

    pub fn ymax(&self) -> f32 {
        self.bbox[2]
    }

    pub fn xmax(&self) -> f32 {
        self.bbox[3]
    }

    pub fn height(&self) -> f32 {
        self.ymax() - self.ymin()
    }

    pub fn width(&self) -> f32 {
        self.xmax() - self.xmin()
    }

    /// Applies `f_x` to every x coordinate and `f_y` to every y coordinate.
    ///
    /// Keeps the (y, x) box layout and (x, y) landmark layout straight so
    /// callers only reason about axes.
    pub fn map_axes(&self, f_x: impl Fn(f32) -> f32, f_y: impl Fn(f32) -> f32) -> Detection {
        let bbox = [
            f_y(self.bbox[0]),
            f_x(self.bbox[1]),
            f_y(self.bbox[2]),
            f_x(self.bbox[3]),
        ];
        let keypoints = self.keypoints.map(|[x, y]| [f_x(x), f_y(y)]);
        Detection::new(bbox, keypoints, self.score)
    }

    /// Shifts the detection by `(dx, dy)` pixels.
    pub fn translated(&self, dx: f32, dy: f32) -> Detection {
        self.map_axes(|x| x + dx, |y| y + dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Detection {
        let mut keypoints = [[0.0; 2]; NUM_KEYPOINTS];
        keypoints[0] = [0.3, 0.4];
        Detection::new([0.1, 0.2, 0.5, 0.6], keypoints, 0.9)
    }

    #[test]
    fn test_accessors_follow_y_x_box_layout() {
        let d = sample();
        assert_relative_eq!(d.ymin(), 0.1);
        assert_relative_eq!(d.xmin(), 0.2);
        assert_relative_eq!(d.ymax(), 0.5);
        assert_relative_eq!(d.xmax(), 0.6);
        assert_relative_eq!(d.height(), 0.4);
        assert_relative_eq!(d.width(), 0.4);
    }

    #[test]
    fn test_map_axes_routes_box_and_keypoint_axes() {
        let d = sample().map_axes(|x| x * 10.0, |y| y * 100.0);
        assert_relative_eq!(d.bbox[0], 10.0);
        assert_relative_eq!(d.bbox[1], 2.0);
        assert_relative_eq!(d.bbox[2], 50.0);
        assert_relative_eq!(d.bbox[3], 6.0);
        assert_relative_eq!(d.keypoints[0][0], 3.0);
        assert_relative_eq!(d.keypoints[0][1], 40.0);
        assert_relative_eq!(d.score, 0.9);
    }

    #[test]
    fn test_translated_leaves_input_untouched() {
        let original = sample();
        let moved = original.translated(5.0, 1.0);
        assert_relative_eq!(moved.xmin(), 5.2);
        assert_relative_eq!(moved.ymin(), 1.1);
        assert_relative_eq!(moved.keypoints[0][0], 5.3);
        assert_relative_eq!(moved.keypoints[0][1], 1.4);
        assert_eq!(original, sample());
    }
}
