use ndarray::{s, Array3, ArrayView3};

/// A decoded video frame: contiguous RGB bytes in row-major order.
///
/// Tagged with its index in the source video. Face crops reuse the same
/// type, carrying the index of the frame they were cut from.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Builds a frame from an `(height, width, channels)` array.
    pub fn from_array(array: Array3<u8>, index: usize) -> Self {
        let (height, width, channels) = array.dim();
        let data = if array.is_standard_layout() {
            array.into_raw_vec_and_offset().0
        } else {
            array.iter().copied().collect()
        };
        Self::new(data, width as u32, height as u32, channels as u8, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Copies the rectangle `[y0, y1) × [x0, x1)` into a new frame.
    ///
    /// Bounds are clamped to the frame, so an out-of-range rectangle
    /// produces an empty (zero-area) frame rather than panicking.
    pub fn crop(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> Frame {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        let x0 = x0.min(x1);
        let y0 = y0.min(y1);
        let view = self.as_ndarray();
        let region = view.slice(s![y0 as usize..y1 as usize, x0 as usize..x1 as usize, ..]);
        Frame::from_array(region.to_owned(), self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for row in 0..height {
            for col in 0..width {
                data.extend_from_slice(&[row as u8, col as u8, 7]);
            }
        }
        Frame::new(data, width, height, 3, 4)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.area(), 4);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let data = vec![0u8; 24]; // 2x4x3
        let frame = Frame::new(data, 4, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr.shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_as_ndarray_pixel_access() {
        // 2x2 RGB: set pixel (row=1, col=0) to red
        let mut data = vec![0u8; 12];
        data[6] = 255;
        let frame = Frame::new(data, 2, 2, 3, 0);
        let arr = frame.as_ndarray();
        assert_eq!(arr[[1, 0, 0]], 255);
        assert_eq!(arr[[1, 0, 1]], 0);
        assert_eq!(arr[[1, 0, 2]], 0);
    }

    #[test]
    fn test_crop_copies_region_and_keeps_index() {
        let frame = gradient_frame(6, 4);
        let crop = frame.crop(2, 1, 5, 3);
        assert_eq!(crop.width(), 3);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.index(), 4);
        let arr = crop.as_ndarray();
        assert_eq!(arr[[0, 0, 0]], 1); // row 1
        assert_eq!(arr[[0, 0, 1]], 2); // col 2
        assert_eq!(arr[[1, 2, 0]], 2);
        assert_eq!(arr[[1, 2, 1]], 4);
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let frame = gradient_frame(6, 4);
        let crop = frame.crop(4, 2, 100, 100);
        assert_eq!(crop.width(), 2);
        assert_eq!(crop.height(), 2);
    }

    #[test]
    fn test_crop_outside_frame_is_empty() {
        let frame = gradient_frame(6, 4);
        let crop = frame.crop(10, 10, 20, 20);
        assert_eq!(crop.area(), 0);
        assert!(crop.data().is_empty());
    }

    #[test]
    fn test_from_array_roundtrips_layout() {
        let frame = gradient_frame(3, 2);
        let rebuilt = Frame::from_array(frame.as_ndarray().to_owned(), 4);
        assert_eq!(rebuilt, frame);
    }
}
