use ndarray::{s, Array4};

use crate::detection::domain::tiler::resize_area;
use crate::shared::face_crop::FaceCrop;

/// Fixed-size classifier input built from face crops.
#[derive(Debug)]
pub struct FaceBatch {
    pub images: Array4<u8>,
    /// Slots holding a face; the rest stay zero.
    pub filled: usize,
}

/// Target `(width, height)` when the longer side is scaled to `size`.
pub fn fit_long_side(width: u32, height: u32, size: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| ((short as u64 * size as u64 / long as u64) as u32).max(1);
    if width >= height {
        (size, scale(height, width))
    } else {
        (scale(width, height), size)
    }
}

/// Packs faces into a zeroed `(batch_size, size, size, 3)` array.
///
/// Each face keeps its aspect ratio with its long side scaled to `size` and
/// sits in the top-left corner of its slot. Faces past `batch_size` are
/// dropped with a warning.
pub fn build_face_batch<'a>(
    faces: impl IntoIterator<Item = &'a FaceCrop>,
    batch_size: usize,
    size: u32,
) -> FaceBatch {
    let s_usize = size as usize;
    let mut images = Array4::<u8>::zeros((batch_size, s_usize, s_usize, 3));
    let mut filled = 0;

    for face in faces {
        let image = &face.image;
        if filled >= batch_size {
            log::warn!(
                "Face batch full ({batch_size} slots); dropping face from frame {}",
                image.index()
            );
            continue;
        }
        if image.width() == 0 || image.height() == 0 {
            continue;
        }

        let (w, h) = fit_long_side(image.width(), image.height(), size);
        let (w, h) = (w as usize, h as usize);
        let resized = resize_area(image.as_ndarray(), w, h);
        images
            .slice_mut(s![filled, ..h, ..w, ..])
            .assign(&resized);
        filled += 1;
    }

    FaceBatch { images, filled }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::solid_frame;
    use rstest::rstest;

    fn face(width: u32, height: u32, value: u8) -> FaceCrop {
        FaceCrop {
            image: solid_frame(width, height, 0, value),
            score: 0.9,
        }
    }

    #[rstest]
    #[case::landscape(300, 150, 150, (150, 75))]
    #[case::portrait(40, 80, 150, (75, 150))]
    #[case::square(10, 10, 150, (150, 150))]
    #[case::sliver(1000, 2, 150, (150, 1))]
    fn test_fit_long_side(
        #[case] width: u32,
        #[case] height: u32,
        #[case] size: u32,
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(fit_long_side(width, height, size), expected);
    }

    #[test]
    fn test_build_face_batch_pads_bottom_right() {
        let faces = [face(40, 80, 200)];
        let batch = build_face_batch(&faces, 2, 150);
        assert_eq!(batch.images.shape(), &[2, 150, 150, 3]);
        assert_eq!(batch.filled, 1);
        assert_eq!(batch.images[[0, 0, 0, 0]], 200);
        assert_eq!(batch.images[[0, 149, 74, 2]], 200);
        assert_eq!(batch.images[[0, 0, 75, 0]], 0);
        assert!(batch.images.slice(s![1, .., .., ..]).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_build_face_batch_drops_overflow() {
        let faces: Vec<FaceCrop> = (0..5).map(|i| face(20, 20, i as u8 + 1)).collect();
        let batch = build_face_batch(&faces, 3, 16);
        assert_eq!(batch.filled, 3);
        assert_eq!(batch.images[[2, 0, 0, 0]], 3);
    }

    #[test]
    fn test_build_face_batch_empty() {
        let batch = build_face_batch(std::iter::empty(), 4, 16);
        assert_eq!(batch.filled, 0);
        assert!(batch.images.iter().all(|&v| v == 0));
    }
}
