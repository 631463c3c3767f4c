use crate::shared::face_crop::FrameResult;

/// Drops crops covering `pct_threshold` or more of their frame.
///
/// Oversized crops are usually false positives on backgrounds. Remaining
/// crops keep their order.
pub fn remove_large_crops(results: &mut [FrameResult], pct_threshold: f64) {
    for result in results.iter_mut() {
        let frame_area = result.frame_area() as f64;
        let before = result.faces.len();
        result
            .faces
            .retain(|face| frame_area > 0.0 && (face.area() as f64) / frame_area < pct_threshold);
        let removed = before - result.faces.len();
        if removed > 0 {
            log::debug!(
                "Frame {} of video {}: removed {} oversized crop(s)",
                result.frame_idx,
                result.video_idx,
                removed
            );
        }
    }
}

/// Keeps only the first crop of every frame.
///
/// Crops arrive best-first from the extractor, so this keeps the most
/// confident face.
pub fn keep_only_best_face(results: &mut [FrameResult]) {
    for result in results.iter_mut() {
        result.faces.truncate(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face_crop::FaceCrop;
    use crate::testing::solid_frame;
    use rstest::rstest;

    fn result(faces: &[(u32, u32, f32)]) -> FrameResult {
        FrameResult {
            video_idx: 0,
            frame_idx: 0,
            frame_width: 100,
            frame_height: 100,
            faces: faces
                .iter()
                .map(|&(w, h, score)| FaceCrop {
                    image: solid_frame(w, h, 0, 0),
                    score,
                })
                .collect(),
        }
    }

    #[test]
    fn test_remove_large_crops_keeps_order_of_survivors() {
        let mut results = vec![result(&[(10, 10, 0.9), (50, 50, 0.8), (20, 20, 0.7)])];
        remove_large_crops(&mut results, 0.1);
        assert_eq!(results[0].scores(), vec![0.9, 0.7]);
    }

    #[rstest]
    #[case::exactly_at_threshold(10, 100, 0.1, 0)]
    #[case::just_below(9, 111, 0.1, 1)]
    #[case::custom_threshold(50, 50, 0.3, 1)]
    fn test_remove_large_crops_threshold(
        #[case] w: u32,
        #[case] h: u32,
        #[case] pct: f64,
        #[case] expected: usize,
    ) {
        let mut results = vec![result(&[(w, h, 0.9)])];
        remove_large_crops(&mut results, pct);
        assert_eq!(results[0].faces.len(), expected);
    }

    #[test]
    fn test_remove_large_crops_never_leaves_oversized() {
        let mut results = vec![
            result(&[(30, 40, 0.5), (5, 5, 0.4)]),
            result(&[(31, 31, 0.9), (32, 32, 0.2), (1, 100, 0.1)]),
        ];
        remove_large_crops(&mut results, 0.1);
        for r in &results {
            for f in &r.faces {
                assert!((f.area() as f64) / (r.frame_area() as f64) < 0.1);
            }
        }
    }

    #[test]
    fn test_keep_only_best_face_truncates() {
        let mut results = vec![
            result(&[(10, 10, 0.9), (10, 10, 0.8)]),
            result(&[]),
            result(&[(10, 10, 0.3)]),
        ];
        keep_only_best_face(&mut results);
        assert_eq!(results[0].scores(), vec![0.9]);
        assert!(results[1].faces.is_empty());
        assert_eq!(results[2].scores(), vec![0.3]);
    }
}
