use crate::shared::detection::Detection;
use crate::shared::face_crop::FaceCrop;
use crate::shared::frame::Frame;

/// Grows each box by `margin × box height`, twice as much above the face so
/// the crop includes the forehead, clamped to the frame.
pub fn add_margin(
    detections: &[Detection],
    frame_width: u32,
    frame_height: u32,
    margin: f32,
) -> Vec<Detection> {
    let (fw, fh) = (frame_width as f32, frame_height as f32);
    detections
        .iter()
        .map(|d| {
            let offset = (margin * d.height()).round();
            let mut bbox = [
                d.ymin() - 2.0 * offset,
                d.xmin() - offset,
                d.ymax() + offset,
                d.xmax() + offset,
            ];
            bbox[0] = bbox[0].clamp(0.0, fh);
            bbox[1] = bbox[1].clamp(0.0, fw);
            bbox[2] = bbox[2].clamp(0.0, fh);
            bbox[3] = bbox[3].clamp(0.0, fw);
            Detection::new(bbox, d.keypoints, d.score)
        })
        .collect()
}

/// Copies each detection's box out of the full-resolution frame.
///
/// Bounds are truncated to whole pixels; boxes that end up empty are skipped.
pub fn crop_faces(frame: &Frame, detections: &[Detection]) -> Vec<FaceCrop> {
    detections
        .iter()
        .filter_map(|d| {
            let (y0, x0) = (d.ymin().max(0.0) as u32, d.xmin().max(0.0) as u32);
            let (y1, x1) = (d.ymax().max(0.0) as u32, d.xmax().max(0.0) as u32);
            let image = frame.crop(x0, y0, x1, y1);
            if image.width() == 0 || image.height() == 0 {
                log::debug!(
                    "Skipping empty crop ({x0}, {y0})-({x1}, {y1}) in frame {}",
                    frame.index()
                );
                return None;
            }
            Some(FaceCrop {
                image,
                score: d.score,
            })
        })
        .collect()
}
