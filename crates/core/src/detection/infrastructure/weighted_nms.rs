use crate::detection::infrastructure::math::bbox_iou;
use crate::shared::detection::{Detection, NUM_KEYPOINTS};

/// Weighted non-maximum suppression.
///
/// Instead of keeping only the best box of an overlapping cluster, the
/// cluster's box and landmarks are blended by score and the score becomes the
/// cluster mean. Output is ordered by the cluster's best score, descending.
pub fn weighted_nms(mut detections: Vec<Detection>, iou_thresh: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut output = Vec::new();
    let mut remaining = detections;
    while let Some(best) = remaining.first().copied() {
        let (cluster, rest): (Vec<Detection>, Vec<Detection>) = remaining
            .into_iter()
            .partition(|d| bbox_iou(&best.bbox, &d.bbox) > iou_thresh);
        remaining = rest;

        // A degenerate box has IoU 0 with itself; emit it unchanged.
        if cluster.is_empty() {
            output.push(best);
            remaining.remove(0);
            continue;
        }
        output.push(blend(&best, &cluster));
    }
    output
}

fn blend(best: &Detection, cluster: &[Detection]) -> Detection {
    if cluster.len() == 1 {
        return *best;
    }

    let total: f32 = cluster.iter().map(|d| d.score).sum();
    let mut bbox = [0.0f32; 4];
    let mut keypoints = [[0.0f32; 2]; NUM_KEYPOINTS];
    for d in cluster {
        let w = d.score / total;
        for (acc, v) in bbox.iter_mut().zip(d.bbox) {
            *acc += w * v;
        }
        for (acc, kp) in keypoints.iter_mut().zip(d.keypoints) {
            acc[0] += w * kp[0];
            acc[1] += w * kp[1];
        }
    }
    Detection::new(bbox, keypoints, total / cluster.len() as f32)
}
