//! Shared math utilities for detection infrastructure.

/// IoU between two boxes given as `[ymin, xmin, ymax, xmax]`.
pub fn bbox_iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let y1 = a[0].max(b[0]);
    let x1 = a[1].max(b[1]);
    let y2 = a[2].min(b[2]);
    let x2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
