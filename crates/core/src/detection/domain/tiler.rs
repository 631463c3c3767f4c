use ndarray::{s, Array3, Array4, ArrayView3};

use crate::detection::domain::tile_geometry::TileGeometry;
use crate::shared::detection::Detection;
use crate::shared::frame_batch::FrameBatch;

/// Area-averaging resize of an `(h, w, c)` image.
///
/// Every output pixel is the mean of the source region it covers, with
/// partially covered source pixels weighted by their overlap.
pub fn resize_area(src: ArrayView3<'_, u8>, out_width: usize, out_height: usize) -> Array3<u8> {
    let (src_h, src_w, channels) = src.dim();
    let mut out = Array3::<u8>::zeros((out_height, out_width, channels));
    if src_h == 0 || src_w == 0 {
        return out;
    }

    let row_weights = span_weights(src_h, out_height);
    let col_weights = span_weights(src_w, out_width);

    let mut acc = vec![0.0f32; channels];
    for (oy, rows) in row_weights.iter().enumerate() {
        for (ox, cols) in col_weights.iter().enumerate() {
            acc.iter_mut().for_each(|a| *a = 0.0);
            for &(sy, wy) in rows {
                for &(sx, wx) in cols {
                    let w = wy * wx;
                    for (c, a) in acc.iter_mut().enumerate() {
                        *a += w * src[[sy, sx, c]] as f32;
                    }
                }
            }
            for (c, a) in acc.iter().enumerate() {
                out[[oy, ox, c]] = a.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}

/// For each output cell along one axis, the source cells it covers and their
/// normalized weights.
fn span_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            let start = i as f64 * scale;
            let end = (i + 1) as f64 * scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            (first..last)
                .filter_map(|j| {
                    let overlap = end.min(j as f64 + 1.0) - start.max(j as f64);
                    (overlap > 1e-9).then(|| (j, (overlap / scale) as f32))
                })
                .collect()
        })
        .collect()
}

/// Cuts every frame of the batch into square crops resized to the detector
/// input, giving an `(N × tiles_per_frame, target_h, target_w, 3)` batch.
///
/// Tiles are ordered frame-major, then by grid position.
pub fn tile_frames(batch: &FrameBatch, geometry: &TileGeometry) -> Array4<u8> {
    let (target_w, target_h) = geometry.target_size();
    let (target_w, target_h) = (target_w as usize, target_h as usize);
    let split = geometry.split() as usize;
    let origins = geometry.origins();

    let mut tiles = Array4::<u8>::zeros((
        batch.len() * origins.len(),
        target_h,
        target_w,
        3,
    ));

    let mut i = 0;
    for frame in batch.frames() {
        let pixels = frame.as_ndarray();
        for &(x, y) in &origins {
            let (x, y) = (x as usize, y as usize);
            let crop = pixels.slice(s![y..y + split, x..x + split, ..]);
            let resized = resize_area(crop, target_w, target_h);
            tiles.slice_mut(s![i, .., .., ..]).assign(&resized);
            i += 1;
        }
    }
    tiles
}

/// Projects per-tile detections back to frame pixels and regroups them per
/// frame, in tile order.
///
/// `raw` must hold exactly one list per tile produced by [`tile_frames`] for
/// `num_frames` frames; anything else is a broken detector and panics.
pub fn untile_detections(
    geometry: &TileGeometry,
    num_frames: usize,
    raw: &[Vec<Detection>],
) -> Vec<Vec<Detection>> {
    let per_frame = geometry.tiles_per_frame();
    assert_eq!(
        raw.len(),
        num_frames * per_frame,
        "detector returned {} tile results for {} frames of {} tiles",
        raw.len(),
        num_frames,
        per_frame
    );

    let (target_w, target_h) = geometry.target_size();
    let (target_w, target_h) = (target_w as f32, target_h as f32);
    let info = geometry.resize_info();
    let origins = geometry.origins();

    raw.chunks(per_frame)
        .map(|frame_tiles| {
            frame_tiles
                .iter()
                .zip(&origins)
                .flat_map(|(detections, &(ox, oy))| {
                    detections.iter().map(move |d| {
                        d.map_axes(
                            |x| (x * target_w - info.offset_x) * info.scale_w,
                            |y| (y * target_h - info.offset_y) * info.scale_h,
                        )
                        .translated(ox as f32, oy as f32)
                    })
                })
                .collect()
        })
        .collect()
}
