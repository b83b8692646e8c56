use std::cmp::Ordering;

use image::{GenericImageView, GrayImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use kiddo::{KdTree, SquaredEuclidean};
use log::{debug, trace};

use crate::image_util::GrayImagef32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    pub p: (f32, f32),
    pub response: f32,
}

impl Corner {
    pub fn arr(&self) -> [f32; 2] {
        [self.p.0, self.p.1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerParams {
    /// 0 keeps every corner
    pub max_corners: usize,
    /// fraction of the strongest response a corner must exceed
    pub quality_level: f32,
    pub min_distance: f32,
    pub block_size: u32,
}

impl CornerParams {
    /// Single strongest corner, 10% quality floor, no distance suppression.
    pub fn default_params() -> CornerParams {
        CornerParams {
            max_corners: 1,
            quality_level: 0.1,
            min_distance: 0.0,
            block_size: 3,
        }
    }
}

/// Shi-Tomasi score: the smaller eigenvalue of the gradient structure tensor
/// summed over a `block_size` window.
pub fn min_eigen_response(img: &GrayImage, block_size: u32) -> GrayImagef32 {
    let (w, h) = img.dimensions();
    let gx = horizontal_sobel(img);
    let gy = vertical_sobel(img);
    let block_size = block_size.max(1);
    let scale = 1.0 / (4.0 * 255.0 * block_size as f64);

    let mut dxx = vec![0.0f64; (w * h) as usize];
    let mut dxy = vec![0.0f64; (w * h) as usize];
    let mut dyy = vec![0.0f64; (w * h) as usize];
    for (x, y, p) in gx.enumerate_pixels() {
        let dx = p.0[0] as f64 * scale;
        let dy = gy.get_pixel(x, y).0[0] as f64 * scale;
        let i = (y * w + x) as usize;
        dxx[i] = dx * dx;
        dxy[i] = dx * dy;
        dyy[i] = dy * dy;
    }

    let r = (block_size / 2) as i64;
    let clamp = |v: i64, hi: u32| v.clamp(0, hi as i64 - 1) as u32;
    let mut out = GrayImagef32::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let (mut a, mut b, mut c) = (0.0, 0.0, 0.0);
            for oy in -r..(block_size as i64 - r) {
                for ox in -r..(block_size as i64 - r) {
                    let sx = clamp(x as i64 + ox, w);
                    let sy = clamp(y as i64 + oy, h);
                    let i = (sy * w + sx) as usize;
                    a += dxx[i];
                    b += dxy[i];
                    c += dyy[i];
                }
            }
            let half_trace = (a + c) / 2.0;
            let d = ((a - c) / 2.0).powi(2) + b * b;
            out.put_pixel(x, y, [(half_trace - d.sqrt()) as f32].into());
        }
    }
    out
}

fn is_local_max(resp: &GrayImagef32, x: u32, y: u32) -> bool {
    let v = resp.get_pixel(x, y).0[0];
    for ny in y - 1..=y + 1 {
        for nx in x - 1..=x + 1 {
            if unsafe { resp.unsafe_get_pixel(nx, ny).0[0] } > v {
                return false;
            }
        }
    }
    true
}

/// Strongest corners of `img`, best first.
pub fn good_features_to_track(img: &GrayImage, params: &CornerParams) -> Vec<Corner> {
    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return Vec::new();
    }
    let resp = min_eigen_response(img, params.block_size);
    let max_resp = resp.pixels().map(|p| p.0[0]).fold(f32::MIN, f32::max);
    if max_resp <= 0.0 {
        debug!("corner response is flat, max {}", max_resp);
        return Vec::new();
    }
    let threshold = max_resp * params.quality_level;

    let mut candidates = Vec::new();
    for y in 1..(h - 1) {
        for x in 1..(w - 1) {
            let v = resp.get_pixel(x, y).0[0];
            if v > threshold && is_local_max(&resp, x, y) {
                candidates.push(Corner {
                    p: (x as f32, y as f32),
                    response: v,
                });
            }
        }
    }
    candidates.sort_by(|a, b| {
        b.response
            .partial_cmp(&a.response)
            .unwrap_or(Ordering::Equal)
            .then(a.p.1.total_cmp(&b.p.1))
            .then(a.p.0.total_cmp(&b.p.0))
    });
    trace!(
        "{} corner candidates above {} (max {})",
        candidates.len(),
        threshold,
        max_resp
    );

    let limit = if params.max_corners == 0 {
        usize::MAX
    } else {
        params.max_corners
    };
    if params.min_distance <= 0.0 {
        candidates.truncate(limit);
        return candidates;
    }

    let min_d2 = params.min_distance * params.min_distance;
    let mut tree: KdTree<f32, 2> = KdTree::new();
    let mut accepted: Vec<Corner> = Vec::new();
    for c in candidates {
        if accepted.len() >= limit {
            break;
        }
        if !accepted.is_empty() && tree.nearest_one::<SquaredEuclidean>(&c.arr()).distance < min_d2 {
            continue;
        }
        tree.add(&c.arr(), accepted.len() as u64);
        accepted.push(c);
    }
    accepted
}
