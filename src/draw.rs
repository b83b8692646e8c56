use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::math_util;

const MASK_ON: Luma<u8> = Luma([255]);

fn to_pixel_points(points: &[(f32, f32)]) -> Vec<Point<i32>> {
    let mut out: Vec<Point<i32>> = Vec::with_capacity(points.len());
    for (x, y) in points {
        let p = Point::new(x.round() as i32, y.round() as i32);
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    // closing point is implied
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Interior and boundary of the polygon rasterized into a `w` x `h` mask.
pub fn fill_mask(w: u32, h: u32, points: &[(f32, f32)]) -> GrayImage {
    let mut mask = GrayImage::new(w, h);
    let poly = to_pixel_points(points);
    match poly.len() {
        0 => {}
        1 => {
            let p = poly[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
                mask.put_pixel(p.x as u32, p.y as u32, MASK_ON);
            }
        }
        2 => {
            let a = poly[0];
            let b = poly[poly.len() - 1];
            draw_line_segment_mut(
                &mut mask,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                MASK_ON,
            );
        }
        _ => draw_polygon_mut(&mut mask, &poly, MASK_ON),
    }
    mask
}

/// Closed outline of the polygon with the given stroke width.
///
/// Built from the same rounded vertices as [`fill_mask`], so the stroke always
/// bounds the fill.
pub fn outline_mask(w: u32, h: u32, points: &[(f32, f32)], line_width: u32) -> GrayImage {
    let mut mask = GrayImage::new(w, h);
    if line_width == 0 {
        return mask;
    }
    let verts: Vec<(f32, f32)> = to_pixel_points(points)
        .iter()
        .map(|p| (p.x as f32, p.y as f32))
        .collect();
    let n = verts.len();
    let half = line_width as f32 / 2.0;
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        if line_width == 1 {
            draw_line_segment_mut(&mut mask, a, b, MASK_ON);
            continue;
        }
        // round joins
        draw_filled_circle_mut(
            &mut mask,
            (a.0 as i32, a.1 as i32),
            (line_width / 2) as i32,
            MASK_ON,
        );
        if let Some(nv) = math_util::scaled_normal(&a, &b, half) {
            let quad = [
                (a.0 + nv.0, a.1 + nv.1),
                (b.0 + nv.0, b.1 + nv.1),
                (b.0 - nv.0, b.1 - nv.1),
                (a.0 - nv.0, a.1 - nv.1),
            ];
            let quad = to_pixel_points(&quad);
            if quad.len() >= 3 {
                draw_polygon_mut(&mut mask, &quad, MASK_ON);
            }
        }
    }
    mask
}

/// Blend `color` over every pixel of `img` that is set in `mask`.
pub fn blend_masked<P>(img: &mut ImageBuffer<P, Vec<u8>>, mask: &GrayImage, color: P, alpha: f32)
where
    P: Pixel<Subpixel = u8>,
{
    for (x, y, m) in mask.enumerate_pixels() {
        if m.0[0] == 0 || x >= img.width() || y >= img.height() {
            continue;
        }
        let base = img.get_pixel_mut(x, y);
        *base = base.map2(&color, |b, c| {
            (c as f32 * alpha + b as f32 * (1.0 - alpha))
                .round()
                .clamp(0.0, 255.0) as u8
        });
    }
}

/// `+` shaped marker centered on `center`.
pub fn draw_cross(img: &mut RgbImage, center: (f32, f32), arm: f32, color: Rgb<u8>) {
    let (cx, cy) = center;
    for off in [-0.5f32, 0.5] {
        draw_line_segment_mut(img, (cx - arm, cy + off), (cx + arm, cy + off), color);
        draw_line_segment_mut(img, (cx + off, cy - arm), (cx + off, cy + arm), color);
    }
}
