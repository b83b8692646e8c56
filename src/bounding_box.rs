use image::{imageops, GenericImageView, ImageBuffer, Pixel};
use log::debug;

use crate::draw;
use crate::error::{Error, Result};
use crate::math_util;

/// Colors, stroke and opacities used by [`BoundingBox::preview`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle<P: Pixel<Subpixel = u8>> {
    pub line_color: P,
    pub fill_color: P,
    pub line_width: u32,
    pub line_alpha: f32,
    pub fill_alpha: f32,
}

/// Axis-aligned geometry of a polygon placed on a reference image.
///
/// Every property is computed from the points on demand.
pub struct BoundingBox<'a, I: GenericImageView> {
    points: &'a [(f32, f32)],
    image: &'a I,
}

impl<'a, I: GenericImageView> BoundingBox<'a, I> {
    pub fn new(points: &'a [(f32, f32)], image: &'a I) -> Result<BoundingBox<'a, I>> {
        if points.is_empty() {
            return Err(Error::EmptyPolygon);
        }
        Ok(BoundingBox { points, image })
    }

    pub fn points(&self) -> &[(f32, f32)] {
        self.points
    }

    pub fn xs(&self) -> Vec<f32> {
        self.points.iter().map(|p| p.0).collect()
    }

    pub fn ys(&self) -> Vec<f32> {
        self.points.iter().map(|p| p.1).collect()
    }

    pub fn width(&self) -> f32 {
        let (lo, hi) = math_util::min_max(self.points.iter().map(|p| p.0));
        hi - lo
    }

    pub fn height(&self) -> f32 {
        let (lo, hi) = math_util::min_max(self.points.iter().map(|p| p.1));
        hi - lo
    }

    /// Area of the bounding rectangle, not of the polygon itself.
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Area enclosed by the polygon.
    pub fn polygon_area(&self) -> f32 {
        math_util::shoelace_area(self.points)
    }

    /// Mean of the vertices.
    pub fn centroid(&self) -> (f32, f32) {
        (
            math_util::mean(self.points.iter().map(|p| p.0)),
            math_util::mean(self.points.iter().map(|p| p.1)),
        )
    }

    /// height / width
    pub fn aspect_ratio(&self) -> Result<f32> {
        let w = self.width();
        if w == 0.0 {
            return Err(Error::DegenerateBox);
        }
        Ok(self.height() / w)
    }

    /// Distance from the centroid to the closest border of the reference image.
    pub fn edge_distance(&self) -> f32 {
        let (x, y) = self.centroid();
        let (w, h) = self.image.dimensions();
        let (w, h) = (w as f32, h as f32);
        x.min(w - x).min(y).min(h - y)
    }

    /// (top, bottom, left, right)
    pub fn extent(&self) -> (f32, f32, f32, f32) {
        let (left, right) = math_util::min_max(self.points.iter().map(|p| p.0));
        let (top, bottom) = math_util::min_max(self.points.iter().map(|p| p.1));
        (top, bottom, left, right)
    }

    /// Copy the extent window out of `img`, together with its (x, y) origin.
    ///
    /// Like slicing `[top..bottom, left..right]`: the bottom row and right
    /// column are left out, and the window is clamped to `img`.
    pub fn crop<J>(
        &self,
        img: &J,
    ) -> (
        ImageBuffer<J::Pixel, Vec<<J::Pixel as Pixel>::Subpixel>>,
        (u32, u32),
    )
    where
        J: GenericImageView + 'static,
    {
        let (top, bottom, left, right) = self.extent();
        let (w, h) = img.dimensions();
        let x0 = (left.floor().max(0.0) as u32).min(w);
        let y0 = (top.floor().max(0.0) as u32).min(h);
        let x1 = (right.floor().max(0.0) as u32).min(w);
        let y1 = (bottom.floor().max(0.0) as u32).min(h);
        let cropped = imageops::crop_imm(img, x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0));
        (cropped.to_image(), (x0, y0))
    }

    /// Copy of `base` with the polygon filled and outlined on top.
    ///
    /// The fill is blended first; the outline is then blended over the
    /// filled result.
    pub fn preview<P>(
        &self,
        base: &ImageBuffer<P, Vec<u8>>,
        style: &OverlayStyle<P>,
    ) -> Result<ImageBuffer<P, Vec<u8>>>
    where
        P: Pixel<Subpixel = u8>,
    {
        for alpha in [style.fill_alpha, style.line_alpha] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(Error::InvalidAlpha(alpha));
            }
        }
        let (w, h) = base.dimensions();
        let mut out = base.clone();

        let fill = draw::fill_mask(w, h, self.points);
        draw::blend_masked(&mut out, &fill, style.fill_color, style.fill_alpha);

        let line = draw::outline_mask(w, h, self.points, style.line_width);
        draw::blend_masked(&mut out, &line, style.line_color, style.line_alpha);

        debug!(
            "box preview {}x{}, {} points, extent {:?}",
            w,
            h,
            self.points.len(),
            self.extent()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn test_empty_polygon() {
        let img = GrayImage::new(4, 4);
        assert!(matches!(BoundingBox::new(&[], &img), Err(Error::EmptyPolygon)));
    }

    #[test]
    fn test_projections() {
        let img = GrayImage::new(4, 4);
        let pts = [(1.0, 2.0), (3.0, 0.5)];
        let bb = BoundingBox::new(&pts, &img).unwrap();
        assert_eq!(bb.xs(), vec![1.0, 3.0]);
        assert_eq!(bb.ys(), vec![2.0, 0.5]);
    }

    #[test]
    fn test_area_is_rectangle_area() {
        let img = GrayImage::new(20, 20);
        let triangle = [(0.0, 0.0), (8.0, 0.0), (0.0, 6.0)];
        let bb = BoundingBox::new(&triangle, &img).unwrap();
        assert!((bb.area() - 48.0).abs() < 1e-6);
        assert!((bb.polygon_area() - 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_edge_distance_near_border() {
        let img = GrayImage::new(100, 50);
        let pts = [(90.0, 20.0), (96.0, 20.0), (96.0, 30.0), (90.0, 30.0)];
        let bb = BoundingBox::new(&pts, &img).unwrap();
        assert!((bb.edge_distance() - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_crop() {
        let img = GrayImage::from_fn(10, 10, |x, y| Luma([(y * 10 + x) as u8]));
        let pts = [(2.0, 3.0), (5.0, 3.0), (5.0, 7.0), (2.0, 7.0)];
        let bb = BoundingBox::new(&pts, &img).unwrap();
        let (crop, origin) = bb.crop(&img);
        assert_eq!(origin, (2, 3));
        assert_eq!(crop.dimensions(), (3, 4));
        assert_eq!(crop.get_pixel(0, 0)[0], 32);
        assert_eq!(crop.get_pixel(2, 3)[0], 64);
    }

    #[test]
    fn test_crop_clamped() {
        let img = GrayImage::new(10, 10);
        let pts = [(-3.0, -2.0), (12.0, 4.0)];
        let bb = BoundingBox::new(&pts, &img).unwrap();
        let (crop, origin) = bb.crop(&img);
        assert_eq!(origin, (0, 0));
        assert_eq!(crop.dimensions(), (10, 4));
    }

    #[test]
    fn test_invalid_alpha() {
        let img = RgbImage::new(8, 8);
        let pts = [(1.0, 1.0), (5.0, 1.0), (5.0, 5.0)];
        let bb = BoundingBox::new(&pts, &img).unwrap();
        let style = OverlayStyle {
            line_color: Rgb([255, 0, 0]),
            fill_color: Rgb([0, 255, 0]),
            line_width: 1,
            line_alpha: 1.5,
            fill_alpha: 0.5,
        };
        assert!(matches!(bb.preview(&img, &style), Err(Error::InvalidAlpha(_))));
    }
}
