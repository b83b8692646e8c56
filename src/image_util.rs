use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::box_filter;
use imageproc::morphology::{grayscale_dilate, grayscale_erode, Mask};
use log::trace;

use crate::error::{Error, Result};

pub type GrayImagef32 = image::ImageBuffer<image::Luma<f32>, Vec<f32>>;

/// Stretch the intensity range of `img` linearly onto 0..=255.
///
/// A constant image has no range to stretch and maps to all zeros.
pub fn normalize_min_max(img: &GrayImagef32) -> GrayImage {
    let (min_v, max_v) = img
        .pixels()
        .map(|p| p.0[0])
        .filter(|v| v.is_finite())
        .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    // f64 so that ranges near f32::MAX do not overflow
    let (min_v, max_v) = (min_v as f64, max_v as f64);
    let range = max_v - min_v;
    let scale = if range > f32::EPSILON as f64 {
        255.0 / range
    } else {
        0.0
    };
    trace!("normalize min {} max {} scale {}", min_v, max_v, scale);
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img.get_pixel(x, y).0[0];
        if !v.is_finite() {
            return Luma([0]);
        }
        Luma([((v as f64 - min_v) * scale).round().clamp(0.0, 255.0) as u8])
    })
}

/// Square structuring element of side `kernel_size`, anchored at its center.
pub fn square_mask(kernel_size: u32) -> Result<Mask> {
    if kernel_size == 0 || kernel_size > 255 {
        return Err(Error::InvalidKernelSize(kernel_size));
    }
    let anchor = (kernel_size / 2) as u8;
    let footprint = GrayImage::from_pixel(kernel_size, kernel_size, Luma([255u8]));
    Ok(Mask::from_image(&footprint, anchor, anchor))
}

/// Grayscale opening: `iterations` erosions followed by `iterations` dilations.
pub fn morphological_open(img: &GrayImage, kernel_size: u32, iterations: u32) -> Result<GrayImage> {
    let mask = square_mask(kernel_size)?;
    let mut out = img.clone();
    for _ in 0..iterations {
        out = grayscale_erode(&out, &mask);
    }
    for _ in 0..iterations {
        out = grayscale_dilate(&out, &mask);
    }
    Ok(out)
}

/// Binarize against the mean of each `block_size` neighbourhood.
///
/// Pixels strictly brighter than their local mean become `max_value`, the rest
/// become zero. Borders replicate the edge pixels.
pub fn adaptive_threshold_mean(img: &GrayImage, block_size: u32, max_value: u8) -> Result<GrayImage> {
    if block_size <= 1 || block_size % 2 == 0 {
        return Err(Error::InvalidBlockSize(block_size));
    }
    let radius = block_size / 2;
    let mean = box_filter(img, radius, radius);
    Ok(GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y).0[0] > mean.get_pixel(x, y).0[0] {
            Luma([max_value])
        } else {
            Luma([0])
        }
    }))
}

pub fn max_value(img: &GrayImage) -> u8 {
    img.pixels().map(|p| p.0[0]).max().unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    #[default]
    Gray,
    Hot,
    Jet,
}

impl Colormap {
    pub fn map(&self, v: u8) -> Rgb<u8> {
        let t = v as f32 / 255.0;
        let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        match self {
            Colormap::Gray => Rgb([v, v, v]),
            Colormap::Hot => Rgb([to_u8(3.0 * t), to_u8(3.0 * t - 1.0), to_u8(3.0 * t - 2.0)]),
            Colormap::Jet => Rgb([
                to_u8(1.5 - (4.0 * t - 3.0).abs()),
                to_u8(1.5 - (4.0 * t - 2.0).abs()),
                to_u8(1.5 - (4.0 * t - 1.0).abs()),
            ]),
        }
    }
}

pub fn apply_colormap(img: &GrayImage, colormap: Colormap) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        colormap.map(img.get_pixel(x, y).0[0])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_min_max() {
        let img = GrayImagef32::from_fn(3, 1, |x, _| Luma([x as f32 * 0.5 + 1.0]));
        let out = normalize_min_max(&img);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 128);
        assert_eq!(out.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_normalize_extreme_range() {
        let img = GrayImagef32::from_fn(3, 1, |x, _| Luma([[-3.0e38, 1.0e38, 3.0e38][x as usize]]));
        let out = normalize_min_max(&img);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 170);
        assert_eq!(out.get_pixel(2, 0)[0], 255);
    }

    #[test]
    fn test_normalize_constant() {
        let img = GrayImagef32::from_pixel(4, 4, Luma([7.0]));
        let out = normalize_min_max(&img);
        assert!(out.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_open_removes_speck() {
        let mut img = GrayImage::new(15, 15);
        // 1 px speck, should vanish
        img.put_pixel(2, 2, Luma([255]));
        // 5x5 block, should survive a 3x3 opening
        for y in 7..12 {
            for x in 7..12 {
                img.put_pixel(x, y, Luma([200]));
            }
        }
        let out = morphological_open(&img, 3, 1).unwrap();
        assert_eq!(out.get_pixel(2, 2)[0], 0);
        for y in 7..12 {
            for x in 7..12 {
                assert_eq!(out.get_pixel(x, y)[0], 200);
            }
        }
        assert_eq!(out.get_pixel(6, 9)[0], 0);
    }

    #[test]
    fn test_open_zero_iterations() {
        let img = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 10 + y) as u8]));
        let out = morphological_open(&img, 3, 0).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_invalid_kernel() {
        let img = GrayImage::new(5, 5);
        assert_eq!(
            morphological_open(&img, 0, 1).unwrap_err(),
            Error::InvalidKernelSize(0)
        );
        assert!(square_mask(256).is_err());
    }

    #[test]
    fn test_adaptive_threshold() {
        let mut img = GrayImage::from_pixel(9, 9, Luma([50]));
        img.put_pixel(4, 4, Luma([100]));
        let out = adaptive_threshold_mean(&img, 3, 180).unwrap();
        assert_eq!(out.get_pixel(4, 4)[0], 180);
        // flat region is not above its own mean
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_adaptive_threshold_block_size() {
        let img = GrayImage::new(5, 5);
        for bad in [0, 1, 2, 4] {
            assert_eq!(
                adaptive_threshold_mean(&img, bad, 255).unwrap_err(),
                Error::InvalidBlockSize(bad)
            );
        }
    }

    #[test]
    fn test_colormap_ends() {
        assert_eq!(Colormap::Gray.map(40), Rgb([40, 40, 40]));
        assert_eq!(Colormap::Hot.map(0), Rgb([0, 0, 0]));
        assert_eq!(Colormap::Hot.map(255), Rgb([255, 255, 255]));
        assert_eq!(Colormap::Jet.map(0), Rgb([0, 0, 128]));
    }
}
