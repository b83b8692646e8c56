use image::{imageops, GrayImage, Rgb, RgbImage};
use log::debug;

use crate::corner::{good_features_to_track, CornerParams};
use crate::draw;
use crate::error::{Error, Result};
use crate::image_util::{self, Colormap, GrayImagef32};

const MARKER_COLOR: Rgb<u8> = Rgb([255, 255, 0]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterParams {
    /// side of the square structuring element
    pub kernel_size: u32,
    pub iterations: u32,
    /// apply adaptive mean thresholding after the opening
    pub threshold: bool,
    /// must be odd and > 1 when `threshold` is set
    pub block_size: u32,
}

impl FilterParams {
    pub fn new(kernel_size: u32, iterations: u32) -> FilterParams {
        FilterParams {
            kernel_size,
            iterations,
            threshold: false,
            block_size: 0,
        }
    }

    pub fn with_threshold(mut self, block_size: u32) -> FilterParams {
        self.threshold = true;
        self.block_size = block_size;
        self
    }
}

/// Finds the dominant corner of an image crop holding a single fiducial.
///
/// The filtered image and the coordinates are cached on the locator and are
/// overwritten by every call to [`FiducialLocator::filter`] and
/// [`FiducialLocator::locate_corner`]. Coordinates are in the crop's own pixel
/// frame; use [`FiducialLocator::global_coordinates`] to map them into the
/// image the crop was taken from.
pub struct FiducialLocator<'a> {
    source: &'a GrayImagef32,
    filtered: Option<GrayImage>,
    coordinates: Option<(f32, f32)>,
}

impl<'a> FiducialLocator<'a> {
    pub fn new(source: &'a GrayImagef32) -> FiducialLocator<'a> {
        FiducialLocator {
            source,
            filtered: None,
            coordinates: None,
        }
    }

    pub fn source(&self) -> &GrayImagef32 {
        self.source
    }

    pub fn filtered(&self) -> Option<&GrayImage> {
        self.filtered.as_ref()
    }

    pub fn coordinates(&self) -> Option<(f32, f32)> {
        self.coordinates
    }

    /// Coordinates shifted by the `(x, y)` origin of the crop.
    pub fn global_coordinates(&self, origin: (f32, f32)) -> Option<(f32, f32)> {
        self.coordinates.map(|(x, y)| (x + origin.0, y + origin.1))
    }

    /// Normalize, open and optionally threshold the source image.
    pub fn filter(&mut self, params: &FilterParams) -> Result<&GrayImage> {
        if params.threshold && (params.block_size <= 1 || params.block_size % 2 == 0) {
            return Err(Error::InvalidBlockSize(params.block_size));
        }
        let normalized = image_util::normalize_min_max(self.source);
        let mut filtered =
            image_util::morphological_open(&normalized, params.kernel_size, params.iterations)?;
        if params.threshold {
            let max_v = image_util::max_value(&filtered);
            filtered = image_util::adaptive_threshold_mean(&filtered, params.block_size, max_v)?;
        }
        debug!(
            "filtered {}x{} fiducial, kernel {} iterations {} threshold {:?}",
            filtered.width(),
            filtered.height(),
            params.kernel_size,
            params.iterations,
            params.threshold.then_some(params.block_size)
        );
        let filtered: &GrayImage = self.filtered.insert(filtered);
        Ok(filtered)
    }

    /// Strongest corner of the filtered image.
    pub fn locate_corner(&mut self) -> Result<(f32, f32)> {
        let filtered = self.filtered.as_ref().ok_or(Error::NotFiltered)?;
        let corners = good_features_to_track(filtered, &CornerParams::default_params());
        let best = corners.first().map(|c| c.p);
        self.coordinates = best;
        match best {
            Some(p) => {
                debug!("fiducial corner at ({}, {})", p.0, p.1);
                Ok(p)
            }
            None => Err(Error::NoCornerFound),
        }
    }

    pub fn compute_coordinates(&mut self, params: &FilterParams) -> Result<(f32, f32)> {
        self.filter(params)?;
        self.locate_corner()
    }

    /// Color-mapped render of the source, or of the filtered image when
    /// `use_filtered` is set and one exists, with the corner marked.
    pub fn preview(
        &self,
        size: Option<(u32, u32)>,
        colormap: Colormap,
        use_filtered: bool,
    ) -> RgbImage {
        let gray = match (&self.filtered, use_filtered) {
            (Some(filtered), true) => filtered.clone(),
            _ => image_util::normalize_min_max(self.source),
        };
        let mut render = image_util::apply_colormap(&gray, colormap);
        let (sx, sy) = match size {
            Some((w, h)) if w > 0 && h > 0 && render.width() > 0 && render.height() > 0 => {
                let scale = (
                    w as f32 / render.width() as f32,
                    h as f32 / render.height() as f32,
                );
                render = imageops::resize(&render, w, h, imageops::FilterType::Nearest);
                scale
            }
            _ => (1.0, 1.0),
        };
        if let Some((x, y)) = self.coordinates {
            let arm = (render.width().min(render.height()) as f32 / 10.0).max(2.0);
            let center = ((x + 0.5) * sx - 0.5, (y + 0.5) * sy - 0.5);
            draw::draw_cross(&mut render, center, arm, MARKER_COLOR);
        }
        render
    }
}
