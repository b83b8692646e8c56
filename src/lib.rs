pub mod bounding_box;
pub mod corner;
pub mod draw;
pub mod error;
pub mod fiducial;
pub mod image_util;
pub mod math_util;

pub use bounding_box::{BoundingBox, OverlayStyle};
pub use error::{Error, Result};
pub use fiducial::{FiducialLocator, FilterParams};
pub use image_util::{Colormap, GrayImagef32};
