use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("no filtered image, call filter first")]
    NotFiltered,
    #[error("no corner passed the quality threshold")]
    NoCornerFound,
    #[error("kernel size must be within 1..=255, got {0}")]
    InvalidKernelSize(u32),
    #[error("threshold block size must be odd and greater than 1, got {0}")]
    InvalidBlockSize(u32),
    #[error("bounding box has zero width, aspect ratio is undefined")]
    DegenerateBox,
    #[error("bounding box needs at least one point")]
    EmptyPolygon,
    #[error("alpha must be within 0.0..=1.0, got {0}")]
    InvalidAlpha(f32),
}

pub type Result<T> = std::result::Result<T, Error>;
