//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, desqueeze, and thumbnail.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Raw development is not a backend concern: the backend only ever
//! sees the 16-bit raster produced by the external developer and the JPEGs it
//! writes itself.

use super::params::{DesqueezeParams, ThumbnailParams};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Degenerate dimensions {width}x{height} for {path}")]
    DegenerateDimensions {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Both edges are non-zero.
    pub fn has_area(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// Every backend must implement all three operations so the pipeline is
/// backend-agnostic and can be exercised with a mock.
pub trait ImageBackend {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resize to the stretched dimensions in linear light and write a JPEG.
    fn desqueeze(&self, params: &DesqueezeParams) -> Result<(), BackendError>;

    /// Downscale, optionally letterbox onto a black canvas, and write a JPEG.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
