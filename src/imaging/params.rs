//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what images to create) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 95).
//! - [`DesqueezeParams`]: Source raster, output JPEG, target (stretched) dimensions.
//! - [`ThumbnailParams`]: Source JPEG, output JPEG, scaled dimensions, optional padding canvas.

use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn value(self) -> u8 {
        self.0
    }
}

/// Previews embedded into the DNG are always encoded at 95.
impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Parameters for the desqueeze resize.
#[derive(Debug, Clone, PartialEq)]
pub struct DesqueezeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Stretched output dimensions.
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

/// Black canvas a thumbnail is centered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// Rows of black above the thumbnail.
    pub offset_y: u32,
}

/// Parameters for a thumbnail operation (downscale + optional letterbox).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Scaled thumbnail dimensions, aspect ratio preserved.
    pub width: u32,
    pub height: u32,
    pub canvas: Option<Canvas>,
    pub quality: Quality,
}
