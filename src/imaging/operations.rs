//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{centering_offset, desqueezed_size, scaled_size};
use super::params::{Canvas, DesqueezeParams, Quality, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions, rejecting zero-area images.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<Dimensions> {
    let dims = backend.identify(path)?;
    if !dims.has_area() {
        return Err(BackendError::DegenerateDimensions {
            path: path.to_path_buf(),
            width: dims.width,
            height: dims.height,
        });
    }
    Ok(dims)
}

/// Plan a desqueeze without executing it.
pub fn plan_desqueeze(
    source: &Path,
    output: &Path,
    original: Dimensions,
    scale_factor: f64,
    quality: Quality,
) -> DesqueezeParams {
    let (width, height) = desqueezed_size(original.as_tuple(), scale_factor);
    DesqueezeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality,
    }
}

/// Create the full-resolution desqueezed preview JPEG.
///
/// Returns the stretched dimensions that were written.
pub fn create_desqueezed_preview(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    scale_factor: f64,
) -> Result<Dimensions> {
    let original = get_dimensions(backend, source)?;
    let params = plan_desqueeze(source, output, original, scale_factor, Quality::default());
    backend.desqueeze(&params)?;
    Ok(Dimensions {
        width: params.width,
        height: params.height,
    })
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailConfig {
    pub width: u32,
    /// Letterbox onto a black canvas of this height when the scaled
    /// thumbnail is shorter.
    pub pad_to_height: Option<u32>,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            pad_to_height: None,
            quality: Quality::default(),
        }
    }
}

/// Plan a thumbnail operation without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_thumbnail(
    source: &Path,
    output: &Path,
    original: Dimensions,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    let (width, height) = scaled_size(original.as_tuple(), config.width);

    let canvas = config
        .pad_to_height
        .filter(|&pad| pad > height)
        .map(|pad| Canvas {
            width,
            height: pad,
            offset_y: centering_offset(height, pad),
        });

    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        canvas,
        quality: config.quality,
    }
}

/// Create a thumbnail from an already desqueezed image.
///
/// Returns the dimensions of the written file (the canvas when padded).
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &ThumbnailConfig,
) -> Result<Dimensions> {
    let original = get_dimensions(backend, source)?;
    let params = plan_thumbnail(source, output, original, config);
    backend.thumbnail(&params)?;

    Ok(match params.canvas {
        Some(canvas) => Dimensions {
            width: canvas.width,
            height: canvas.height,
        },
        None => Dimensions {
            width: params.width,
            height: params.height,
        },
    })
}
