//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (TIFF 16-bit, JPEG, PNG) | `image` crate (pure Rust decoders) |
//! | Desqueeze resize | [`linear`](super::linear): `fast_image_resize` sRGB mapper, Lanczos2 |
//! | Thumbnail | `image::DynamicImage::thumbnail_exact` |
//! | Letterbox | `image::imageops::overlay` onto a black `RgbImage` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::linear::{resize_lanczos2, to_linear, to_srgb};
use super::params::{DesqueezeParams, Quality, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Encode and save as baseline JPEG.
fn save_jpeg(img: &RgbImage, path: &Path, quality: Quality) -> Result<(), BackendError> {
    let file = std::fs::File::create(path).map_err(BackendError::Io)?;
    let mut writer = std::io::BufWriter::new(file);
    let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.value());
    encoder
        .encode_image(img)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

/// The desqueeze colour protocol. Order matters: resampling must happen on
/// linear light, at 16-bit precision, before the 8-bit JPEG quantization.
fn desqueeze_pixels(
    img: DynamicImage,
    width: u32,
    height: u32,
) -> Result<RgbImage, BackendError> {
    let deep = img.into_rgb16();
    let linear = to_linear(&deep)?;
    let resized = resize_lanczos2(linear, width, height);
    let encoded = to_srgb(&resized)?;
    Ok(DynamicImage::ImageRgb16(encoded).into_rgb8())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn desqueeze(&self, params: &DesqueezeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let desqueezed = desqueeze_pixels(img, params.width, params.height)?;
        save_jpeg(&desqueezed, &params.output, params.quality)
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let thumb = img.thumbnail_exact(params.width, params.height).into_rgb8();

        let final_img = match params.canvas {
            Some(canvas) => {
                let mut letterboxed =
                    RgbImage::from_pixel(canvas.width, canvas.height, Rgb([0, 0, 0]));
                image::imageops::overlay(&mut letterboxed, &thumb, 0, canvas.offset_y as i64);
                letterboxed
            }
            None => thumb,
        };

        save_jpeg(&final_img, &params.output, params.quality)
    }
}
