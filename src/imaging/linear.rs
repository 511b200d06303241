//! Linear-light resampling.
//!
//! Resizing gamma-encoded pixels darkens fine detail and shifts midtones, so
//! the desqueeze resize happens on linear RGB floats:
//!
//! ```text
//! Rgb16 (sRGB) ──to_linear──▶ Rgb32F (linear) ──resize_lanczos2──▶ Rgb32F ──to_srgb──▶ Rgb16
//! ```
//!
//! The sRGB transfer itself is `fast_image_resize`'s 16-bit lookup mapper.
//! The `image` crate only offers a three-lobe Lanczos, so the separable
//! two-lobe kernel here follows the same window/normalize scheme as
//! `image::imageops::resize`.

use super::backend::BackendError;
use fast_image_resize as fr;
use fr::images::Image as FrImage;
use image::{ImageBuffer, Rgb, Rgb32FImage};
use std::f32::consts::PI;

pub type Rgb16Image = ImageBuffer<Rgb<u16>, Vec<u16>>;

const LANCZOS2_SUPPORT: f32 = 2.0;

#[derive(Debug, Clone, Copy)]
enum Transfer {
    ToLinear,
    ToSrgb,
}

/// Run 16-bit RGB samples through the sRGB transfer curve in one direction.
fn apply_transfer(
    width: u32,
    height: u32,
    samples: &[u16],
    transfer: Transfer,
) -> Result<Vec<u16>, BackendError> {
    let bytes: Vec<u8> = samples.iter().flat_map(|v| v.to_ne_bytes()).collect();
    let src = FrImage::from_vec_u8(width, height, bytes, fr::PixelType::U16x3)
        .map_err(|e| BackendError::ProcessingFailed(format!("Invalid pixel buffer: {e:?}")))?;
    let mut dst = FrImage::new(width, height, src.pixel_type());

    let mapper = fr::create_srgb_mapper();
    match transfer {
        Transfer::ToLinear => mapper.forward_map(&src, &mut dst),
        Transfer::ToSrgb => mapper.backward_map(&src, &mut dst),
    }
    .map_err(|e| BackendError::ProcessingFailed(format!("sRGB transfer failed: {e:?}")))?;

    Ok(dst
        .buffer()
        .chunks_exact(2)
        .map(|b| u16::from_ne_bytes([b[0], b[1]]))
        .collect())
}

fn buffer_mismatch() -> BackendError {
    BackendError::ProcessingFailed("Pixel buffer does not match image dimensions".to_string())
}

/// Decode a 16-bit sRGB image into linear light in `0.0..=1.0`.
pub fn to_linear(image: &Rgb16Image) -> Result<Rgb32FImage, BackendError> {
    let (width, height) = image.dimensions();
    let linear = apply_transfer(width, height, image.as_raw(), Transfer::ToLinear)?;
    let samples = linear
        .into_iter()
        .map(|v| v as f32 / u16::MAX as f32)
        .collect();
    Rgb32FImage::from_raw(width, height, samples).ok_or_else(buffer_mismatch)
}

/// Encode a linear-light image back to 16-bit sRGB. Out-of-range values
/// (Lanczos ringing) are clipped.
pub fn to_srgb(image: &Rgb32FImage) -> Result<Rgb16Image, BackendError> {
    let (width, height) = image.dimensions();
    let quantized: Vec<u16> = image
        .as_raw()
        .iter()
        .map(|l| (l.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16)
        .collect();
    let encoded = apply_transfer(width, height, &quantized, Transfer::ToSrgb)?;
    Rgb16Image::from_raw(width, height, encoded).ok_or_else(buffer_mismatch)
}

fn sinc(x: f32) -> f32 {
    if x == 0.0 {
        1.0
    } else {
        let a = x * PI;
        a.sin() / a
    }
}

fn lanczos2(x: f32) -> f32 {
    if x.abs() < LANCZOS2_SUPPORT {
        sinc(x) * sinc(x / LANCZOS2_SUPPORT)
    } else {
        0.0
    }
}

/// Source window and normalized weights for one output row or column.
struct Taps {
    start: u32,
    weights: Vec<f32>,
}

fn taps(src_len: u32, dst_len: u32) -> Vec<Taps> {
    let ratio = src_len as f32 / dst_len as f32;
    // Widen the kernel when shrinking so every source pixel contributes
    let scale = ratio.max(1.0);
    let support = LANCZOS2_SUPPORT * scale;

    (0..dst_len)
        .map(|i| {
            let center = (i as f32 + 0.5) * ratio;
            let left = ((center - support).floor() as i64).clamp(0, src_len as i64 - 1);
            let right = ((center + support).ceil() as i64).clamp(left + 1, src_len as i64);

            let mut weights: Vec<f32> = (left..right)
                .map(|j| lanczos2((j as f32 + 0.5 - center) / scale))
                .collect();
            let sum: f32 = weights.iter().sum();
            if sum != 0.0 {
                weights.iter_mut().for_each(|w| *w /= sum);
            }

            Taps {
                start: left as u32,
                weights,
            }
        })
        .collect()
}

fn resample_horizontal(image: &Rgb32FImage, width: u32) -> Rgb32FImage {
    let taps = taps(image.width(), width);
    Rgb32FImage::from_fn(width, image.height(), |x, y| {
        let tap = &taps[x as usize];
        let mut acc = [0.0f32; 3];
        for (k, w) in tap.weights.iter().enumerate() {
            let Rgb(px) = *image.get_pixel(tap.start + k as u32, y);
            for (a, v) in acc.iter_mut().zip(px) {
                *a += v * w;
            }
        }
        Rgb(acc)
    })
}

fn resample_vertical(image: &Rgb32FImage, height: u32) -> Rgb32FImage {
    let taps = taps(image.height(), height);
    Rgb32FImage::from_fn(image.width(), height, |x, y| {
        let tap = &taps[y as usize];
        let mut acc = [0.0f32; 3];
        for (k, w) in tap.weights.iter().enumerate() {
            let Rgb(px) = *image.get_pixel(x, tap.start + k as u32);
            for (a, v) in acc.iter_mut().zip(px) {
                *a += v * w;
            }
        }
        Rgb(acc)
    })
}

/// Resize with a separable two-lobe Lanczos filter.
///
/// Axes whose length is unchanged are passed through untouched, so a pure
/// horizontal desqueeze costs a single pass and a no-op resize costs nothing.
pub fn resize_lanczos2(image: Rgb32FImage, width: u32, height: u32) -> Rgb32FImage {
    let horizontal = if width == image.width() {
        image
    } else {
        resample_horizontal(&image, width)
    };

    if height == horizontal.height() {
        horizontal
    } else {
        resample_vertical(&horizontal, height)
    }
}
