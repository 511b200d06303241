//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//! Rounding is `f64::round` throughout: nearest integer, halves away from zero.

/// Calculate the desqueezed size of a squeezed frame.
///
/// The anamorphic stretch is applied to the long axis of the frame as it
/// was shot: portrait frames (`width < height`) are stretched vertically,
/// landscape and square frames horizontally. The other axis is unchanged.
///
/// # Arguments
/// * `original` - Squeezed image dimensions (width, height)
/// * `scale_factor` - Anamorphic stretch ratio, e.g. `1.33`
///
/// # Returns
/// * `(width, height)` - Desqueezed dimensions
///
/// # Examples
/// ```
/// # use desqueeze::imaging::desqueezed_size;
/// // 1920 * 1.33 = 2553.6 → 2554
/// assert_eq!(desqueezed_size((1920, 1080), 1.33), (2554, 1080));
///
/// // Portrait: the height is stretched instead
/// assert_eq!(desqueezed_size((1080, 1920), 1.33), (1080, 2554));
/// ```
pub fn desqueezed_size(original: (u32, u32), scale_factor: f64) -> (u32, u32) {
    let (width, height) = original;

    if width < height {
        // Portrait: the adapter squeezed the vertical axis
        (width, stretch(height, scale_factor))
    } else {
        // Landscape or square: the adapter squeezed the horizontal axis
        (stretch(width, scale_factor), height)
    }
}

fn stretch(edge: u32, scale_factor: f64) -> u32 {
    (edge as f64 * scale_factor).round() as u32
}

/// Calculate dimensions for a given width, preserving the aspect ratio.
///
/// Unlike [`desqueezed_size`], this never changes the aspect ratio; it is
/// used for thumbnail downscaling of an already desqueezed image. The height
/// never drops below one pixel, even for extreme panoramas.
///
/// # Examples
/// ```
/// # use desqueeze::imaging::scaled_size;
/// assert_eq!(scaled_size((4000, 3000), 1024), (1024, 768));
/// ```
pub fn scaled_size(original: (u32, u32), target_width: u32) -> (u32, u32) {
    let (width, height) = original;
    let h = (target_width as f64 * height as f64 / width as f64).round() as u32;
    (target_width, h.max(1))
}

/// Vertical offset that centers a `content_height` image on a taller canvas.
///
/// When the leftover rows are odd, the half row is rounded away from zero,
/// so the top bar is one row taller than the bottom bar. Returns 0 when the
/// content is not shorter than the canvas.
pub fn centering_offset(content_height: u32, canvas_height: u32) -> u32 {
    let leftover = canvas_height.saturating_sub(content_height);
    (leftover as f64 / 2.0).round() as u32
}
