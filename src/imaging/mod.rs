//! Image processing: pure Rust, on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Desqueeze** | 16-bit → linear RGB → Lanczos2 → sRGB → 8-bit, JPEG q95 |
//! | **Thumbnail** | `thumbnail_exact` + optional black letterbox, JPEG q95 |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Linear**: sRGB transfer functions and the Lanczos2 resampler
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub(crate) mod linear;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{centering_offset, desqueezed_size, scaled_size};
pub use operations::{
    ThumbnailConfig, create_desqueezed_preview, create_thumbnail, get_dimensions,
};
pub use params::{Canvas, DesqueezeParams, Quality, ThumbnailParams};
pub use rust_backend::RustBackend;
