//! # Desqueeze
//!
//! A small daemon for photographers shooting through an anamorphic adapter.
//! It watches an import directory for camera raw files, recognises the ones
//! taken through the adapter from their metadata alone, and turns each into a
//! DNG that raw editors open with the correct proportions.
//!
//! # Pipeline
//!
//! Every scan takes each file in the import directory through:
//!
//! ```text
//! 1. Read       exiftool -j        → FileType, FocalLength, FNumber
//! 2. Classify   lens profile       → anamorphic or skip (with reason)
//! 3. Convert    dnglab             → export/<stem>.dng
//! 4. Stretch    image crate        → full-size desqueezed JPEG + thumbnail
//! 5. Tag        exiftool           → DefaultScale, FocalLength, previews
//! 6. Clean up   remove temporaries and the original raw
//! ```
//!
//! Files are processed one at a time. A failure in any step leaves the
//! original raw where it was, so the next scan retries it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`lens`] | Anamorphic detection from focal length and aperture tags |
//! | [`metadata`] | The exiftool record fields the daemon relies on |
//! | [`imaging`] | Desqueeze geometry, linear-light Lanczos2 resize, thumbnails |
//! | [`tools`] | exiftool, dnglab and ImageMagick behind narrow traits |
//! | [`process`] | The per-file pipeline and its cleanup guarantees |
//! | [`scan`] | Non-recursive import directory listing |
//! | [`daemon`] | Scan loop and per-scan report |
//! | [`config`] | `config.toml` loading, validation and startup checks |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Metadata-Only Detection
//!
//! The adapter has no electronic contacts, so the camera falls back to a
//! nominal focal length and records no aperture. That combination is the
//! whole signal; pixels are never inspected to decide. The lens constants
//! live in [`lens::LensProfile`] and come from configuration, so a different
//! adapter is a config change.
//!
//! ## DefaultScale Instead of Resampling the Raw
//!
//! The DNG keeps the squeezed sensor data untouched. Raw editors honour the
//! `DefaultScale` tag, so the stretch happens at render time. Only the
//! embedded previews are resampled, so file browsers show the corrected
//! image too.
//!
//! ## Linear-Light Resampling
//!
//! Previews are resized in linear RGB at 16 bits per channel, then encoded
//! back to sRGB. Resizing gamma-encoded values darkens high-contrast detail.

pub mod config;
pub mod daemon;
pub mod imaging;
pub mod lens;
pub mod metadata;
pub mod output;
pub mod process;
pub mod scan;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_helpers;
