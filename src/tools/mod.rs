//! External collaborators: exiftool, dnglab and ImageMagick.
//!
//! The pipeline only sees two narrow traits:
//!
//! | Trait | Operations | Real implementation |
//! |---|---|---|
//! | [`MetadataTool`] | read tags, write tag edits in place | [`Exiftool`] |
//! | [`RawConverter`] | raw → DNG, DNG → 16-bit TIFF | [`DngConverter`] |
//!
//! Every invocation is synchronous and blocking. A non-zero exit status, a
//! failure to spawn, or a promised output file that never appeared is a
//! [`ToolError`]; callers treat it as fatal for the file being processed.

mod dng;
mod exiftool;

pub use dng::{DngConverter, developed_path, dng_path};
pub use self::exiftool::Exiftool;

use crate::metadata::{ImageMetadata, MetadataError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("exiftool error: {0}")]
    Exiftool(#[from] ::exiftool::ExifToolError),
    #[error("unusable metadata: {0}")]
    Metadata(#[from] MetadataError),
    #[error("expected output was not created: {0}")]
    MissingOutput(PathBuf),
}

/// Embedded preview slots of a DNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSlot {
    /// Small thumbnail shown by file browsers.
    PreviewImage,
    /// Full-size JPEG rendition.
    JpgFromRaw,
}

impl PreviewSlot {
    pub fn tag_name(self) -> &'static str {
        match self {
            PreviewSlot::PreviewImage => "PreviewImage",
            PreviewSlot::JpgFromRaw => "JpgFromRaw",
        }
    }
}

/// One in-place tag modification.
#[derive(Debug, Clone, PartialEq)]
pub enum TagEdit {
    /// `DefaultScale = "<factor> 1"`: horizontal stretch, vertical unchanged.
    DefaultScale(f64),
    FocalLength(String),
    /// Binary content of `source` becomes the tag value.
    Embed { slot: PreviewSlot, source: PathBuf },
}

impl TagEdit {
    /// Render as an exiftool command line argument.
    pub fn to_arg(&self) -> OsString {
        match self {
            TagEdit::DefaultScale(factor) => format!("-DefaultScale={factor} 1").into(),
            TagEdit::FocalLength(value) => format!("-FocalLength={value}").into(),
            TagEdit::Embed { slot, source } => {
                let mut arg = OsString::from(format!("-{}<=", slot.tag_name()));
                arg.push(source.as_os_str());
                arg
            }
        }
    }
}

/// Reads and rewrites image metadata.
pub trait MetadataTool {
    fn read(&mut self, path: &Path) -> Result<ImageMetadata, ToolError>;

    /// Apply all `edits` to `path` in one pass, overwriting the file in place
    /// without leaving a backup copy.
    fn write(&mut self, path: &Path, edits: &[TagEdit]) -> Result<(), ToolError>;
}

/// Converts camera raw files into the working container.
pub trait RawConverter {
    /// Convert `source` into `<export_dir>/<stem>.dng` with no implicit
    /// cropping. Returns the DNG path.
    fn convert(&self, source: &Path, export_dir: &Path) -> Result<PathBuf, ToolError>;

    /// Render `container` to a 16-bit RGB TIFF inside `work_dir` that the
    /// image backend can decode. Returns the TIFF path.
    fn develop(&self, container: &Path, work_dir: &Path) -> Result<PathBuf, ToolError>;
}

/// Run `program` to completion, failing on spawn errors and non-zero exit.
pub(crate) fn run_tool(program: &Path, args: &[OsString]) -> Result<Output, ToolError> {
    debug!(program = %program.display(), ?args, "Running external tool");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ToolError::Spawn {
            program: program.display().to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            program: program.display().to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// Tools occasionally exit 0 without writing anything.
pub(crate) fn expect_output(path: PathBuf) -> Result<PathBuf, ToolError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(ToolError::MissingOutput(path))
    }
}
