//! exiftool-backed [`MetadataTool`].
//!
//! Reads go through a long-lived `exiftool -stay_open` process managed by the
//! `exiftool` crate. Writes spawn a one-shot `exiftool
//! -overwrite_original_in_place` so every edit hits the disk before the call
//! returns.

use super::{MetadataTool, TagEdit, ToolError, run_tool};
use crate::metadata::ImageMetadata;
use ::exiftool::ExifTool;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Exiftool {
    reader: ExifTool,
    executable: PathBuf,
}

impl Exiftool {
    /// Start the reader process for `executable` (a bare name is looked up on
    /// `PATH`).
    pub fn new(executable: &Path) -> Result<Self, ToolError> {
        Ok(Self {
            reader: ExifTool::with_executable(executable)?,
            executable: executable.to_path_buf(),
        })
    }
}

/// Command line for an in-place write of `edits` to `path`.
pub(crate) fn write_args(path: &Path, edits: &[TagEdit]) -> Vec<OsString> {
    let mut args = Vec::with_capacity(edits.len() + 2);
    args.push(OsString::from("-overwrite_original_in_place"));
    args.extend(edits.iter().map(TagEdit::to_arg));
    args.push(path.as_os_str().to_owned());
    args
}

impl MetadataTool for Exiftool {
    fn read(&mut self, path: &Path) -> Result<ImageMetadata, ToolError> {
        // Print-converted output keeps FocalLength as "24.0 mm" and FNumber
        // as "undef" when the lens reports nothing.
        let record = self.reader.json(path, &[])?;
        Ok(ImageMetadata::from_exiftool_json(&record)?)
    }

    fn write(&mut self, path: &Path, edits: &[TagEdit]) -> Result<(), ToolError> {
        if edits.is_empty() {
            return Ok(());
        }
        debug!(file = %path.display(), ?edits, "Writing tags");
        run_tool(&self.executable, &write_args(path, edits))?;
        Ok(())
    }
}
