//! Raw conversion with dnglab, development with ImageMagick.

use super::{RawConverter, ToolError, expect_output, run_tool};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// [`RawConverter`] backed by `dnglab convert` and `magick`.
#[derive(Debug, Clone)]
pub struct DngConverter {
    dnglab: PathBuf,
    magick: PathBuf,
}

impl DngConverter {
    pub fn new(dnglab: impl Into<PathBuf>, magick: impl Into<PathBuf>) -> Self {
        Self {
            dnglab: dnglab.into(),
            magick: magick.into(),
        }
    }
}

/// `<export_dir>/<stem>.dng`
pub fn dng_path(source: &Path, export_dir: &Path) -> PathBuf {
    let name = source.file_name().unwrap_or(source.as_os_str());
    export_dir.join(name).with_extension("dng")
}

/// `<work_dir>/<container name>_developed.tiff`
pub fn developed_path(container: &Path, work_dir: &Path) -> PathBuf {
    let mut name = container
        .file_name()
        .unwrap_or(container.as_os_str())
        .to_owned();
    name.push("_developed.tiff");
    work_dir.join(name)
}

/// Overwrite any stale DNG, keep the full sensor area.
fn convert_args(source: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "convert".into(),
        "-f".into(),
        "--crop".into(),
        "none".into(),
        source.as_os_str().to_owned(),
        output.as_os_str().to_owned(),
    ]
}

fn develop_args(container: &Path, output: &Path) -> Vec<OsString> {
    vec![
        container.as_os_str().to_owned(),
        "-depth".into(),
        "16".into(),
        output.as_os_str().to_owned(),
    ]
}

impl RawConverter for DngConverter {
    fn convert(&self, source: &Path, export_dir: &Path) -> Result<PathBuf, ToolError> {
        let output = dng_path(source, export_dir);
        run_tool(&self.dnglab, &convert_args(source, &output))?;
        expect_output(output)
    }

    fn develop(&self, container: &Path, work_dir: &Path) -> Result<PathBuf, ToolError> {
        let output = developed_path(container, work_dir);
        run_tool(&self.magick, &develop_args(container, &output))?;
        expect_output(output)
    }
}
