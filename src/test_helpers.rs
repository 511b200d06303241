//! Shared test utilities for the pipeline and daemon tests.
//!
//! Provides fake external tools and a throwaway import/export layout so the
//! per-file pipeline can run end to end without exiftool, dnglab or
//! ImageMagick.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let dirs = setup_dirs();
//! let raw = add_raw(&dirs, "DSC0001.ARW");
//!
//! let mut tool = FakeMetadataTool::new();
//! tool.insert(&raw, anamorphic_arw("24.0 mm"));
//! let converter = FakeConverter::new();
//! ```

use crate::metadata::{FNumber, ImageMetadata};
use crate::tools::{MetadataTool, RawConverter, TagEdit, ToolError};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Temp root with `import/` and `export/` subdirectories.
pub struct TestDirs {
    pub root: TempDir,
    pub import: PathBuf,
    pub export: PathBuf,
}

pub fn setup_dirs() -> TestDirs {
    let root = TempDir::new().unwrap();
    let import = root.path().join("import");
    let export = root.path().join("export");
    std::fs::create_dir(&import).unwrap();
    std::fs::create_dir(&export).unwrap();
    TestDirs {
        root,
        import,
        export,
    }
}

/// Create a placeholder raw file in the import directory.
pub fn add_raw(dirs: &TestDirs, name: &str) -> PathBuf {
    let path = dirs.import.join(name);
    std::fs::write(&path, b"raw sensor data").unwrap();
    path
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =========================================================================
// Metadata fixtures
// =========================================================================

/// ARW shot through the adapter: no aperture reported.
pub fn anamorphic_arw(focal_length: &str) -> ImageMetadata {
    ImageMetadata {
        file_type: "ARW".to_string(),
        focal_length: Some(focal_length.to_string()),
        f_number: FNumber::Undefined,
        width: Some(6048),
        height: Some(4024),
    }
}

/// ARW shot with a regular electronic lens.
pub fn regular_arw() -> ImageMetadata {
    ImageMetadata {
        file_type: "ARW".to_string(),
        focal_length: Some("35.0 mm".to_string()),
        f_number: FNumber::Value(2.8),
        width: Some(6048),
        height: Some(4024),
    }
}

pub fn jpeg_file() -> ImageMetadata {
    ImageMetadata {
        file_type: "JPEG".to_string(),
        focal_length: Some("24.0 mm".to_string()),
        f_number: FNumber::Undefined,
        width: Some(6000),
        height: Some(4000),
    }
}

fn fake_failure(program: &str, message: &str) -> ToolError {
    ToolError::Spawn {
        program: program.to_string(),
        source: io::Error::other(message.to_string()),
    }
}

// =========================================================================
// FakeMetadataTool
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub path: PathBuf,
    pub edits: Vec<TagEdit>,
    /// Whether every embedded source file existed when the write happened.
    pub embedded_sources_present: bool,
}

/// Serves canned metadata by path and records writes in order.
#[derive(Default)]
pub struct FakeMetadataTool {
    pub records: HashMap<PathBuf, ImageMetadata>,
    pub writes: Vec<RecordedWrite>,
    /// Fail the write with this zero-based index.
    pub fail_write_at: Option<usize>,
}

impl FakeMetadataTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &Path, metadata: ImageMetadata) {
        self.records.insert(path.to_path_buf(), metadata);
    }

    /// Tags written to `path`, flattened across calls.
    pub fn edits_for(&self, path: &Path) -> Vec<TagEdit> {
        self.writes
            .iter()
            .filter(|w| w.path == path)
            .flat_map(|w| w.edits.clone())
            .collect()
    }
}

impl MetadataTool for FakeMetadataTool {
    fn read(&mut self, path: &Path) -> Result<ImageMetadata, ToolError> {
        self.records
            .get(path)
            .cloned()
            .ok_or_else(|| fake_failure("fake-exiftool", "unknown file format"))
    }

    fn write(&mut self, path: &Path, edits: &[TagEdit]) -> Result<(), ToolError> {
        if self.fail_write_at == Some(self.writes.len()) {
            return Err(fake_failure("fake-exiftool", "write failed"));
        }
        let embedded_sources_present = edits.iter().all(|edit| match edit {
            TagEdit::Embed { source, .. } => source.is_file(),
            _ => true,
        });
        self.writes.push(RecordedWrite {
            path: path.to_path_buf(),
            edits: edits.to_vec(),
            embedded_sources_present,
        });
        Ok(())
    }
}

// =========================================================================
// FakeConverter
// =========================================================================

/// Creates empty DNG and TIFF files at the real converter's paths.
#[derive(Default)]
pub struct FakeConverter {
    pub fail_convert: bool,
    pub fail_develop: bool,
    pub converted: Mutex<Vec<PathBuf>>,
}

impl FakeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_convert() -> Self {
        Self {
            fail_convert: true,
            ..Self::default()
        }
    }

    pub fn failing_develop() -> Self {
        Self {
            fail_develop: true,
            ..Self::default()
        }
    }

    pub fn converted(&self) -> Vec<PathBuf> {
        self.converted.lock().unwrap().clone()
    }
}

impl RawConverter for FakeConverter {
    fn convert(&self, source: &Path, export_dir: &Path) -> Result<PathBuf, ToolError> {
        if self.fail_convert {
            return Err(fake_failure("fake-dnglab", "unsupported camera"));
        }
        let output = crate::tools::dng_path(source, export_dir);
        std::fs::write(&output, b"dng").unwrap();
        self.converted.lock().unwrap().push(source.to_path_buf());
        Ok(output)
    }

    fn develop(&self, container: &Path, work_dir: &Path) -> Result<PathBuf, ToolError> {
        if self.fail_develop {
            return Err(fake_failure("fake-magick", "no decode delegate"));
        }
        let output = crate::tools::developed_path(container, work_dir);
        std::fs::write(&output, b"tiff").unwrap();
        Ok(output)
    }
}
