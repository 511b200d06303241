//! Per-file desqueeze pipeline.
//!
//! Takes one file from the import directory and, if it is an anamorphic raw,
//! turns it into a tagged DNG in the export directory:
//!
//! ```text
//! DSC00042.ARW ──dnglab──▶ DSC00042.dng
//!                              │ magick -depth 16
//!                              ▼
//!                  DSC00042.dng_developed.tiff
//!                              │ linear-light Lanczos2 stretch
//!                              ▼
//!                  DSC00042.dng_preview.jpg ───────────────┐
//!                              │ thumbnail (1024 px)       │
//!                              ▼                           │
//!                  DSC00042.dng_thumb.jpg                  │
//!                              │                           │
//!           exiftool: DefaultScale, FocalLength?,          │
//!                     PreviewImage ◀── thumb,              │
//!                     JpgFromRaw   ◀───────────────────────┘
//! ```
//!
//! The original is deleted only after every write to the DNG succeeded. If
//! any step fails, the intermediates and the partial DNG are removed and the
//! original stays in the import directory for the next scan.

use crate::config::DaemonConfig;
use crate::imaging::{
    BackendError, ImageBackend, ThumbnailConfig, create_desqueezed_preview, create_thumbnail,
};
use crate::lens::{AnamorphicClassifier, AnamorphicDecision, Rejection};
use crate::metadata::ImageMetadata;
use crate::tools::{MetadataTool, PreviewSlot, RawConverter, TagEdit, ToolError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("External tool failed: {0}")]
    Tool(#[from] ToolError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Configuration for the per-file pipeline.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub export_dir: PathBuf,
    pub raw_file_types: Vec<String>,
    pub classifier: AnamorphicClassifier,
    pub thumbnail: ThumbnailConfig,
}

impl ProcessConfig {
    pub fn from_daemon_config(config: &DaemonConfig) -> Self {
        Self {
            export_dir: config.paths.export.clone(),
            raw_file_types: config.lens.raw_file_types.clone(),
            classifier: AnamorphicClassifier::new(config.lens_profile()),
            thumbnail: config.thumbnail_config(),
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.classifier.profile().scale_factor
    }

    fn is_raw(&self, metadata: &ImageMetadata) -> bool {
        self.raw_file_types.iter().any(|t| metadata.is_file_type(t))
    }
}

/// Why a file was left alone.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NotRaw { file_type: String },
    NotAnamorphic(Rejection),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotRaw { file_type } => write!(f, "not a raw file ({file_type})"),
            SkipReason::NotAnamorphic(rejection) => write!(f, "not anamorphic: {rejection}"),
        }
    }
}

/// What the pipeline will do with a file, decided from metadata alone.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Skip(SkipReason),
    Desqueeze { focal_length_override: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Desqueezed { output: PathBuf },
    Skipped(SkipReason),
}

pub fn evaluate(metadata: &ImageMetadata, config: &ProcessConfig) -> Verdict {
    if !config.is_raw(metadata) {
        return Verdict::Skip(SkipReason::NotRaw {
            file_type: metadata.file_type.clone(),
        });
    }

    match config.classifier.classify(metadata) {
        AnamorphicDecision::Anamorphic {
            focal_length_override,
        } => Verdict::Desqueeze {
            focal_length_override,
        },
        AnamorphicDecision::NotAnamorphic(rejection) => {
            Verdict::Skip(SkipReason::NotAnamorphic(rejection))
        }
    }
}

/// Read, classify and, when anamorphic, desqueeze one import file.
pub fn process_file(
    tool: &mut impl MetadataTool,
    converter: &impl RawConverter,
    backend: &impl ImageBackend,
    source: &Path,
    config: &ProcessConfig,
) -> Result<FileOutcome, ProcessError> {
    let metadata = tool.read(source)?;

    match evaluate(&metadata, config) {
        Verdict::Skip(reason) => {
            debug!(file = %source.display(), %reason, "Skipping");
            Ok(FileOutcome::Skipped(reason))
        }
        Verdict::Desqueeze {
            focal_length_override,
        } => {
            info!(file = %source.display(), "Desqueezing");
            let output = desqueeze_file(
                tool,
                converter,
                backend,
                source,
                focal_length_override.as_deref(),
                config,
            )?;
            info!(file = %source.display(), output = %output.display(), "Desqueezed");
            Ok(FileOutcome::Desqueezed { output })
        }
    }
}

/// Convert, stretch, tag and embed previews; then delete `source`.
///
/// Returns the finished DNG.
pub fn desqueeze_file(
    tool: &mut impl MetadataTool,
    converter: &impl RawConverter,
    backend: &impl ImageBackend,
    source: &Path,
    focal_length_override: Option<&str>,
    config: &ProcessConfig,
) -> Result<PathBuf, ProcessError> {
    let container = converter.convert(source, &config.export_dir)?;
    debug!(file = %source.display(), container = %container.display(), "Converted");
    let mut work = WorkFiles::new(container.clone());

    let developed = work.track(converter.develop(&container, &config.export_dir)?);
    let preview = work.track(suffixed(&container, "_preview.jpg"));
    let stretched = create_desqueezed_preview(backend, &developed, &preview, config.scale_factor())?;
    debug!(
        file = %source.display(),
        width = stretched.width,
        height = stretched.height,
        "Rendered desqueezed preview"
    );
    work.discard(&developed);

    let mut edits = vec![TagEdit::DefaultScale(config.scale_factor())];
    if let Some(focal_length) = focal_length_override {
        edits.push(TagEdit::FocalLength(focal_length.to_string()));
    }
    tool.write(&container, &edits)?;

    let thumb = work.track(suffixed(&container, "_thumb.jpg"));
    create_thumbnail(backend, &preview, &thumb, &config.thumbnail)?;
    embed(tool, &container, PreviewSlot::PreviewImage, &thumb)?;
    work.discard(&thumb);

    embed(tool, &container, PreviewSlot::JpgFromRaw, &preview)?;
    work.discard(&preview);

    let output = work.finish();
    fs::remove_file(source)?;
    Ok(output)
}

fn embed(
    tool: &mut impl MetadataTool,
    container: &Path,
    slot: PreviewSlot,
    source: &Path,
) -> Result<(), ToolError> {
    tool.write(
        container,
        &[TagEdit::Embed {
            slot,
            source: source.to_path_buf(),
        }],
    )
}

/// `<dir>/<name><suffix>`, keeping the full file name including extension.
fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or(path.as_os_str()).to_owned();
    name.push(suffix);
    path.with_file_name(name)
}

/// Files created while processing one source.
///
/// Anything still tracked on drop is removed, including the container
/// unless [`WorkFiles::finish`] handed it over.
struct WorkFiles {
    container: PathBuf,
    keep_container: bool,
    intermediates: Vec<PathBuf>,
}

impl WorkFiles {
    fn new(container: PathBuf) -> Self {
        Self {
            container,
            keep_container: false,
            intermediates: Vec::new(),
        }
    }

    fn track(&mut self, path: PathBuf) -> PathBuf {
        self.intermediates.push(path.clone());
        path
    }

    fn discard(&mut self, path: &Path) {
        self.intermediates.retain(|p| p != path);
        remove_intermediate(path);
    }

    fn finish(mut self) -> PathBuf {
        self.keep_container = true;
        self.container.clone()
    }
}

impl Drop for WorkFiles {
    fn drop(&mut self) {
        for path in self.intermediates.drain(..) {
            remove_intermediate(&path);
        }
        if !self.keep_container {
            remove_intermediate(&self.container);
        }
    }
}

fn remove_intermediate(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(file = %path.display(), "Removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(file = %path.display(), error = %e, "Failed to remove intermediate file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{Canvas, Dimensions};
    use crate::metadata::FNumber;
    use crate::test_helpers::*;

    fn config(dirs: &TestDirs) -> ProcessConfig {
        let mut daemon = DaemonConfig::default();
        daemon.paths.import = dirs.import.clone();
        daemon.paths.export = dirs.export.clone();
        ProcessConfig::from_daemon_config(&daemon)
    }

    fn sensor_backend() -> MockBackend {
        MockBackend::with_dimensions(vec![Dimensions {
            width: 6048,
            height: 4024,
        }])
    }

    // =========================================================================
    // evaluate
    // =========================================================================

    #[test]
    fn evaluate_skips_non_raw() {
        let dirs = setup_dirs();
        assert_eq!(
            evaluate(&jpeg_file(), &config(&dirs)),
            Verdict::Skip(SkipReason::NotRaw {
                file_type: "JPEG".to_string()
            })
        );
    }

    #[test]
    fn evaluate_skips_regular_lens() {
        let dirs = setup_dirs();
        assert_eq!(
            evaluate(&regular_arw(), &config(&dirs)),
            Verdict::Skip(SkipReason::NotAnamorphic(
                Rejection::FocalLengthNotCandidate(35)
            ))
        );
    }

    #[test]
    fn evaluate_desqueezes_adapter_shot() {
        let dirs = setup_dirs();
        assert_eq!(
            evaluate(&anamorphic_arw("50.0 mm"), &config(&dirs)),
            Verdict::Desqueeze {
                focal_length_override: None
            }
        );
        assert_eq!(
            evaluate(&anamorphic_arw("0.0 mm"), &config(&dirs)),
            Verdict::Desqueeze {
                focal_length_override: Some("35.0A mm".to_string())
            }
        );
    }

    #[test]
    fn evaluate_matches_raw_type_case_insensitively() {
        let dirs = setup_dirs();
        let mut meta = anamorphic_arw("24.0 mm");
        meta.file_type = "arw".to_string();
        assert!(matches!(
            evaluate(&meta, &config(&dirs)),
            Verdict::Desqueeze { .. }
        ));
    }

    // =========================================================================
    // desqueeze_file: happy path
    // =========================================================================

    #[test]
    fn desqueeze_produces_only_the_dng() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        let converter = FakeConverter::new();
        let backend = sensor_backend();

        let output =
            desqueeze_file(&mut tool, &converter, &backend, &source, None, &config(&dirs))
                .unwrap();

        assert_eq!(output, dirs.export.join("DSC0001.dng"));
        assert_eq!(file_names(&dirs.export), vec!["DSC0001.dng"]);
        assert!(!source.exists());
    }

    #[test]
    fn writes_happen_in_order() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        let converter = FakeConverter::new();
        let backend = sensor_backend();

        desqueeze_file(&mut tool, &converter, &backend, &source, None, &config(&dirs)).unwrap();

        let dng = dirs.export.join("DSC0001.dng");
        assert_eq!(
            tool.edits_for(&dng),
            vec![
                TagEdit::DefaultScale(1.33),
                TagEdit::Embed {
                    slot: PreviewSlot::PreviewImage,
                    source: dirs.export.join("DSC0001.dng_thumb.jpg"),
                },
                TagEdit::Embed {
                    slot: PreviewSlot::JpgFromRaw,
                    source: dirs.export.join("DSC0001.dng_preview.jpg"),
                },
            ]
        );
        assert_eq!(tool.writes.len(), 3);
        assert!(tool.writes.iter().all(|w| w.embedded_sources_present));
    }

    #[test]
    fn zero_focal_length_is_overridden() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        let converter = FakeConverter::new();
        let backend = sensor_backend();

        desqueeze_file(
            &mut tool,
            &converter,
            &backend,
            &source,
            Some("35.0A mm"),
            &config(&dirs),
        )
        .unwrap();

        assert_eq!(
            tool.writes[0].edits,
            vec![
                TagEdit::DefaultScale(1.33),
                TagEdit::FocalLength("35.0A mm".to_string())
            ]
        );
    }

    #[test]
    fn backend_sees_stretched_preview() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        let converter = FakeConverter::new();
        let backend = sensor_backend();

        desqueeze_file(&mut tool, &converter, &backend, &source, None, &config(&dirs)).unwrap();

        let ops = backend.get_operations();
        let developed = dirs.export.join("DSC0001.dng_developed.tiff");
        let preview = dirs.export.join("DSC0001.dng_preview.jpg");
        assert_eq!(
            ops,
            vec![
                RecordedOp::Identify(developed.to_string_lossy().to_string()),
                RecordedOp::Desqueeze {
                    source: developed.to_string_lossy().to_string(),
                    output: preview.to_string_lossy().to_string(),
                    width: 8044,
                    height: 4024,
                    quality: 95,
                },
                RecordedOp::Identify(preview.to_string_lossy().to_string()),
                RecordedOp::Thumbnail {
                    source: preview.to_string_lossy().to_string(),
                    output: dirs
                        .export
                        .join("DSC0001.dng_thumb.jpg")
                        .to_string_lossy()
                        .to_string(),
                    width: 1024,
                    height: 512,
                    canvas: None,
                    quality: 95,
                },
            ]
        );
    }

    #[test]
    fn padded_thumbnail_is_letterboxed() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        let converter = FakeConverter::new();
        let backend = sensor_backend();
        let mut config = config(&dirs);
        config.thumbnail.pad_to_height = Some(768);

        desqueeze_file(&mut tool, &converter, &backend, &source, None, &config).unwrap();

        let canvas = backend.get_operations().into_iter().find_map(|op| match op {
            RecordedOp::Thumbnail { canvas, .. } => canvas,
            _ => None,
        });
        assert_eq!(
            canvas,
            Some(Canvas {
                width: 1024,
                height: 768,
                offset_y: 128
            })
        );
    }

    // =========================================================================
    // desqueeze_file: failures keep the source
    // =========================================================================

    #[test]
    fn convert_failure_keeps_source() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        let converter = FakeConverter::failing_convert();
        let backend = sensor_backend();

        let result = desqueeze_file(&mut tool, &converter, &backend, &source, None, &config(&dirs));

        assert!(matches!(result, Err(ProcessError::Tool(_))));
        assert!(source.exists());
        assert!(file_names(&dirs.export).is_empty());
    }

    #[test]
    fn develop_failure_removes_partial_dng() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        let converter = FakeConverter::failing_develop();
        let backend = sensor_backend();

        let result = desqueeze_file(&mut tool, &converter, &backend, &source, None, &config(&dirs));

        assert!(matches!(result, Err(ProcessError::Tool(_))));
        assert!(source.exists());
        assert!(file_names(&dirs.export).is_empty());
        assert!(tool.writes.is_empty());
    }

    #[test]
    fn transform_failure_cleans_up() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        let converter = FakeConverter::new();
        let backend = MockBackend {
            fail_desqueeze: true,
            ..sensor_backend()
        };

        let result = desqueeze_file(&mut tool, &converter, &backend, &source, None, &config(&dirs));

        assert!(matches!(result, Err(ProcessError::Imaging(_))));
        assert!(source.exists());
        assert!(file_names(&dirs.export).is_empty());
    }

    #[test]
    fn embed_failure_cleans_up() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool {
            fail_write_at: Some(1),
            ..FakeMetadataTool::new()
        };
        let converter = FakeConverter::new();
        let backend = sensor_backend();

        let result = desqueeze_file(&mut tool, &converter, &backend, &source, None, &config(&dirs));

        assert!(matches!(result, Err(ProcessError::Tool(_))));
        assert!(source.exists());
        assert!(file_names(&dirs.export).is_empty());
    }

    // =========================================================================
    // process_file
    // =========================================================================

    #[test]
    fn process_file_skips_without_converting() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0002.ARW");
        let mut tool = FakeMetadataTool::new();
        tool.insert(&source, regular_arw());
        let converter = FakeConverter::new();
        let backend = MockBackend::new();

        let outcome =
            process_file(&mut tool, &converter, &backend, &source, &config(&dirs)).unwrap();

        assert!(matches!(
            outcome,
            FileOutcome::Skipped(SkipReason::NotAnamorphic(_))
        ));
        assert!(converter.converted().is_empty());
        assert!(source.exists());
    }

    #[test]
    fn process_file_skips_unrecorded_aperture_on_other_lens() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0003.ARW");
        let mut tool = FakeMetadataTool::new();
        let mut meta = anamorphic_arw("24.0 mm");
        meta.f_number = FNumber::Missing;
        tool.insert(&source, meta);

        let outcome = process_file(
            &mut tool,
            &FakeConverter::new(),
            &MockBackend::new(),
            &source,
            &config(&dirs),
        )
        .unwrap();

        assert_eq!(
            outcome,
            FileOutcome::Skipped(SkipReason::NotAnamorphic(Rejection::FNumberMissing))
        );
    }

    #[test]
    fn process_file_keeps_source_with_unrecognized_aperture() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0004.ARW");
        let mut tool = FakeMetadataTool::new();
        let mut meta = anamorphic_arw("24.0 mm");
        meta.f_number = FNumber::Unrecognized("n/a".to_string());
        tool.insert(&source, meta);
        let converter = FakeConverter::new();

        let outcome = process_file(
            &mut tool,
            &converter,
            &MockBackend::new(),
            &source,
            &config(&dirs),
        )
        .unwrap();

        assert_eq!(
            outcome,
            FileOutcome::Skipped(SkipReason::NotAnamorphic(Rejection::FNumberUnrecognized(
                "n/a".to_string()
            )))
        );
        assert!(converter.converted().is_empty());
        assert!(source.exists());
    }

    #[test]
    fn process_file_desqueezes_anamorphic() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "DSC0001.ARW");
        let mut tool = FakeMetadataTool::new();
        tool.insert(&source, anamorphic_arw("0.0 mm"));
        let converter = FakeConverter::new();
        let backend = sensor_backend();

        let outcome =
            process_file(&mut tool, &converter, &backend, &source, &config(&dirs)).unwrap();

        assert_eq!(
            outcome,
            FileOutcome::Desqueezed {
                output: dirs.export.join("DSC0001.dng")
            }
        );
        assert!(
            tool.edits_for(&dirs.export.join("DSC0001.dng"))
                .contains(&TagEdit::FocalLength("35.0A mm".to_string()))
        );
    }

    #[test]
    fn process_file_propagates_metadata_failure() {
        let dirs = setup_dirs();
        let source = add_raw(&dirs, "broken.ARW");
        let mut tool = FakeMetadataTool::new();

        let result = process_file(
            &mut tool,
            &FakeConverter::new(),
            &MockBackend::new(),
            &source,
            &config(&dirs),
        );

        assert!(matches!(result, Err(ProcessError::Tool(_))));
        assert!(source.exists());
    }

    #[test]
    fn suffixed_keeps_extension() {
        assert_eq!(
            suffixed(Path::new("/out/a.dng"), "_preview.jpg"),
            PathBuf::from("/out/a.dng_preview.jpg")
        );
    }

    #[test]
    fn skip_reason_messages() {
        assert_eq!(
            SkipReason::NotRaw {
                file_type: "JPEG".to_string()
            }
            .to_string(),
            "not a raw file (JPEG)"
        );
    }
}
