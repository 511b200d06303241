//! Scan loop.
//!
//! One scan lists the import directory and runs every file through
//! [`process_file`], strictly one after another. Per-file failures are
//! logged and recorded in the [`ScanReport`]; they never stop the scan or
//! the loop. A failed file stays in the import directory and is retried on
//! the next scan.
//!
//! [`Daemon::run`] scans immediately, then sleeps for the configured interval
//! after each scan has finished, so scans never overlap and a slow scan
//! pushes the next one back.

use crate::config::DaemonConfig;
use crate::imaging::{ImageBackend, RustBackend};
use crate::process::{FileOutcome, ProcessConfig, ProcessError, SkipReason, process_file};
use crate::scan::{ScanError, list_import_files};
use crate::tools::{DngConverter, Exiftool, MetadataTool, RawConverter, ToolError};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

/// Result of one pass over the import directory.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// `(source, finished DNG)`
    pub desqueezed: Vec<(PathBuf, PathBuf)>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    pub failed: Vec<(PathBuf, ProcessError)>,
}

impl ScanReport {
    pub fn total(&self) -> usize {
        self.desqueezed.len() + self.skipped.len() + self.failed.len()
    }
}

pub struct Daemon<M, C, B> {
    tool: M,
    converter: C,
    backend: B,
    import_dir: PathBuf,
    interval: Duration,
    config: ProcessConfig,
}

impl Daemon<Exiftool, DngConverter, RustBackend> {
    /// Wire up the real external tools named in `config`.
    pub fn from_config(config: &DaemonConfig) -> Result<Self, DaemonError> {
        let tool = Exiftool::new(&config.tools.exiftool)?;
        let converter = DngConverter::new(&config.tools.dnglab, &config.tools.magick);
        Ok(Self::new(
            tool,
            converter,
            RustBackend::new(),
            config.paths.import.clone(),
            config.interval(),
            ProcessConfig::from_daemon_config(config),
        ))
    }
}

impl<M, C, B> Daemon<M, C, B>
where
    M: MetadataTool,
    C: RawConverter,
    B: ImageBackend,
{
    pub fn new(
        tool: M,
        converter: C,
        backend: B,
        import_dir: PathBuf,
        interval: Duration,
        config: ProcessConfig,
    ) -> Self {
        Self {
            tool,
            converter,
            backend,
            import_dir,
            interval,
            config,
        }
    }

    /// Process every file currently in the import directory.
    ///
    /// Fails only when the directory itself cannot be listed.
    pub fn run_once(&mut self) -> Result<ScanReport, DaemonError> {
        info!(import = %self.import_dir.display(), "Checking files");
        let files = list_import_files(&self.import_dir)?;

        let mut report = ScanReport::default();
        for source in files {
            info!(file = %source.display(), "Checking file");
            match process_file(
                &mut self.tool,
                &self.converter,
                &self.backend,
                &source,
                &self.config,
            ) {
                Ok(FileOutcome::Desqueezed { output }) => report.desqueezed.push((source, output)),
                Ok(FileOutcome::Skipped(reason)) => report.skipped.push((source, reason)),
                Err(e) => {
                    error!(file = %source.display(), error = %e, "Failed to process file");
                    report.failed.push((source, e));
                }
            }
        }

        info!(
            import = %self.import_dir.display(),
            desqueezed = report.desqueezed.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Checking files done"
        );
        Ok(report)
    }

    /// Scan now, then once per interval. Runs forever when `max_scans` is
    /// `None`.
    pub fn run(&mut self, max_scans: Option<usize>) {
        let mut scans = 0;
        loop {
            if let Err(e) = self.run_once() {
                error!(import = %self.import_dir.display(), error = %e, "Scan failed");
            }
            scans += 1;
            if max_scans.is_some_and(|max| scans >= max) {
                return;
            }
            debug!(seconds = self.interval.as_secs(), "Waiting for next scan");
            thread::sleep(self.interval);
        }
    }
}
