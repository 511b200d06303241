//! CLI output formatting.
//!
//! Files are listed by name with details as indented context lines, grouped
//! by what happened to them.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Desqueezed
//! 001 DSC00041.ARW → DSC00041.dng
//!
//! Skipped
//! 001 DSC00042.ARW
//!     Reason: not anamorphic: focal length 35 mm is not an adapter focal length
//!
//! Failed
//! 001 DSC00043.ARW
//!     Error: External tool failed: dnglab exited with exit status: 1: ...
//!
//! Checked 3 files: 1 desqueezed, 1 skipped, 1 failed
//! ```
//!
//! ## Check
//!
//! ```text
//! DSC00041.ARW
//!     Type: ARW
//!     Focal length: 0.0 mm
//!     Aperture: undef
//!     Verdict: desqueeze, FocalLength → 35.0A mm
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::daemon::ScanReport;
use crate::metadata::ImageMetadata;
use crate::process::Verdict;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// scan
// ============================================================================

pub fn format_scan_report(report: &ScanReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.desqueezed.is_empty() {
        lines.push("Desqueezed".to_string());
        for (i, (source, output)) in report.desqueezed.iter().enumerate() {
            lines.push(format!(
                "{} {} → {}",
                format_index(i + 1),
                file_name(source),
                file_name(output)
            ));
        }
        lines.push(String::new());
    }

    if !report.skipped.is_empty() {
        lines.push("Skipped".to_string());
        for (i, (source, reason)) in report.skipped.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), file_name(source)));
            lines.push(format!("{}Reason: {}", indent(1), reason));
        }
        lines.push(String::new());
    }

    if !report.failed.is_empty() {
        lines.push("Failed".to_string());
        for (i, (source, error)) in report.failed.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), file_name(source)));
            lines.push(format!("{}Error: {}", indent(1), error));
        }
        lines.push(String::new());
    }

    lines.push(format!(
        "Checked {}: {} desqueezed, {} skipped, {} failed",
        plural(report.total(), "file"),
        report.desqueezed.len(),
        report.skipped.len(),
        report.failed.len()
    ));
    lines
}

pub fn print_scan_report(report: &ScanReport) {
    for line in format_scan_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

pub fn format_check(path: &Path, metadata: &ImageMetadata, verdict: &Verdict) -> Vec<String> {
    let verdict_line = match verdict {
        Verdict::Desqueeze {
            focal_length_override: Some(focal_length),
        } => format!("desqueeze, FocalLength → {focal_length}"),
        Verdict::Desqueeze {
            focal_length_override: None,
        } => "desqueeze".to_string(),
        Verdict::Skip(reason) => format!("skip, {reason}"),
    };

    vec![
        file_name(path),
        format!("{}Type: {}", indent(1), metadata.file_type),
        format!(
            "{}Focal length: {}",
            indent(1),
            metadata.focal_length.as_deref().unwrap_or("none")
        ),
        format!("{}Aperture: {}", indent(1), metadata.f_number),
        format!("{}Verdict: {}", indent(1), verdict_line),
    ]
}

pub fn print_check(path: &Path, metadata: &ImageMetadata, verdict: &Verdict) {
    for line in format_check(path, metadata, verdict) {
        println!("{}", line);
    }
}
