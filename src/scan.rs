//! Import directory listing.
//!
//! Only regular files directly inside the import directory are candidates;
//! subdirectories are never descended into. Symlinks to files count as
//! files. The order is whatever the filesystem yields and callers must not
//! rely on it being sorted.
//!
//! Only a failure to read the directory itself is an error. An entry that
//! cannot be inspected (a dangling symlink, a file removed mid-listing) is
//! logged and left out, so one bad entry never holds up the rest.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Cannot list {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// List the regular files directly inside `dir`.
pub fn list_import_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(ScanError::Walk {
                    path: dir.to_path_buf(),
                    source,
                });
            }
            Err(err) => {
                warn!(file = ?err.path(), error = %err, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.sort();
        paths
    }

    #[test]
    fn lists_files_only() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("DSC0001.ARW"), b"raw").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"hi").unwrap();
        fs::create_dir(tmp.path().join("subdir")).unwrap();

        let files = sorted(list_import_files(tmp.path()).unwrap());
        assert_eq!(
            files,
            vec![tmp.path().join("DSC0001.ARW"), tmp.path().join("notes.txt")]
        );
    }

    #[test]
    fn does_not_recurse() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("2024").join("trip");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("DSC0002.ARW"), b"raw").unwrap();

        assert!(list_import_files(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(list_import_files(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_errors() {
        let tmp = TempDir::new().unwrap();
        let result = list_import_files(&tmp.path().join("gone"));
        assert!(matches!(result, Err(ScanError::Walk { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinked_files() {
        let tmp = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let target = elsewhere.path().join("DSC0003.ARW");
        fs::write(&target, b"raw").unwrap();
        std::os::unix::fs::symlink(&target, tmp.path().join("DSC0003.ARW")).unwrap();

        let files = list_import_files(tmp.path()).unwrap();
        assert_eq!(files, vec![tmp.path().join("DSC0003.ARW")]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("DSC0001.ARW"), b"raw").unwrap();
        std::os::unix::fs::symlink("/nonexistent/DSC9999.ARW", tmp.path().join("stale.ARW"))
            .unwrap();

        let files = list_import_files(tmp.path()).unwrap();
        assert_eq!(files, vec![tmp.path().join("DSC0001.ARW")]);
    }
}
