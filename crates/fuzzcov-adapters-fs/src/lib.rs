//! Filesystem run source adapter.
//!
//! Expands the paths given on the command line into the list of JSON record
//! files to load. Files are taken as-is when their extension is `json`
//! (any case); directories are walked recursively in file-name order so the
//! result does not depend on the platform's directory listing order.
//! Symlinked files and directories are followed; a link cycle is a walk error.

use std::path::{Path, PathBuf};

use fuzzcov_ports::RunSource;
use thiserror::Error;
use walkdir::WalkDir;

/// Errors that can occur while locating or reading record files.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The path is neither a file nor a directory.
    #[error("Input path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// A directory could not be walked.
    #[error("Failed to walk '{}': {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A record file could not be read.
    #[error("Failed to read file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Returns `true` when `path` has a `.json` extension, ignoring case.
pub fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Check that every path exists, without opening anything.
pub fn ensure_paths_exist(paths: &[PathBuf]) -> Result<(), SourceError> {
    match paths.iter().find(|path| !(path.is_file() || path.is_dir())) {
        Some(missing) => Err(SourceError::PathNotFound(missing.clone())),
        None => Ok(()),
    }
}

/// Resolve files and directories into JSON record files, in argument order.
pub fn discover_json_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, SourceError> {
    let mut found = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_json_file(path) {
                found.push(path.clone());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
                let entry = entry.map_err(|source| SourceError::Walk {
                    path: path.clone(),
                    source,
                })?;
                if entry.file_type().is_file() && is_json_file(entry.path()) {
                    found.push(entry.into_path());
                }
            }
        } else {
            return Err(SourceError::PathNotFound(path.clone()));
        }
    }

    Ok(found)
}

/// Filesystem-backed [`RunSource`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRunSource;

impl FsRunSource {
    pub fn new() -> Self {
        Self
    }
}

impl RunSource for FsRunSource {
    fn resolve(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>, String> {
        discover_json_files(paths).map_err(|e| e.to_string())
    }

    fn read(&self, path: &Path) -> Result<String, String> {
        std::fs::read_to_string(path)
            .map_err(|source| SourceError::Read {
                path: path.to_path_buf(),
                source,
            })
            .map_err(|e| e.to_string())
    }
}
