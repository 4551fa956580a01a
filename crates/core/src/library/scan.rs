use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::engine::is_temp_output_name;

/// Video file extensions considered for compression (compared lower-cased).
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "m4v", "wmv"];

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Cannot read directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Whether the path has a video extension and is not one of our temp outputs.
pub fn is_video_file(path: &Path) -> bool {
    let is_video = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.as_str()));

    let is_temp = path
        .file_name()
        .is_some_and(|n| is_temp_output_name(&n.to_string_lossy()));

    is_video && !is_temp
}

/// Recursively lists video files under `dir`, sorted by file name.
///
/// A missing directory yields an empty list. A directory that exists but
/// cannot be read at its root is an error; unreadable entries below the root
/// are logged and skipped.
pub fn find_video_files(dir: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    if !dir.exists() {
        warn!(dir = %dir.display(), "Directory does not exist");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(LibraryError::Unreadable {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                warn!(error = %e, "Error reading directory entry");
                continue;
            }
        };

        let path = entry.path();
        if path.is_file() && is_video_file(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
    info!(dir = %dir.display(), count = files.len(), "Found video files");
    Ok(files)
}

/// Finds the library file named exactly `file_name`.
///
/// Roots are searched in order and the first hit wins. Within a root the
/// walk is sorted, so the result is stable across runs.
pub fn find_matching_media(file_name: &OsStr, roots: &[PathBuf]) -> Option<PathBuf> {
    for root in roots {
        if !root.exists() {
            debug!(root = %root.display(), "Library root does not exist");
            continue;
        }

        let found = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!(error = %e, "Error reading directory entry");
                    None
                }
            })
            .find(|e| e.file_name() == file_name && e.path().is_file());

        if let Some(entry) = found {
            return Some(entry.into_path());
        }
    }
    None
}
