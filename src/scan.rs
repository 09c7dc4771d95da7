//! Directory scanning.
//!
//! `scan` walks a directory tree lazily and yields one [`FileRecord`] per
//! regular file. Records are ephemeral: they describe a file at the
//! moment it was visited and are discarded after use. Each call produces
//! a fresh walk; there is no mid-walk resumption.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::config::CompiledFilters;
use crate::error::{CoreError, CoreResult};

/// Metadata for one scanned file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Full path to the file.
    pub path: PathBuf,
    /// Size in bytes at scan time.
    pub size: u64,
    /// Modification timestamp at scan time.
    pub modified: SystemTime,
    /// Lower-cased extension without the dot, if any.
    pub extension: Option<String>,
}

impl FileRecord {
    /// Build a record from a path and its metadata.
    fn from_metadata(path: PathBuf, meta: &std::fs::Metadata) -> Self {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        FileRecord {
            size: meta.len(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            extension,
            path,
        }
    }

    /// Compute the content hash of this file on demand.
    ///
    /// Not cached: records are short-lived and most callers never need
    /// the hash.
    pub fn content_hash(&self) -> CoreResult<String> {
        crate::checksum::hash_file(&self.path)
    }
}

/// Lazy iterator over the files under a root directory.
pub struct Scan {
    walker: walkdir::IntoIter,
    filters: Option<CompiledFilters>,
}

impl Iterator for Scan {
    type Item = FileRecord;

    fn next(&mut self) -> Option<FileRecord> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(ref filters) = self.filters
                && !filters.should_include(entry.path())
            {
                log::debug!("Filtered out: {}", entry.path().display());
                continue;
            }
            match entry.metadata() {
                Ok(meta) => {
                    return Some(FileRecord::from_metadata(entry.path().to_path_buf(), &meta));
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            }
        }
    }
}

/// Walk `root` and yield a record per regular file.
///
/// With `recursive` false only the immediate children are visited.
/// Returns [`CoreError::InvalidRoot`] if `root` is missing or not a
/// directory; per-entry read failures are logged and skipped.
pub fn scan(root: &Path, recursive: bool) -> CoreResult<Scan> {
    scan_filtered(root, recursive, None)
}

/// Like [`scan`], applying compiled exclusion filters per entry.
pub fn scan_filtered(
    root: &Path,
    recursive: bool,
    filters: Option<CompiledFilters>,
) -> CoreResult<Scan> {
    if !root.is_dir() {
        return Err(CoreError::InvalidRoot(root.to_path_buf()));
    }

    let mut walker = WalkDir::new(root).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    Ok(Scan {
        walker: walker.into_iter(),
        filters,
    })
}
