//! Content-based duplicate detection.
//!
//! Finds groups of files with identical content across one or more
//! directory trees. Candidates are first bucketed by size (a file with a
//! unique size cannot have a duplicate, so it is never read), then the
//! remaining files are hashed in parallel. An optional paranoid mode
//! re-verifies each group byte by byte before reporting it.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::checksum::BLOCK_SIZE;
use crate::error::{CoreError, CoreResult};
use crate::scan::{self, FileRecord};

/// Options for a duplicate search.
#[derive(Debug, Clone, Copy, Default)]
pub struct DupeOptions {
    /// Re-compare group members byte by byte after hashing. Guards
    /// against the (astronomically unlikely) hash collision at the cost
    /// of reading every candidate twice.
    pub verify_bytes: bool,
}

/// One set of files sharing identical content.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    /// The file treated as the keeper: earliest modification time, ties
    /// broken by lexicographic path.
    pub original: FileRecord,
    /// The redundant copies, sorted by path.
    pub duplicates: Vec<FileRecord>,
    /// Content size shared by every member.
    pub size: u64,
    /// Content hash shared by every member.
    pub checksum: String,
}

impl DuplicateGroup {
    /// Bytes that deleting the duplicates would reclaim.
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.duplicates.len() as u64
    }
}

/// Search the given directories for files with identical content.
///
/// Directories are scanned recursively; every root is validated before
/// any file is read. Unreadable files are logged and left out rather
/// than failing the whole search. The result is deterministic: groups
/// are ordered by the original's path and members by path.
///
/// When the cancellation flag is set, files not yet hashed are dropped
/// from consideration and the groups completed so far are returned.
pub fn find(
    directories: &[PathBuf],
    options: DupeOptions,
    cancel: Option<&AtomicBool>,
) -> CoreResult<Vec<DuplicateGroup>> {
    let mut records: Vec<FileRecord> = Vec::new();
    for dir in directories {
        for record in scan::scan(dir, true)? {
            records.push(record);
        }
    }
    log::debug!("Scanned {} files across {} roots", records.len(), directories.len());

    // files with a unique size cannot have a duplicate
    let mut by_size: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    for record in records {
        by_size.entry(record.size).or_default().push(record);
    }
    let candidates: Vec<FileRecord> = by_size
        .into_values()
        .filter(|bucket| bucket.len() > 1)
        .flatten()
        .collect();
    log::debug!("{} candidates after size prefilter", candidates.len());

    let hashed: Vec<(FileRecord, String)> = candidates
        .into_par_iter()
        .filter_map(|record| {
            if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                return None;
            }
            match record.content_hash() {
                Ok(digest) => Some((record, digest)),
                Err(e) => {
                    log::warn!("Skipping unreadable file: {}", e);
                    None
                }
            }
        })
        .collect();

    if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
        log::info!("Duplicate search cancelled; reporting partial results");
    }

    let mut by_content: HashMap<(u64, String), Vec<FileRecord>> = HashMap::new();
    for (record, digest) in hashed {
        by_content
            .entry((record.size, digest))
            .or_default()
            .push(record);
    }

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for ((size, digest), members) in by_content {
        if members.len() < 2 {
            continue;
        }
        let verified = if options.verify_bytes {
            split_by_bytes(members)
        } else {
            vec![members]
        };
        for set in verified {
            if set.len() < 2 {
                continue;
            }
            groups.push(build_group(set, size, digest.clone()));
        }
    }

    groups.sort_by(|a, b| a.original.path.cmp(&b.original.path));
    Ok(groups)
}

/// Pick the original and order the rest.
fn build_group(mut members: Vec<FileRecord>, size: u64, checksum: String) -> DuplicateGroup {
    let original_idx = members
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| a.path.cmp(&b.path))
        })
        .map(|(i, _)| i)
        .unwrap_or(0);
    let original = members.swap_remove(original_idx);
    members.sort_by(|a, b| a.path.cmp(&b.path));
    DuplicateGroup {
        original,
        duplicates: members,
        size,
        checksum,
    }
}

/// Partition a hash group into classes of byte-identical files.
///
/// Hash groups are almost always already uniform; this exists for the
/// paranoid mode where a collision must not produce a false report.
fn split_by_bytes(members: Vec<FileRecord>) -> Vec<Vec<FileRecord>> {
    let mut classes: Vec<Vec<FileRecord>> = Vec::new();
    'outer: for member in members {
        for class in classes.iter_mut() {
            match files_identical(&class[0].path, &member.path) {
                Ok(true) => {
                    class.push(member);
                    continue 'outer;
                }
                Ok(false) => {}
                Err(e) => {
                    log::warn!("Byte verification failed: {}", e);
                    continue 'outer;
                }
            }
        }
        classes.push(vec![member]);
    }
    classes
}

/// Streamed byte-for-byte comparison of two files.
fn files_identical(a: &Path, b: &Path) -> CoreResult<bool> {
    let mut file_a = File::open(a).map_err(|e| CoreError::from_io(a.to_path_buf(), e))?;
    let mut file_b = File::open(b).map_err(|e| CoreError::from_io(b.to_path_buf(), e))?;
    let mut buf_a = vec![0u8; BLOCK_SIZE];
    let mut buf_b = vec![0u8; BLOCK_SIZE];

    loop {
        let read_a = read_full(&mut file_a, &mut buf_a)
            .map_err(|e| CoreError::from_io(a.to_path_buf(), e))?;
        let read_b = read_full(&mut file_b, &mut buf_b)
            .map_err(|e| CoreError::from_io(b.to_path_buf(), e))?;
        if read_a != read_b || buf_a[..read_a] != buf_b[..read_b] {
            return Ok(false);
        }
        if read_a == 0 {
            return Ok(true);
        }
    }
}

/// Fill as much of the buffer as the reader allows.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_identical_files_grouped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::write(root.join("b.txt"), "hello").unwrap();
        fs::write(root.join("c.txt"), "different").unwrap();

        let groups = find(&[root.to_path_buf()], DupeOptions::default(), None).unwrap();

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.size, 5);
        assert_eq!(group.duplicates.len(), 1);

        let mut paths = vec![group.original.path.clone(), group.duplicates[0].path.clone()];
        paths.sort();
        assert_eq!(paths, vec![root.join("a.txt"), root.join("b.txt")]);
    }

    #[test]
    fn test_same_size_different_content_not_grouped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), "aaaaa").unwrap();
        fs::write(root.join("b.txt"), "bbbbb").unwrap();

        let groups = find(&[root.to_path_buf()], DupeOptions::default(), None).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_unique_sizes_are_never_hashed_into_groups() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), "one").unwrap();
        fs::write(root.join("b.txt"), "four").unwrap();
        fs::write(root.join("c.txt"), "seven").unwrap();

        let groups = find(&[root.to_path_buf()], DupeOptions::default(), None).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_duplicates_found_across_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let dir_a = root.join("one");
        let dir_b = root.join("two");
        fs::create_dir_all(&dir_a).unwrap();
        fs::create_dir_all(&dir_b).unwrap();

        fs::write(dir_a.join("x.bin"), "same bytes").unwrap();
        fs::write(dir_b.join("y.bin"), "same bytes").unwrap();

        let groups = find(&[dir_a, dir_b], DupeOptions::default(), None).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].duplicates.len(), 1);
    }

    #[test]
    fn test_verify_bytes_confirms_groups() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), "payload").unwrap();
        fs::write(root.join("b.txt"), "payload").unwrap();

        let options = DupeOptions { verify_bytes: true };
        let groups = find(&[root.to_path_buf()], options, None).unwrap();
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_invalid_root_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let missing = temp_dir.path().join("nope");

        let result = find(&[missing], DupeOptions::default(), None);
        assert!(matches!(result, Err(CoreError::InvalidRoot(_))));
    }

    #[test]
    fn test_cancelled_search_returns_partial() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::write(root.join("b.txt"), "hello").unwrap();

        let cancel = AtomicBool::new(true);
        let groups = find(&[root.to_path_buf()], DupeOptions::default(), Some(&cancel)).unwrap();
        assert!(groups.is_empty());
    }

    #[test]
    fn test_group_ordering_is_deterministic() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("z1.txt"), "alpha").unwrap();
        fs::write(root.join("z2.txt"), "alpha").unwrap();
        fs::write(root.join("a1.txt"), "betaa").unwrap();
        fs::write(root.join("a2.txt"), "betaa").unwrap();

        let groups = find(&[root.to_path_buf()], DupeOptions::default(), None).unwrap();
        assert_eq!(groups.len(), 2);
        assert!(groups[0].original.path < groups[1].original.path);
    }

    #[test]
    fn test_wasted_bytes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), "0123456789").unwrap();
        fs::write(root.join("b.txt"), "0123456789").unwrap();
        fs::write(root.join("c.txt"), "0123456789").unwrap();

        let groups = find(&[root.to_path_buf()], DupeOptions::default(), None).unwrap();
        assert_eq!(groups[0].wasted_bytes(), 20);
    }
}
