//! High-level organizing operations.
//!
//! Each operation scans a directory, plans a batch of file operations
//! and hands the whole batch to the executor. Planning never mutates
//! anything, so dry-run costs nothing beyond the scan.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::{Duration, SystemTime};

use chrono::Local;
use regex::Regex;

use crate::action_log::ActionLog;
use crate::classify::{self, Classifier};
use crate::config::CompiledFilters;
use crate::error::{CoreError, CoreResult};
use crate::executor::{ExecutionSummary, Executor, FileOp, OverwritePolicy};
use crate::scan;

/// What a sort run groups files by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCriteria {
    /// Category derived from the extension (`images`, `documents`, ...).
    Type,
    /// Size bucket (`tiny`, `small`, `medium`, `large`).
    Size,
    /// Age bucket (`today`, `this_week`, ..., `older`).
    Date,
}

/// Filename suffixes considered temporary.
const TEMP_EXTENSIONS: [&str; 6] = ["tmp", "temp", "swp", "bak", "old", "cache"];

/// True for editor and system leftovers: `~$` prefixed names and the
/// usual scratch extensions.
pub fn is_temp_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.starts_with("~$") {
        return true;
    }
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| TEMP_EXTENSIONS.contains(&ext.as_str()))
}

/// Plans and runs organizing operations over one directory at a time.
pub struct Organizer<'a> {
    executor: Executor<'a>,
    classifier: Classifier,
    filters: Option<CompiledFilters>,
}

impl<'a> Organizer<'a> {
    pub fn new(
        log: &'a ActionLog,
        policy: OverwritePolicy,
        classifier: Classifier,
        filters: Option<CompiledFilters>,
    ) -> Self {
        Organizer {
            executor: Executor::new(log, policy),
            classifier,
            filters,
        }
    }

    /// Move every file under `dir` into a bucket subdirectory of `dir`
    /// chosen by `criteria`. Files already sitting in their bucket are
    /// left alone, so running a sort twice is a no-op.
    pub fn sort_files(
        &self,
        dir: &Path,
        criteria: SortCriteria,
        recursive: bool,
        dry_run: bool,
        cancel: Option<&AtomicBool>,
    ) -> CoreResult<ExecutionSummary> {
        // one timestamp anchors every age bucket in the run
        let now = Local::now();
        let mut ops = Vec::new();

        for record in scan::scan_filtered(dir, recursive, self.filters.clone())? {
            let bucket = match criteria {
                SortCriteria::Type => self.classifier.classify(&record).dir_name(),
                SortCriteria::Size => classify::size_bucket(record.size).dir_name(),
                SortCriteria::Date => classify::date_bucket(record.modified, now).dir_name(),
            };
            let target_dir = dir.join(bucket);
            if record.path.parent() == Some(target_dir.as_path()) {
                continue;
            }
            let Some(name) = record.path.file_name() else {
                continue;
            };
            ops.push(FileOp::Move {
                dest: target_dir.join(name),
                src: record.path,
            });
        }

        log::info!("Sorting {} file(s) in {}", ops.len(), dir.display());
        self.executor.apply_batch(dir, &ops, dry_run, cancel)
    }

    /// Rename files whose name matches `pattern`, substituting
    /// `replacement` (with `$1`-style capture references). Names the
    /// pattern leaves unchanged are not touched.
    pub fn rename_batch(
        &self,
        dir: &Path,
        pattern: &str,
        replacement: &str,
        recursive: bool,
        dry_run: bool,
        cancel: Option<&AtomicBool>,
    ) -> CoreResult<ExecutionSummary> {
        let regex = Regex::new(pattern).map_err(|e| CoreError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let mut ops = Vec::new();
        for record in scan::scan_filtered(dir, recursive, self.filters.clone())? {
            let Some(name) = record.path.file_name().map(|n| n.to_string_lossy().to_string())
            else {
                continue;
            };
            let new_name = regex.replace_all(&name, replacement);
            if new_name == name {
                continue;
            }
            let parent = record
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            ops.push(FileOp::Rename {
                dest: parent.join(new_name.as_ref()),
                src: record.path,
            });
        }

        log::info!("Renaming {} file(s) in {}", ops.len(), dir.display());
        self.executor.apply_batch(dir, &ops, dry_run, cancel)
    }

    /// Move files into destination directories chosen by pattern rules.
    /// Rules are tried in order and the first pattern matching the file
    /// name wins. Relative destinations are resolved against `dir`.
    pub fn move_by_rules(
        &self,
        dir: &Path,
        rules: &[(String, String)],
        recursive: bool,
        dry_run: bool,
        cancel: Option<&AtomicBool>,
    ) -> CoreResult<ExecutionSummary> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (pattern, dest) in rules {
            let regex = Regex::new(pattern).map_err(|e| CoreError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            let target = if Path::new(dest).is_absolute() {
                PathBuf::from(dest)
            } else {
                dir.join(dest)
            };
            compiled.push((regex, target));
        }

        let mut ops = Vec::new();
        for record in scan::scan_filtered(dir, recursive, self.filters.clone())? {
            let Some(name) = record.path.file_name().map(|n| n.to_string_lossy().to_string())
            else {
                continue;
            };
            let Some((_, target)) = compiled.iter().find(|(regex, _)| regex.is_match(&name))
            else {
                continue;
            };
            if record.path.parent() == Some(target.as_path()) {
                continue;
            }
            ops.push(FileOp::Move {
                dest: target.join(&name),
                src: record.path,
            });
        }

        log::info!("Moving {} file(s) by rule in {}", ops.len(), dir.display());
        self.executor.apply_batch(dir, &ops, dry_run, cancel)
    }

    /// Delete editor and system scratch files.
    pub fn clean_temp_files(
        &self,
        dir: &Path,
        recursive: bool,
        dry_run: bool,
        cancel: Option<&AtomicBool>,
    ) -> CoreResult<ExecutionSummary> {
        let mut ops = Vec::new();
        for record in scan::scan_filtered(dir, recursive, self.filters.clone())? {
            if is_temp_file(&record.path) {
                ops.push(FileOp::Delete { src: record.path });
            }
        }

        log::info!("Deleting {} temp file(s) in {}", ops.len(), dir.display());
        self.executor.apply_batch(dir, &ops, dry_run, cancel)
    }

    /// Delete files not modified within the last `older_than_days` days.
    pub fn clean_old_files(
        &self,
        dir: &Path,
        older_than_days: u64,
        recursive: bool,
        dry_run: bool,
        cancel: Option<&AtomicBool>,
    ) -> CoreResult<ExecutionSummary> {
        // an age too large to represent predates every file
        let cutoff = older_than_days
            .checked_mul(86_400)
            .map(Duration::from_secs)
            .and_then(|age| SystemTime::now().checked_sub(age));

        let mut ops = Vec::new();
        if let Some(cutoff) = cutoff {
            for record in scan::scan_filtered(dir, recursive, self.filters.clone())? {
                if record.modified < cutoff {
                    ops.push(FileOp::Delete { src: record.path });
                }
            }
        }

        log::info!("Deleting {} old file(s) in {}", ops.len(), dir.display());
        self.executor.apply_batch(dir, &ops, dry_run, cancel)
    }

}
