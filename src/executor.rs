//! File-operation executor.
//!
//! Performs move, rename and delete operations, appending one action to
//! the log per successful mutation. Dry-run simulates the full decision
//! path (including conflict policy) without touching the filesystem or
//! the log.
//!
//! Batch processing never aborts on a per-file failure: each outcome is
//! captured into the [`ExecutionSummary`]. Only a structurally invalid
//! root stops a batch before anything is mutated.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::action_log::{ActionDraft, ActionKind, ActionLog};
use crate::checksum;
use crate::error::{CoreError, CoreResult};

/// Conflict policy when a destination already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    /// Leave the source alone and report the file as skipped. The safe
    /// default.
    #[default]
    Skip,
    /// Pick a free name by appending `_1`, `_2`, ... before the
    /// extension.
    RenameWithSuffix,
    /// Replace the existing destination.
    Overwrite,
}

/// A single requested file operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOp {
    Move { src: PathBuf, dest: PathBuf },
    Rename { src: PathBuf, dest: PathBuf },
    Delete { src: PathBuf },
}

impl FileOp {
    /// The path being operated on.
    pub fn src(&self) -> &Path {
        match self {
            FileOp::Move { src, .. } | FileOp::Rename { src, .. } | FileOp::Delete { src } => src,
        }
    }

    fn kind(&self) -> ActionKind {
        match self {
            FileOp::Move { .. } => ActionKind::Move,
            FileOp::Rename { .. } => ActionKind::Rename,
            FileOp::Delete { .. } => ActionKind::Delete,
        }
    }
}

/// The applied (or simulated) effect of one operation, with the final
/// destination after conflict resolution.
#[derive(Debug, Clone)]
pub struct Effect {
    pub kind: ActionKind,
    pub source: PathBuf,
    pub dest: Option<PathBuf>,
}

/// Aggregated outcome of a batch.
#[derive(Debug, Default)]
pub struct ExecutionSummary {
    /// Whether this batch was simulated.
    pub dry_run: bool,
    /// Effects applied, or that would be applied under dry-run.
    pub effects: Vec<Effect>,
    /// Files left alone, with the reason (conflict under skip,
    /// cancellation).
    pub skipped: Vec<(PathBuf, String)>,
    /// Files whose operation failed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl ExecutionSummary {
    pub fn succeeded(&self) -> usize {
        self.effects.len()
    }

    /// True when nothing was skipped or failed.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Executes operations against the filesystem and records them.
///
/// Holds a borrowed log handle; no ambient state. The overwrite policy
/// is fixed at construction.
pub struct Executor<'a> {
    log: &'a ActionLog,
    policy: OverwritePolicy,
}

impl<'a> Executor<'a> {
    pub fn new(log: &'a ActionLog, policy: OverwritePolicy) -> Self {
        Executor { log, policy }
    }

    /// Apply a batch of operations.
    ///
    /// `root` is validated up front; a missing or non-directory root
    /// aborts before any mutation. Per-file failures are captured and the
    /// batch continues. The cancellation flag is checked between files;
    /// once set, remaining operations are reported as skipped.
    pub fn apply_batch(
        &self,
        root: &Path,
        ops: &[FileOp],
        dry_run: bool,
        cancel: Option<&AtomicBool>,
    ) -> CoreResult<ExecutionSummary> {
        if !root.is_dir() {
            return Err(CoreError::InvalidRoot(root.to_path_buf()));
        }

        let mut summary = ExecutionSummary {
            dry_run,
            ..Default::default()
        };

        for op in ops {
            if cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
                log::info!("Batch cancelled; leaving remaining files untouched");
                summary
                    .skipped
                    .push((op.src().to_path_buf(), "cancelled".to_string()));
                continue;
            }

            match self.apply_one(op, dry_run) {
                Ok(effect) => summary.effects.push(effect),
                Err(CoreError::Conflict { source, dest }) => {
                    summary.skipped.push((
                        source,
                        format!("destination {} already exists", dest.display()),
                    ));
                }
                Err(e) => {
                    log::warn!("Operation failed for {}: {}", op.src().display(), e);
                    summary.failed.push((op.src().to_path_buf(), e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// Apply one operation. On a real run the mutation happens first and
    /// the log append only follows success; dry-run performs neither.
    fn apply_one(&self, op: &FileOp, dry_run: bool) -> CoreResult<Effect> {
        let src = op.src();
        if !src.exists() {
            return Err(CoreError::NotFound(src.to_path_buf()));
        }

        match op {
            FileOp::Delete { src } => {
                if !dry_run {
                    fs::remove_file(src).map_err(|e| CoreError::from_io(src.clone(), e))?;
                    self.log.append(ActionDraft {
                        kind: ActionKind::Delete,
                        source_path: src.clone(),
                        dest_path: None,
                        size: None,
                        checksum: None,
                    })?;
                    log::info!("Deleted {}", src.display());
                }
                Ok(Effect {
                    kind: ActionKind::Delete,
                    source: src.clone(),
                    dest: None,
                })
            }
            FileOp::Move { src, dest } | FileOp::Rename { src, dest } => {
                let final_dest = self.resolve_conflict(src, dest)?;

                if dry_run {
                    return Ok(Effect {
                        kind: op.kind(),
                        source: src.clone(),
                        dest: Some(final_dest),
                    });
                }

                if let Some(parent) = final_dest.parent()
                    && !parent.exists()
                {
                    fs::create_dir_all(parent)
                        .map_err(|e| CoreError::from_io(parent.to_path_buf(), e))?;
                }

                fs::rename(src, &final_dest).map_err(|e| CoreError::from_io(src.clone(), e))?;
                log::info!("Moved {} -> {}", src.display(), final_dest.display());

                let size = fs::metadata(&final_dest).map(|m| m.len()).ok();
                let checksum = match checksum::hash_file(&final_dest) {
                    Ok(digest) => Some(digest),
                    Err(e) => {
                        log::warn!("Could not checksum {}: {}", final_dest.display(), e);
                        None
                    }
                };

                self.log.append(ActionDraft {
                    kind: op.kind(),
                    source_path: src.clone(),
                    dest_path: Some(final_dest.clone()),
                    size,
                    checksum,
                })?;

                Ok(Effect {
                    kind: op.kind(),
                    source: src.clone(),
                    dest: Some(final_dest),
                })
            }
        }
    }

    /// Decide the final destination under the configured policy.
    fn resolve_conflict(&self, src: &Path, dest: &Path) -> CoreResult<PathBuf> {
        if !dest.exists() {
            return Ok(dest.to_path_buf());
        }
        match self.policy {
            OverwritePolicy::Skip => Err(CoreError::Conflict {
                source: src.to_path_buf(),
                dest: dest.to_path_buf(),
            }),
            OverwritePolicy::Overwrite => Ok(dest.to_path_buf()),
            OverwritePolicy::RenameWithSuffix => Ok(next_free_name(dest)),
        }
    }
}

/// First free `stem_N.ext` name, N starting at 1, unpadded.
fn next_free_name(dest: &Path) -> PathBuf {
    let stem = dest
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = dest.extension().map(|e| e.to_string_lossy().to_string());
    let parent = dest.parent().unwrap_or_else(|| Path::new(""));

    let mut counter = 1u32;
    loop {
        let name = match &ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = parent.join(name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
