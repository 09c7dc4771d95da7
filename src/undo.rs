//! Undo engine.
//!
//! Reverts previously logged moves and renames by replaying the action
//! log. Undo never rewrites history: each successful reversal appends a
//! compensating `UNDO_MOVE` or `UNDO_RENAME` record, so the log stays
//! append-only and a later reader can reconstruct the full sequence of
//! events.
//!
//! An action is eligible for undo only while no compensating record for
//! it exists, and only after the file at the recorded destination still
//! verifies: it must exist, match the recorded checksum, and the original
//! location must be free. Deletions are terminal and are reported as
//! skipped.

use std::fs;
use std::path::PathBuf;

use crate::action_log::{Action, ActionDraft, ActionKind, ActionLog};
use crate::checksum;
use crate::error::{CoreError, CoreResult};

/// How far back an undo request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoScope {
    /// Every action still eligible for undo.
    All,
    /// The N most recent eligible actions.
    Last(usize),
}

/// Behaviour knobs for [`UndoEngine::undo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UndoOptions {
    /// Stop at the first verification failure instead of continuing with
    /// the remaining actions.
    pub stop_on_error: bool,
}

/// Outcome of an undo run.
#[derive(Debug, Default)]
pub struct UndoSummary {
    /// Actions successfully reversed, most recent first.
    pub restored: Vec<Action>,
    /// Actions left alone, with the reason. The path is absent for
    /// shortfall entries (fewer eligible actions than requested).
    pub skipped: Vec<(Option<PathBuf>, String)>,
    /// Actions that failed verification or restoration.
    pub failed: Vec<(PathBuf, String)>,
}

impl UndoSummary {
    /// True when every attempted reversal succeeded.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.failed.is_empty()
    }
}

/// Replays the action log to revert moves and renames.
pub struct UndoEngine<'a> {
    log: &'a ActionLog,
}

impl<'a> UndoEngine<'a> {
    pub fn new(log: &'a ActionLog) -> Self {
        UndoEngine { log }
    }

    /// Actions that have not been compensated yet, oldest first.
    ///
    /// Replays the log from the start: forward actions accumulate, and
    /// each `UNDO_*` record cancels the most recent matching pending
    /// action. Deletions stay in the result so callers can report them.
    pub fn pending(&self) -> Vec<Action> {
        let mut pending: Vec<Action> = Vec::new();
        for action in self.log.snapshot() {
            match action.kind {
                ActionKind::Move | ActionKind::Rename | ActionKind::Delete => {
                    pending.push(action);
                }
                ActionKind::UndoMove | ActionKind::UndoRename => {
                    let forward = match action.kind {
                        ActionKind::UndoMove => ActionKind::Move,
                        _ => ActionKind::Rename,
                    };
                    // the undo record's source is the forward action's
                    // destination, and vice versa
                    let matched = pending.iter().rposition(|candidate| {
                        candidate.kind == forward
                            && candidate.dest_path.as_deref() == Some(action.source_path.as_path())
                            && action.dest_path.as_deref() == Some(candidate.source_path.as_path())
                    });
                    if let Some(pos) = matched {
                        pending.remove(pos);
                    } else {
                        log::warn!(
                            "Undo record #{} has no matching forward action",
                            action.id
                        );
                    }
                }
            }
        }
        pending
    }

    /// The reversible actions an undo with this scope would attempt, most
    /// recent first. No filesystem checks are made; verification happens
    /// at undo time.
    pub fn preview(&self, scope: UndoScope) -> Vec<Action> {
        let limit = match scope {
            UndoScope::All => usize::MAX,
            UndoScope::Last(n) => n,
        };
        self.pending()
            .into_iter()
            .rev()
            .filter(|a| a.kind.is_reversible())
            .take(limit)
            .collect()
    }

    /// Revert eligible actions, most recent first.
    ///
    /// Deletions encountered along the way are reported as skipped and do
    /// not count against a `Last(n)` budget. If fewer eligible actions
    /// exist than requested, the shortfall is reported as skipped rather
    /// than treated as an error.
    pub fn undo(&self, scope: UndoScope, options: UndoOptions) -> CoreResult<UndoSummary> {
        let mut summary = UndoSummary::default();
        let mut remaining = match scope {
            UndoScope::All => None,
            UndoScope::Last(n) => Some(n),
        };

        for action in self.pending().into_iter().rev() {
            if remaining == Some(0) {
                break;
            }

            if action.kind == ActionKind::Delete {
                summary.skipped.push((
                    Some(action.source_path.clone()),
                    "deletions cannot be undone".to_string(),
                ));
                continue;
            }

            if let Some(n) = remaining.as_mut() {
                *n -= 1;
            }

            match self.restore(&action) {
                Ok(()) => summary.restored.push(action),
                Err(e @ CoreError::Log { .. }) => return Err(e),
                Err(e) => {
                    log::warn!("Could not undo action #{}: {}", action.id, e);
                    let path = action
                        .dest_path
                        .clone()
                        .unwrap_or_else(|| action.source_path.clone());
                    summary.failed.push((path, e.to_string()));
                    if options.stop_on_error {
                        break;
                    }
                }
            }
        }

        if let Some(n) = remaining
            && n > 0
        {
            for _ in 0..n {
                summary
                    .skipped
                    .push((None, "no eligible action".to_string()));
            }
        }

        Ok(summary)
    }

    /// Verify and reverse one move or rename, then append the
    /// compensating record.
    fn restore(&self, action: &Action) -> CoreResult<()> {
        let undo_kind = action.kind.undo_kind().ok_or_else(|| {
            CoreError::VerificationFailed {
                path: action.source_path.clone(),
                reason: format!("{} actions cannot be reversed", action.kind),
            }
        })?;

        let dest = action.dest_path.as_ref().ok_or_else(|| {
            CoreError::VerificationFailed {
                path: action.source_path.clone(),
                reason: "action has no recorded destination".to_string(),
            }
        })?;

        if !dest.exists() {
            return Err(CoreError::VerificationFailed {
                path: dest.clone(),
                reason: "file is no longer at the recorded destination".to_string(),
            });
        }

        let mut restored_checksum = None;
        if let Some(expected) = &action.checksum {
            let actual = checksum::hash_file(dest)?;
            if actual != *expected {
                return Err(CoreError::VerificationFailed {
                    path: dest.clone(),
                    reason: "content changed since the action was recorded".to_string(),
                });
            }
            restored_checksum = Some(actual);
        }

        if action.source_path.exists() {
            return Err(CoreError::VerificationFailed {
                path: action.source_path.clone(),
                reason: "original location is occupied".to_string(),
            });
        }

        if let Some(parent) = action.source_path.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent)
                .map_err(|e| CoreError::from_io(parent.to_path_buf(), e))?;
        }

        fs::rename(dest, &action.source_path)
            .map_err(|e| CoreError::from_io(dest.clone(), e))?;
        log::info!(
            "Restored {} -> {}",
            dest.display(),
            action.source_path.display()
        );

        let size = fs::metadata(&action.source_path).map(|m| m.len()).ok();
        self.log.append(ActionDraft {
            kind: undo_kind,
            source_path: dest.clone(),
            dest_path: Some(action.source_path.clone()),
            size,
            checksum: restored_checksum,
        })?;

        Ok(())
    }
}
