//! Durable, append-only journal of applied filesystem actions.
//!
//! Every mutation the executor performs, and every reversal the undo
//! engine performs, becomes one [`Action`] record. The log is never
//! edited or truncated: undo appends compensating records rather than
//! rewriting history, so the file is a complete audit trail.
//!
//! On disk the log is JSON Lines, one record per line. An append writes,
//! flushes and fsyncs the full line before returning, so a crash right
//! after `append` never leaves a partially observable record; a crash
//! *during* an append can at worst leave a torn final line, which is
//! ignored when the log is reopened.
//!
//! All appends funnel through a single mutex-guarded writer. The log is
//! owned by the process performing mutations; concurrent external
//! writers are out of scope.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The kind of a logged action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Move,
    Rename,
    Delete,
    UndoMove,
    UndoRename,
}

impl ActionKind {
    /// Whether an action of this kind can be reversed. Deletes are
    /// terminal, and compensating records are themselves not reversible.
    pub fn is_reversible(&self) -> bool {
        matches!(self, ActionKind::Move | ActionKind::Rename)
    }

    /// The compensating kind appended when an action is undone.
    pub fn undo_kind(&self) -> Option<ActionKind> {
        match self {
            ActionKind::Move => Some(ActionKind::UndoMove),
            ActionKind::Rename => Some(ActionKind::UndoRename),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::Move => "MOVE",
            ActionKind::Rename => "RENAME",
            ActionKind::Delete => "DELETE",
            ActionKind::UndoMove => "UNDO_MOVE",
            ActionKind::UndoRename => "UNDO_RENAME",
        };
        write!(f, "{}", name)
    }
}

/// One immutable, persisted record of an applied mutation or reversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Strictly increasing over the lifetime of the log.
    pub id: u64,
    /// When the action was recorded (ISO-8601 in the file).
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub source_path: PathBuf,
    /// None for DELETE.
    pub dest_path: Option<PathBuf>,
    /// Size at apply time; None for DELETE (content is gone).
    pub size: Option<u64>,
    /// Content checksum at apply time; None for DELETE.
    pub checksum: Option<String>,
}

/// An action awaiting an id and timestamp, handed to [`ActionLog::append`].
#[derive(Debug, Clone)]
pub struct ActionDraft {
    pub kind: ActionKind,
    pub source_path: PathBuf,
    pub dest_path: Option<PathBuf>,
    pub size: Option<u64>,
    pub checksum: Option<String>,
}

struct Inner {
    file: File,
    actions: Vec<Action>,
    next_id: u64,
}

/// Handle to the on-disk journal. Constructed once and passed to the
/// executor and undo engine; appends are serialized internally.
pub struct ActionLog {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl ActionLog {
    /// Open (or create) the log at `path`, replaying existing records.
    ///
    /// Interior lines that fail to parse are an error; a final line that
    /// fails to parse is treated as torn by a crash and dropped.
    pub fn open(path: &Path) -> CoreResult<ActionLog> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::Log {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(CoreError::Log {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let mut actions: Vec<Action> = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            match serde_json::from_str::<Action>(line) {
                Ok(action) => {
                    if let Some(last) = actions.last()
                        && action.id <= last.id
                    {
                        return Err(CoreError::LogFormat {
                            path: path.to_path_buf(),
                            reason: format!(
                                "ids not strictly increasing (record {} after {})",
                                action.id, last.id
                            ),
                        });
                    }
                    actions.push(action);
                }
                Err(e) if idx == lines.len() - 1 => {
                    // Torn final line from an interrupted append.
                    log::warn!(
                        "Dropping torn trailing record in {}: {}",
                        path.display(),
                        e
                    );
                }
                Err(e) => {
                    return Err(CoreError::LogFormat {
                        path: path.to_path_buf(),
                        reason: format!("line {}: {}", idx + 1, e),
                    });
                }
            }
        }

        let next_id = actions.last().map_or(1, |a| a.id + 1);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| CoreError::Log {
                path: path.to_path_buf(),
                source: e,
            })?;

        log::debug!(
            "Opened action log {} ({} records, next id {})",
            path.display(),
            actions.len(),
            next_id
        );

        Ok(ActionLog {
            path: path.to_path_buf(),
            inner: Mutex::new(Inner {
                file,
                actions,
                next_id,
            }),
        })
    }

    /// The on-disk location of this log.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Assign the next id, persist the record durably, and return it.
    ///
    /// The record is fully flushed and fsynced before this returns.
    pub fn append(&self, draft: ActionDraft) -> CoreResult<Action> {
        let mut inner = self.lock();

        let action = Action {
            id: inner.next_id,
            timestamp: Utc::now(),
            kind: draft.kind,
            source_path: draft.source_path,
            dest_path: draft.dest_path,
            size: draft.size,
            checksum: draft.checksum,
        };

        let mut line = serde_json::to_string(&action).map_err(|e| CoreError::LogFormat {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        line.push('\n');

        inner
            .file
            .write_all(line.as_bytes())
            .and_then(|_| inner.file.flush())
            .and_then(|_| inner.file.sync_all())
            .map_err(|e| CoreError::Log {
                path: self.path.clone(),
                source: e,
            })?;

        log::info!(
            "Logged action #{} {} {}",
            action.id,
            action.kind,
            action.source_path.display()
        );

        inner.next_id += 1;
        inner.actions.push(action.clone());
        Ok(action)
    }

    /// Recorded actions, most recent first. `limit` caps the count;
    /// `None` returns all.
    pub fn history(&self, limit: Option<usize>) -> Vec<Action> {
        let inner = self.lock();
        let take = limit.unwrap_or(inner.actions.len());
        inner.actions.iter().rev().take(take).cloned().collect()
    }

    /// Look up a single action by id.
    pub fn get(&self, id: u64) -> Option<Action> {
        let inner = self.lock();
        inner
            .actions
            .binary_search_by_key(&id, |a| a.id)
            .ok()
            .map(|idx| inner.actions[idx].clone())
    }

    /// All recorded actions, oldest first. Used by the undo engine to
    /// replay the log and match compensating entries.
    pub fn snapshot(&self) -> Vec<Action> {
        self.lock().actions.clone()
    }

    /// Number of recorded actions.
    pub fn len(&self) -> usize {
        self.lock().actions.len()
    }

    /// True when no actions have been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means another thread panicked mid-append;
        // the in-memory vec is still consistent with what was synced.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn draft(kind: ActionKind, src: &str, dest: Option<&str>) -> ActionDraft {
        ActionDraft {
            kind,
            source_path: PathBuf::from(src),
            dest_path: dest.map(PathBuf::from),
            size: Some(5),
            checksum: Some("abc".to_string()),
        }
    }

    #[test]
    fn test_append_assigns_increasing_ids() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = ActionLog::open(&temp_dir.path().join("actions.log")).unwrap();

        let a = log.append(draft(ActionKind::Move, "/a", Some("/b"))).unwrap();
        let b = log.append(draft(ActionKind::Rename, "/c", Some("/d"))).unwrap();
        let c = log.append(draft(ActionKind::Delete, "/e", None)).unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(c.id, 3);
    }

    #[test]
    fn test_history_most_recent_first() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = ActionLog::open(&temp_dir.path().join("actions.log")).unwrap();

        for i in 0..5 {
            log.append(draft(ActionKind::Move, &format!("/src{}", i), Some("/d")))
                .unwrap();
        }

        let all = log.history(None);
        let ids: Vec<u64> = all.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);

        let limited = log.history(Some(2));
        let ids: Vec<u64> = limited.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[test]
    fn test_get_by_id() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = ActionLog::open(&temp_dir.path().join("actions.log")).unwrap();

        log.append(draft(ActionKind::Move, "/a", Some("/b"))).unwrap();
        log.append(draft(ActionKind::Delete, "/c", None)).unwrap();

        let found = log.get(2).expect("Action 2 should exist");
        assert_eq!(found.kind, ActionKind::Delete);
        assert!(log.get(99).is_none());
    }

    #[test]
    fn test_ids_continue_after_reopen() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("actions.log");

        {
            let log = ActionLog::open(&path).unwrap();
            log.append(draft(ActionKind::Move, "/a", Some("/b"))).unwrap();
            log.append(draft(ActionKind::Move, "/c", Some("/d"))).unwrap();
        }

        let log = ActionLog::open(&path).unwrap();
        assert_eq!(log.len(), 2);
        let next = log.append(draft(ActionKind::Rename, "/e", Some("/f"))).unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn test_torn_trailing_line_is_dropped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("actions.log");

        {
            let log = ActionLog::open(&path).unwrap();
            log.append(draft(ActionKind::Move, "/a", Some("/b"))).unwrap();
        }
        // Simulate a crash mid-append: an incomplete final record.
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{\"id\":2,\"timest");
        fs::write(&path, content).unwrap();

        let log = ActionLog::open(&path).unwrap();
        assert_eq!(log.len(), 1);
        let next = log.append(draft(ActionKind::Move, "/c", Some("/d"))).unwrap();
        assert_eq!(next.id, 2);
    }

    #[test]
    fn test_corrupt_interior_line_is_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("actions.log");

        {
            let log = ActionLog::open(&path).unwrap();
            log.append(draft(ActionKind::Move, "/a", Some("/b"))).unwrap();
            log.append(draft(ActionKind::Move, "/c", Some("/d"))).unwrap();
        }
        let content = fs::read_to_string(&path).unwrap();
        let mut lines: Vec<&str> = content.lines().collect();
        lines[0] = "not json";
        fs::write(&path, lines.join("\n")).unwrap();

        assert!(matches!(
            ActionLog::open(&path),
            Err(CoreError::LogFormat { .. })
        ));
    }

    #[test]
    fn test_serialized_record_shape() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("actions.log");

        let log = ActionLog::open(&path).unwrap();
        log.append(draft(ActionKind::UndoMove, "/b", Some("/a"))).unwrap();
        log.append(ActionDraft {
            kind: ActionKind::Delete,
            source_path: PathBuf::from("/tmp/x"),
            dest_path: None,
            size: None,
            checksum: None,
        })
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first["type"], "UNDO_MOVE");
        assert_eq!(first["id"], 1);

        let second: serde_json::Value =
            serde_json::from_str(content.lines().nth(1).unwrap()).unwrap();
        assert_eq!(second["type"], "DELETE");
        assert!(second["dest_path"].is_null());
        assert!(second["size"].is_null());
        assert!(second["checksum"].is_null());
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        use std::sync::Arc;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let log = Arc::new(ActionLog::open(&temp_dir.path().join("actions.log")).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = Arc::clone(&log);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        log.append(draft(
                            ActionKind::Move,
                            &format!("/t{}/f{}", t, i),
                            Some("/d"),
                        ))
                        .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let history = log.history(None);
        assert_eq!(history.len(), 40);
        // strictly decreasing ids, most recent first
        for pair in history.windows(2) {
            assert!(pair[0].id > pair[1].id);
        }
    }
}
