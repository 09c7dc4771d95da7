//! tidyfile - organize, deduplicate and clean up directories
//!
//! This library scans directories, classifies files by extension, size
//! and age, moves them into tidy subdirectories, finds duplicate content,
//! and records every mutation in an append-only action log so moves and
//! renames can be undone later.

pub mod action_log;
pub mod checksum;
pub mod classify;
pub mod cli;
pub mod config;
pub mod dupes;
pub mod error;
pub mod executor;
pub mod organizer;
pub mod output;
pub mod report;
pub mod scan;
pub mod undo;

pub use action_log::{Action, ActionDraft, ActionKind, ActionLog};
pub use classify::{Category, Classifier, DateBucket, SizeBucket};
pub use config::{CompiledFilters, Config, ConfigError};
pub use dupes::{DupeOptions, DuplicateGroup};
pub use error::{CoreError, CoreResult};
pub use executor::{ExecutionSummary, Executor, FileOp, OverwritePolicy};
pub use organizer::{Organizer, SortCriteria};
pub use report::Report;
pub use scan::FileRecord;
pub use undo::{UndoEngine, UndoOptions, UndoScope, UndoSummary};
