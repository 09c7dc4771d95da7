//! Command-line interface.
//!
//! Parses arguments with clap and wires each subcommand to the library:
//! sorting, batch renaming, cleanup, duplicate detection, reporting,
//! history and undo. Every mutating subcommand takes `--dry-run` and
//! shares one append-only action log.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};

use crate::action_log::ActionLog;
use crate::config::Config;
use crate::dupes::{self, DupeOptions};
use crate::organizer::{Organizer, SortCriteria};
use crate::output::OutputFormatter;
use crate::report::Report;
use crate::scan;
use crate::undo::{UndoEngine, UndoOptions, UndoScope};

#[derive(Parser)]
#[command(name = "tidyfile", version, about = "Organize, deduplicate and clean up directories")]
pub struct Cli {
    /// Path to a configuration file (default: ./.tidyfile.toml, then
    /// ~/.config/tidyfile/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the action log (default: ~/.local/share/tidyfile/actions.log)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortBy {
    /// By extension category (images, documents, ...)
    Type,
    /// By size bucket (tiny, small, medium, large)
    Size,
    /// By age bucket (today, this_week, ...)
    Date,
}

impl From<SortBy> for SortCriteria {
    fn from(by: SortBy) -> SortCriteria {
        match by {
            SortBy::Type => SortCriteria::Type,
            SortBy::Size => SortCriteria::Size,
            SortBy::Date => SortCriteria::Date,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Move files into subdirectories by type, size or age
    Sort {
        dir: PathBuf,
        #[arg(long, value_enum, default_value_t = SortBy::Type)]
        by: SortBy,
        #[arg(short, long)]
        recursive: bool,
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Rename files matching a regular expression
    Rename {
        dir: PathBuf,
        /// Pattern applied to the file name ($1-style captures allowed
        /// in the replacement)
        pattern: String,
        replacement: String,
        #[arg(short, long)]
        recursive: bool,
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Move files into destinations chosen by pattern rules
    Move {
        dir: PathBuf,
        /// A name pattern and its destination directory; repeatable,
        /// the first matching rule wins
        #[arg(long = "rule", num_args = 2, value_names = ["PATTERN", "DEST"], required = true)]
        rules: Vec<String>,
        #[arg(short, long)]
        recursive: bool,
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Delete temp files, or files older than a number of days
    Clean {
        dir: PathBuf,
        /// Delete files not modified for this many days instead of temp
        /// files
        #[arg(long, value_name = "DAYS")]
        older_than: Option<u64>,
        #[arg(short, long)]
        recursive: bool,
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
    /// Find files with identical content
    Dupes {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        /// Re-verify each group byte by byte
        #[arg(long)]
        verify_bytes: bool,
    },
    /// Show statistics for a directory
    Report {
        dir: PathBuf,
        #[arg(long)]
        json: bool,
        #[arg(short, long)]
        recursive: bool,
    },
    /// List recorded actions, most recent first
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Revert recorded moves and renames
    Undo {
        /// Undo the N most recent eligible actions (default 1)
        #[arg(long, value_name = "N", conflicts_with = "all")]
        last: Option<usize>,
        /// Undo everything still eligible
        #[arg(long)]
        all: bool,
        /// Stop at the first verification failure
        #[arg(long)]
        stop_on_error: bool,
        /// List what would be undone without touching anything
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

/// Default action log location: under the user's data directory, with a
/// working-directory fallback when HOME is unset.
fn default_log_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home)
            .join(".local")
            .join("share")
            .join("tidyfile")
            .join("actions.log"),
        Err(_) => PathBuf::from(".tidyfile.log"),
    }
}

/// Execute a parsed command. The cancellation flag is set by the
/// interrupt handler; batches drain gracefully once it flips.
pub fn run(cli: Cli, cancel: Arc<AtomicBool>) -> Result<(), String> {
    let config = Config::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let log_path = cli.log_file.clone().unwrap_or_else(default_log_path);
    let log = ActionLog::open(&log_path).map_err(|e| e.to_string())?;
    let cancel = Some(&*cancel);

    match cli.command {
        Command::Sort {
            dir,
            by,
            recursive,
            dry_run,
        } => {
            let organizer = build_organizer(&config, &log)?;
            OutputFormatter::info(&format!("Sorting {}", dir.display()));
            let summary = organizer
                .sort_files(&dir, by.into(), recursive, dry_run, cancel)
                .map_err(|e| e.to_string())?;
            OutputFormatter::execution_summary(&summary);
        }
        Command::Rename {
            dir,
            pattern,
            replacement,
            recursive,
            dry_run,
        } => {
            let organizer = build_organizer(&config, &log)?;
            let summary = organizer
                .rename_batch(&dir, &pattern, &replacement, recursive, dry_run, cancel)
                .map_err(|e| e.to_string())?;
            OutputFormatter::execution_summary(&summary);
        }
        Command::Move {
            dir,
            rules,
            recursive,
            dry_run,
        } => {
            let organizer = build_organizer(&config, &log)?;
            let rules: Vec<(String, String)> = rules
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            let summary = organizer
                .move_by_rules(&dir, &rules, recursive, dry_run, cancel)
                .map_err(|e| e.to_string())?;
            OutputFormatter::execution_summary(&summary);
        }
        Command::Clean {
            dir,
            older_than,
            recursive,
            dry_run,
        } => {
            let organizer = build_organizer(&config, &log)?;
            let summary = match older_than {
                Some(days) => organizer
                    .clean_old_files(&dir, days, recursive, dry_run, cancel)
                    .map_err(|e| e.to_string())?,
                None => organizer
                    .clean_temp_files(&dir, recursive, dry_run, cancel)
                    .map_err(|e| e.to_string())?,
            };
            OutputFormatter::execution_summary(&summary);
        }
        Command::Dupes { dirs, verify_bytes } => {
            let options = DupeOptions {
                verify_bytes: verify_bytes || config.duplicates.verify_bytes,
            };
            let spinner = OutputFormatter::create_spinner("Scanning for duplicates...");
            let groups = dupes::find(&dirs, options, cancel).map_err(|e| e.to_string())?;
            spinner.finish_and_clear();
            OutputFormatter::duplicate_groups(&groups);
        }
        Command::Report {
            dir,
            json,
            recursive,
        } => {
            let classifier = config.classifier().map_err(|e| e.to_string())?;
            let filters = config.compile_filters().map_err(|e| e.to_string())?;
            let spinner = OutputFormatter::create_spinner("Scanning...");
            let records = scan::scan_filtered(&dir, recursive, Some(filters))
                .map_err(|e| e.to_string())?;
            let report = Report::aggregate(records, &classifier, Local::now());
            spinner.finish_and_clear();
            if json {
                println!("{}", report.to_json().map_err(|e| e.to_string())?);
            } else {
                print!("{}", report.to_text());
            }
        }
        Command::History { limit } => {
            OutputFormatter::history(&log.history(limit));
        }
        Command::Undo {
            last,
            all,
            stop_on_error,
            dry_run,
        } => {
            let engine = UndoEngine::new(&log);
            let scope = if all {
                UndoScope::All
            } else {
                UndoScope::Last(last.unwrap_or(1))
            };
            if dry_run {
                let preview = engine.preview(scope);
                if preview.is_empty() {
                    OutputFormatter::plain("Nothing to undo");
                } else {
                    OutputFormatter::header("Would undo:");
                    OutputFormatter::history(&preview);
                }
            } else {
                let summary = engine
                    .undo(scope, UndoOptions { stop_on_error })
                    .map_err(|e| e.to_string())?;
                OutputFormatter::undo_summary(&summary);
            }
        }
    }

    Ok(())
}

fn build_organizer<'a>(config: &Config, log: &'a ActionLog) -> Result<Organizer<'a>, String> {
    let classifier = config.classifier().map_err(|e| e.to_string())?;
    let filters = config.compile_filters().map_err(|e| e.to_string())?;
    Ok(Organizer::new(
        log,
        config.executor.overwrite,
        classifier,
        Some(filters),
    ))
}
