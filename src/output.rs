//! Output formatting and styling.
//!
//! Centralizes all CLI output: colored status lines, spinners for long
//! scans, and rendering of batch, undo and duplicate summaries.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::action_log::Action;
use crate::dupes::DuplicateGroup;
use crate::executor::ExecutionSummary;
use crate::report::human_size;
use crate::undo::UndoSummary;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Spinner for operations whose length is not known up front.
    pub fn create_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Renders the outcome of a batch of file operations.
    pub fn execution_summary(summary: &ExecutionSummary) {
        if summary.dry_run {
            for effect in &summary.effects {
                match &effect.dest {
                    Some(dest) => Self::dry_run_notice(&format!(
                        "{} -> {}",
                        effect.source.display(),
                        dest.display()
                    )),
                    None => {
                        Self::dry_run_notice(&format!("delete {}", effect.source.display()))
                    }
                }
            }
        }

        for (path, reason) in &summary.skipped {
            Self::warning(&format!("Skipped {}: {}", path.display(), reason));
        }
        for (path, reason) in &summary.failed {
            Self::error(&format!("Failed {}: {}", path.display(), reason));
        }

        let verb = if summary.dry_run {
            "would be processed"
        } else {
            "processed"
        };
        Self::success(&format!(
            "{} file(s) {}, {} skipped, {} failed",
            summary.succeeded(),
            verb,
            summary.skipped.len(),
            summary.failed.len()
        ));
    }

    /// Renders the outcome of an undo run.
    pub fn undo_summary(summary: &UndoSummary) {
        for action in &summary.restored {
            if let Some(dest) = &action.dest_path {
                Self::plain(&format!(
                    "  restored {} -> {}",
                    dest.display(),
                    action.source_path.display()
                ));
            }
        }
        for (path, reason) in &summary.skipped {
            match path {
                Some(path) => Self::warning(&format!("Skipped {}: {}", path.display(), reason)),
                None => Self::warning(&format!("Skipped: {}", reason)),
            }
        }
        for (path, reason) in &summary.failed {
            Self::error(&format!("Failed {}: {}", path.display(), reason));
        }
        Self::success(&format!(
            "{} action(s) undone, {} skipped, {} failed",
            summary.restored.len(),
            summary.skipped.len(),
            summary.failed.len()
        ));
    }

    /// Renders duplicate groups with the space a cleanup would reclaim.
    pub fn duplicate_groups(groups: &[DuplicateGroup]) {
        if groups.is_empty() {
            Self::success("No duplicates found");
            return;
        }

        let mut wasted = 0u64;
        for (i, group) in groups.iter().enumerate() {
            Self::header(&format!(
                "Group {} ({} each)",
                i + 1,
                human_size(group.size)
            ));
            println!("  {} {}", "keep".green(), group.original.path.display());
            for dup in &group.duplicates {
                println!("  {} {}", "dupe".yellow(), dup.path.display());
            }
            wasted += group.wasted_bytes();
        }
        Self::plain("");
        Self::info(&format!(
            "{} group(s), {} reclaimable",
            groups.len(),
            human_size(wasted)
        ));
    }

    /// Renders action log entries, most recent first.
    pub fn history(actions: &[Action]) {
        if actions.is_empty() {
            Self::plain("No recorded actions");
            return;
        }
        for action in actions {
            let dest = action
                .dest_path
                .as_ref()
                .map(|d| format!(" -> {}", d.display()))
                .unwrap_or_default();
            println!(
                "#{:<5} {} {:<12} {}{}",
                action.id,
                action.timestamp.format("%Y-%m-%d %H:%M:%S"),
                action.kind.to_string(),
                action.source_path.display(),
                dest
            );
        }
    }
}
