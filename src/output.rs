//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: colored status lines,
//! activity-log entries, and the rule listing.

use crate::activity_log::{EntryKind, LogEntry};
use crate::config::OrganizerConfig;
use colored::*;

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// OutputFormatter::success("Rule added");
    /// ```
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

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints one activity-log entry prefixed with its local time.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dirsort::activity_log::LogEntry;
    /// use dirsort::output::OutputFormatter;
    /// use std::path::Path;
    ///
    /// OutputFormatter::log_entry(&LogEntry::moved("a.png", Path::new("/pictures")));
    /// ```
    pub fn log_entry(entry: &LogEntry) {
        let time = entry.timestamp.format("%H:%M:%S").to_string();
        match entry.kind {
            EntryKind::Moved => println!("{} {} {}", time.dimmed(), "✓".green(), entry.message),
            EntryKind::Error => {
                eprintln!("{} {} {}", time.dimmed(), "✗".red(), entry.message.red())
            }
        }
    }

    /// Prints the source directory and every rule, sorted by extension.
    pub fn rules_table(config: &OrganizerConfig) {
        Self::header("CONFIGURATION");

        let source = if config.has_source_directory() {
            config.source_directory.normal()
        } else {
            "(not set)".yellow()
        };
        println!("Source directory: {}", source);

        if config.rules.is_empty() {
            println!("No file type rules.");
            return;
        }

        let width = config
            .rules
            .keys()
            .map(|ext| ext.len())
            .max()
            .unwrap_or(0)
            .max(9); // At least "Extension" width

        println!(
            "{:<width$} | {}",
            "Extension".bold(),
            "Destination".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 20));
        for (ext, dest) in &config.rules {
            println!("{:<width$} | {}", ext.green(), dest, width = width);
        }
    }
}
