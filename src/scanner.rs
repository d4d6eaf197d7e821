//! One pass over the top level of the source directory.
//!
//! Only regular files directly inside the source directory are considered;
//! subdirectories, symlinks and other special entries are skipped silently.

use crate::activity_log::{ActivityLog, LogEntry};
use crate::config::OrganizerConfig;
use crate::mover::Mover;
use crate::rules::RuleTable;
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, warn};

/// The source directory could not be enumerated.
#[derive(Debug, Error)]
#[error("cannot read source directory {}: {source}", path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Counts of what a single scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Files placed at their destination.
    pub moved: usize,
    /// Files whose move failed.
    pub failed: usize,
    /// Regular files with no matching rule.
    pub skipped: usize,
}

impl ScanReport {
    /// Number of regular files seen by the scan.
    pub fn total_processed(&self) -> usize {
        self.moved + self.failed + self.skipped
    }
}

/// Routes the files of one source directory according to a fixed rule table.
///
/// The rules are captured when the organizer is built; later edits to the
/// configuration take effect only for a new organizer.
#[derive(Debug, Clone)]
pub struct Organizer {
    source: PathBuf,
    rules: RuleTable,
    mover: Mover,
}

impl Organizer {
    pub fn new(source: impl Into<PathBuf>, rules: RuleTable, log: ActivityLog) -> Self {
        Self {
            source: source.into(),
            rules,
            mover: Mover::new(log),
        }
    }

    /// Builds an organizer from a configuration snapshot.
    pub fn from_config(config: &OrganizerConfig, log: ActivityLog) -> Self {
        Self::new(
            config.source_directory.trim(),
            RuleTable::from_config(config),
            log,
        )
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn log(&self) -> &ActivityLog {
        self.mover.log()
    }

    /// Scans the source directory once.
    ///
    /// Per-file failures are logged by the mover and counted in the report.
    ///
    /// # Errors
    ///
    /// Returns `ScanError` if the source directory cannot be opened. Nothing is
    /// written to the activity log in that case; see [`Organizer::scan_once`].
    /// Files whose rule points back at the source directory stay where they are
    /// and count as skipped.
    pub fn scan(&self) -> Result<ScanReport, ScanError> {
        let entries = fs::read_dir(&self.source).map_err(|source| ScanError {
            path: self.source.clone(),
            source,
        })?;

        let report = self.route_entries(entries);
        debug!(
            source = %self.source.display(),
            moved = report.moved,
            failed = report.failed,
            skipped = report.skipped,
            "scan finished"
        );
        Ok(report)
    }

    /// Routes each enumerated entry in order.
    ///
    /// An entry that cannot be read is logged as a scan error and counted as
    /// failed; the remaining entries are still processed.
    fn route_entries(&self, entries: impl Iterator<Item = io::Result<DirEntry>>) -> ScanReport {
        // Resolved once so rules pointing back at the source can be recognized.
        let source_dir = fs::canonicalize(&self.source).ok();

        let mut report = ScanReport::default();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(source = %self.source.display(), error = %e, "unreadable directory entry");
                    self.log().push(LogEntry::scan_failed(&self.source, &e));
                    report.failed += 1;
                    continue;
                }
            };

            // file_type() does not follow symlinks, so links are never regular files here.
            match entry.file_type() {
                Ok(file_type) if file_type.is_file() => {}
                _ => continue,
            }

            let name = entry.file_name();
            let Some(dest_dir) = self.rules.destination_for(&name.to_string_lossy()) else {
                debug!(file = ?name, "no rule for file");
                report.skipped += 1;
                continue;
            };

            if is_same_directory(dest_dir, source_dir.as_deref()) {
                debug!(file = ?name, "destination is the source directory, leaving in place");
                report.skipped += 1;
                continue;
            }

            match self.mover.move_file(&entry.path(), dest_dir, &name) {
                Some(_) => report.moved += 1,
                None => report.failed += 1,
            }
        }
        report
    }

    /// Scans once and records an unreadable source directory in the activity log.
    ///
    /// This is the entry point used by the watch loop: it never fails.
    pub fn scan_once(&self) -> ScanReport {
        match self.scan() {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "scan aborted");
                self.log().push(LogEntry::scan_failed(&e.path, &e.source));
                ScanReport::default()
            }
        }
    }
}

/// True if `dest_dir` exists and resolves to `source_dir`.
fn is_same_directory(dest_dir: &Path, source_dir: Option<&Path>) -> bool {
    match source_dir {
        Some(source_dir) => fs::canonicalize(dest_dir).is_ok_and(|dest| dest == source_dir),
        None => false,
    }
}
