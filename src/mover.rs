/// Collision-safe relocation of single files.
///
/// The mover creates the destination directory on demand, picks a free name
/// through the collision resolver, moves the file, and records the outcome in
/// the activity log. Failures never escape [`Mover::move_file`]; they become
/// error entries so a watch loop can keep running.
use crate::activity_log::{ActivityLog, LogEntry};
use crate::collision::unique_file_name;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A file that was placed at its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Where the file was before the move.
    pub original_path: PathBuf,
    /// Where the file is now. Its name differs from the original after a collision.
    pub new_path: PathBuf,
}

impl Operation {
    /// True when the file had to be renamed to avoid a collision.
    pub fn was_renamed(&self) -> bool {
        self.original_path.file_name() != self.new_path.file_name()
    }
}

/// Errors that can occur while moving a file.
#[derive(Debug, Error)]
pub enum MoveError {
    /// Failed to create the destination directory.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Rename failed and no fallback applies.
    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Cross-volume copy failed.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The copy succeeded but the original could not be removed; the copy was rolled back.
    #[error("failed to remove original {} after copying: {source}", path.display())]
    SourceRemovalFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The original could not be removed and neither could the copy, so the file exists twice.
    #[error(
        "failed to remove original {} after copying, copy left at {}: {source}",
        path.display(),
        copy.display()
    )]
    DuplicateLeft {
        path: PathBuf,
        copy: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for move operations.
pub type MoveResult<T> = Result<T, MoveError>;

/// Moves files and reports each outcome to an [`ActivityLog`].
#[derive(Debug, Clone)]
pub struct Mover {
    log: ActivityLog,
}

impl Mover {
    pub fn new(log: ActivityLog) -> Self {
        Self { log }
    }

    /// The log this mover writes to.
    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Moves `src` into `dest_dir` as `name` and logs the outcome.
    ///
    /// Returns the performed operation, or `None` if the move failed. A failure
    /// is logged as `Error moving <name>: <reason>` and is otherwise swallowed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::activity_log::ActivityLog;
    /// use dirsort::mover::Mover;
    /// use std::ffi::OsStr;
    /// use std::path::Path;
    ///
    /// let log = ActivityLog::new();
    /// let mover = Mover::new(log.clone());
    /// mover.move_file(
    ///     Path::new("/downloads/a.png"),
    ///     Path::new("/pictures"),
    ///     OsStr::new("a.png"),
    /// );
    /// println!("{:?}", log.read());
    /// ```
    pub fn move_file(&self, src: &Path, dest_dir: &Path, name: &OsStr) -> Option<Operation> {
        match Self::relocate(src, dest_dir, name) {
            Ok(operation) => {
                let placed_as = operation
                    .new_path
                    .file_name()
                    .unwrap_or(name)
                    .to_string_lossy();
                self.log.push(LogEntry::moved(&placed_as, dest_dir));
                Some(operation)
            }
            Err(e) => {
                warn!(src = %src.display(), error = %e, "move failed");
                self.log.push(LogEntry::move_failed(&name.to_string_lossy(), &e));
                None
            }
        }
    }

    /// Moves `src` into `dest_dir` as `name` without logging to the activity log.
    ///
    /// Steps, each of which can fail:
    /// 1. Create `dest_dir` and its missing parents
    /// 2. Pick a free name if `dest_dir/name` is taken
    /// 3. Rename, or copy and remove when the rename crosses volumes
    pub fn relocate(src: &Path, dest_dir: &Path, name: &OsStr) -> MoveResult<Operation> {
        fs::create_dir_all(dest_dir).map_err(|source| MoveError::DirectoryCreationFailed {
            path: dest_dir.to_path_buf(),
            source,
        })?;

        let free_name = unique_file_name(dest_dir, name);
        let dest = dest_dir.join(&free_name);

        move_across_volumes(src, &dest)?;
        info!(src = %src.display(), dest = %dest.display(), "moved file");

        Ok(Operation {
            original_path: src.to_path_buf(),
            new_path: dest,
        })
    }
}

/// Renames `src` to `dest`, falling back to copy and remove across volumes.
fn move_across_volumes(src: &Path, dest: &Path) -> MoveResult<()> {
    let rename_err = match fs::rename(src, dest) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if rename_err.kind() != io::ErrorKind::CrossesDevices {
        return Err(MoveError::RenameFailed {
            from: src.to_path_buf(),
            to: dest.to_path_buf(),
            source: rename_err,
        });
    }

    debug!(src = %src.display(), dest = %dest.display(), "rename crosses volumes, copying");
    if let Err(source) = fs::copy(src, dest) {
        // A partial copy may or may not exist.
        let _ = fs::remove_file(dest);
        return Err(MoveError::CopyFailed {
            from: src.to_path_buf(),
            to: dest.to_path_buf(),
            source,
        });
    }

    match fs::remove_file(src) {
        Ok(()) => Ok(()),
        Err(source) => Err(roll_back_copy(src, dest, source)),
    }
}

/// Deletes `dest` after the original at `src` could not be removed.
///
/// `source` is the error from removing the original.
fn roll_back_copy(src: &Path, dest: &Path, source: io::Error) -> MoveError {
    match fs::remove_file(dest) {
        Ok(()) => MoveError::SourceRemovalFailed {
            path: src.to_path_buf(),
            source,
        },
        Err(e) => {
            warn!(
                src = %src.display(),
                copy = %dest.display(),
                error = %e,
                "could not roll back copy, file now exists twice"
            );
            MoveError::DuplicateLeft {
                path: src.to_path_buf(),
                copy: dest.to_path_buf(),
                source,
            }
        }
    }
}
