//! Bounded, shared activity log.
//!
//! The watch thread appends one entry per completed or failed move while the
//! front end reads and clears the buffer from its own thread. All access goes
//! through a single mutex; the buffer keeps at most [`LOG_CAPACITY`] entries and
//! evicts the oldest first.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Maximum number of entries retained by an [`ActivityLog`].
pub const LOG_CAPACITY: usize = 50;

/// What a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A file was placed at its destination.
    Moved,
    /// A move or a scan failed.
    Error,
}

/// One immutable line of activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local time the entry was recorded.
    pub timestamp: DateTime<Local>,
    /// Whether this entry reports success or failure.
    pub kind: EntryKind,
    /// Human-readable description.
    pub message: String,
}

impl LogEntry {
    fn new(kind: EntryKind, message: String) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            message,
        }
    }

    /// Entry for a file that landed in `dest_dir` under `name`.
    pub fn moved(name: &str, dest_dir: &Path) -> Self {
        Self::new(
            EntryKind::Moved,
            format!("Moved: {} → {}", name, dest_dir.display()),
        )
    }

    /// Entry for a file that could not be moved.
    pub fn move_failed(name: &str, reason: &dyn fmt::Display) -> Self {
        Self::new(EntryKind::Error, format!("Error moving {}: {}", name, reason))
    }

    /// Entry for a scan that could not enumerate the source directory.
    pub fn scan_failed(source: &Path, reason: &dyn fmt::Display) -> Self {
        Self::new(
            EntryKind::Error,
            format!("Error scanning {}: {}", source.display(), reason),
        )
    }

    pub fn is_error(&self) -> bool {
        self.kind == EntryKind::Error
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Cloneable handle to a shared ring buffer of [`LogEntry`] values.
///
/// Clones share the same buffer, so the mover and the front end each hold their
/// own handle.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    inner: Arc<Mutex<VecDeque<LogEntry>>>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityLog {
    /// Creates an empty log holding up to [`LOG_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    /// Creates an empty log with a custom bound. A capacity of zero is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    // Entries are immutable once pushed, so a panic elsewhere cannot leave the
    // deque half-written.
    fn lock(&self) -> MutexGuard<'_, VecDeque<LogEntry>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an entry, evicting the oldest one when full.
    pub fn push(&self, entry: LogEntry) {
        let mut buffer = self.lock();
        while buffer.len() >= self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(entry);
    }

    /// Returns the messages currently held, oldest first.
    pub fn read(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.message.clone()).collect()
    }

    /// Returns full entries currently held, oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().iter().cloned().collect()
    }

    /// Removes and returns every entry, oldest first.
    pub fn drain(&self) -> Vec<LogEntry> {
        self.lock().drain(..).collect()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_keeps_most_recent_fifty() {
        let log = ActivityLog::new();
        for i in 0..60 {
            log.push(LogEntry::moved(&format!("file{}.txt", i), Path::new("/dest")));
        }

        let messages = log.read();
        assert_eq!(messages.len(), LOG_CAPACITY);
        assert_eq!(messages[0], "Moved: file10.txt → /dest");
        assert_eq!(messages[49], "Moved: file59.txt → /dest");
    }

    #[test]
    fn test_clear_empties_buffer() {
        let log = ActivityLog::new();
        log.push(LogEntry::moved("a.png", Path::new("/dest")));
        assert_eq!(log.len(), 1);

        log.clear();
        assert!(log.is_empty());
        assert!(log.read().is_empty());
    }

    #[test]
    fn test_drain_takes_everything_once() {
        let log = ActivityLog::new();
        log.push(LogEntry::moved("a.png", Path::new("/dest")));
        log.push(LogEntry::moved("b.png", Path::new("/dest")));

        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "Moved: a.png → /dest");
        assert!(log.drain().is_empty());
    }

    #[test]
    fn test_clones_share_buffer() {
        let writer = ActivityLog::new();
        let reader = writer.clone();

        writer.push(LogEntry::move_failed("a.png", &"permission denied"));

        let entries = reader.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_error());
        assert_eq!(entries[0].message, "Error moving a.png: permission denied");
    }

    #[test]
    fn test_concurrent_writers_and_reader() {
        let log = ActivityLog::new();

        let writers: Vec<_> = (0..4)
            .map(|t| {
                let log = log.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        log.push(LogEntry::moved(&format!("{}-{}", t, i), Path::new("/d")));
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            assert!(log.read().len() <= LOG_CAPACITY);
        }

        for w in writers {
            w.join().expect("writer thread panicked");
        }
        assert_eq!(log.len(), LOG_CAPACITY);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let log = ActivityLog::with_capacity(0);
        log.push(LogEntry::moved("a", Path::new("/d")));
        log.push(LogEntry::moved("b", Path::new("/d")));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.read(), vec!["Moved: b → /d".to_string()]);
    }
}
