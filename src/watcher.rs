//! Watch sessions: filesystem notifications driving repeated scans.
//!
//! A [`WatchSession`] subscribes recursively to the source directory and runs
//! one background thread. Every notification that changes the contents of a
//! directory anywhere in the watched tree triggers a full scan of the top-level
//! source directory. Notifications already queued when a scan starts are folded
//! into it. Scans run one after another on that thread; a scan that is in
//! progress when the session stops is allowed to finish.

use crate::activity_log::ActivityLog;
use crate::config::OrganizerConfig;
use crate::scanner::Organizer;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// How often an idle subscription re-checks for cancellation.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum WatchError {
    /// The configuration has no source directory.
    #[error("no source directory")]
    NoSourceDirectory,
    /// The notification backend refused the subscription.
    #[error("failed to watch {}: {source}", path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
    /// The background thread could not be started.
    #[error("failed to start watch thread: {0}")]
    Spawn(#[source] io::Error),
}

/// True if `event` changes the contents of a directory.
///
/// Creating, removing or renaming an entry modifies its parent directory, so
/// those always count. Other modifications count only when their subject is
/// itself a directory; a file's own data or metadata change does not.
pub fn is_directory_modification(event: &Event) -> bool {
    match event.kind {
        EventKind::Create(_)
        | EventKind::Remove(_)
        | EventKind::Modify(ModifyKind::Name(_))
        | EventKind::Any
        | EventKind::Other => true,
        EventKind::Modify(_) => event.paths.iter().any(|p| p.is_dir()),
        _ => false,
    }
}

/// A cancellable stream of notifications for one directory tree.
pub struct Subscription {
    // Dropping the watcher unsubscribes and closes the channel.
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    cancelled: Arc<AtomicBool>,
}

impl Subscription {
    /// Subscribes recursively to `path`.
    pub fn new(path: &Path, cancelled: Arc<AtomicBool>) -> Result<Self, WatchError> {
        let subscribe_err = |source: notify::Error| WatchError::Subscribe {
            path: path.to_path_buf(),
            source,
        };

        let (tx, rx) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(tx, Config::default()).map_err(subscribe_err)?;
        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(subscribe_err)?;

        Ok(Self {
            _watcher: watcher,
            events: rx,
            cancelled,
        })
    }

    /// Blocks until the next notification arrives.
    ///
    /// Returns `None` once the subscription is cancelled or the backend hangs up.
    pub fn next_event(&self) -> Option<notify::Result<Event>> {
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return None;
            }
            match self.events.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(result) => return Some(result),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Discards every notification already queued and returns how many there were.
    pub fn drain_pending(&self) -> usize {
        let mut drained = 0;
        while let Ok(result) = self.events.try_recv() {
            if let Err(e) = result {
                warn!(error = %e, "notification error");
            }
            drained += 1;
        }
        drained
    }
}

/// A running watch over one source directory.
///
/// The session stops when [`WatchSession::stop`] is called or when the handle
/// is dropped, whichever comes first.
pub struct WatchSession {
    source: PathBuf,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

/// Starts a watch session; see [`WatchSession::start`].
pub fn start(config: &OrganizerConfig, log: ActivityLog) -> Result<WatchSession, WatchError> {
    WatchSession::start(config, log)
}

impl WatchSession {
    /// Snapshots `config` and starts watching its source directory.
    ///
    /// Configuration edits made after this call are not seen by the session.
    ///
    /// # Errors
    ///
    /// * `WatchError::NoSourceDirectory` if the source directory is empty
    /// * `WatchError::Subscribe` if the directory cannot be watched (e.g. it does not exist)
    /// * `WatchError::Spawn` if the background thread cannot be created
    pub fn start(config: &OrganizerConfig, log: ActivityLog) -> Result<Self, WatchError> {
        if !config.has_source_directory() {
            return Err(WatchError::NoSourceDirectory);
        }

        let organizer = Organizer::from_config(config, log);
        let source = organizer.source().to_path_buf();
        let cancelled = Arc::new(AtomicBool::new(false));
        let subscription = Subscription::new(&source, Arc::clone(&cancelled))?;

        let worker = thread::Builder::new()
            .name("dirsort-watch".to_string())
            .spawn(move || run_watch_loop(&subscription, &organizer))
            .map_err(WatchError::Spawn)?;

        info!(source = %source.display(), "watch session started");
        Ok(Self {
            source,
            cancelled,
            worker: Some(worker),
        })
    }

    /// The directory being watched.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// True while the background loop is alive and no stop was requested.
    pub fn is_running(&self) -> bool {
        !self.cancelled.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stops the session and waits for an in-progress scan to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(source = %self.source.display(), "watch thread panicked");
            }
            info!(source = %self.source.display(), "watch session stopped");
        }
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// A scan covers every change queued before it starts, so a burst of
// notifications collapses into one pass.
fn run_watch_loop(subscription: &Subscription, organizer: &Organizer) {
    while let Some(result) = subscription.next_event() {
        match result {
            Ok(event) if is_directory_modification(&event) => {
                let coalesced = subscription.drain_pending();
                debug!(
                    kind = ?event.kind,
                    paths = ?event.paths,
                    coalesced,
                    "directory changed, scanning"
                );
                organizer.scan_once();
            }
            Ok(event) => {
                trace!(kind = ?event.kind, "ignoring file-level notification");
            }
            Err(e) => {
                warn!(error = %e, "notification error");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind, RenameMode};
    use tempfile::TempDir;

    fn event(kind: EventKind, path: &Path) -> Event {
        Event::new(kind).add_path(path.to_path_buf())
    }

    #[test]
    fn test_entry_changes_count_as_directory_modification() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("a.png");

        assert!(is_directory_modification(&event(
            EventKind::Create(CreateKind::File),
            &file
        )));
        assert!(is_directory_modification(&event(
            EventKind::Remove(RemoveKind::File),
            &file
        )));
        assert!(is_directory_modification(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &file
        )));
    }

    #[test]
    fn test_file_content_change_is_ignored() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("a.png");
        std::fs::write(&file, "data").unwrap();

        assert!(!is_directory_modification(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &file
        )));
        assert!(!is_directory_modification(&event(
            EventKind::Access(AccessKind::Any),
            &file
        )));
    }

    #[test]
    fn test_modify_on_directory_counts() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(is_directory_modification(&event(
            EventKind::Modify(ModifyKind::Any),
            temp_dir.path()
        )));
    }

    #[test]
    fn test_start_requires_source_directory() {
        let result = WatchSession::start(&OrganizerConfig::default(), ActivityLog::new());
        assert!(matches!(result, Err(WatchError::NoSourceDirectory)));

        let blank = OrganizerConfig::new("   ");
        let result = WatchSession::start(&blank, ActivityLog::new());
        assert!(matches!(result, Err(WatchError::NoSourceDirectory)));
    }

    #[test]
    fn test_start_on_missing_directory_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = OrganizerConfig::new(temp_dir.path().join("missing").to_string_lossy());

        let result = WatchSession::start(&config, ActivityLog::new());
        assert!(matches!(result, Err(WatchError::Subscribe { .. })));
    }

    #[test]
    fn test_stop_ends_session() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = OrganizerConfig::new(temp_dir.path().to_string_lossy());

        let session = start(&config, ActivityLog::new()).expect("Failed to start session");
        assert!(session.is_running());
        assert_eq!(session.source(), temp_dir.path());

        session.stop();
    }

    #[test]
    fn test_cancelled_subscription_returns_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cancelled = Arc::new(AtomicBool::new(false));
        let subscription =
            Subscription::new(temp_dir.path(), Arc::clone(&cancelled)).expect("subscribe");

        cancelled.store(true, Ordering::Release);
        assert!(subscription.next_event().is_none());
    }

    #[test]
    fn test_pending_notifications_are_drained_together() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cancelled = Arc::new(AtomicBool::new(false));
        let subscription =
            Subscription::new(temp_dir.path(), Arc::clone(&cancelled)).expect("subscribe");

        for i in 0..5 {
            std::fs::write(temp_dir.path().join(format!("f{}.txt", i)), "x").unwrap();
        }
        std::thread::sleep(Duration::from_millis(500));

        assert!(subscription.next_event().is_some());
        // At least one create per remaining file is still queued.
        assert!(subscription.drain_pending() >= 4);
        assert_eq!(subscription.drain_pending(), 0);
    }
}
