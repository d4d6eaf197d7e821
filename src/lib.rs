//! dirsort - route files out of a watched directory by extension
//!
//! This library watches a source directory, matches each top-level file's
//! extension against a rule table, and moves matching files into their
//! destination folders without ever overwriting an existing file. Every move
//! and every failure is recorded in a bounded, shared activity log.

pub mod activity_log;
pub mod cli;
pub mod collision;
pub mod config;
pub mod mover;
pub mod output;
pub mod rules;
pub mod scanner;
pub mod watcher;

pub use activity_log::{ActivityLog, LOG_CAPACITY, LogEntry};
pub use config::{ConfigError, OrganizerConfig};
pub use mover::{MoveError, Mover};
pub use rules::RuleTable;
pub use scanner::{Organizer, ScanError, ScanReport};
pub use watcher::{WatchError, WatchSession, start};
