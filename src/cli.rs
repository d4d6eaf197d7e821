//! Command-line interface module for dirsort.
//!
//! This module handles all CLI-related functionality including:
//! - Editing and listing the saved configuration
//! - One-shot organization of the source directory
//! - Running a watch session until Ctrl-C

use crate::activity_log::ActivityLog;
use crate::config::OrganizerConfig;
use crate::output::OutputFormatter;
use crate::scanner::Organizer;
use crate::watcher::WatchSession;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::info;

/// How often `watch` flushes new activity to the terminal.
const DISPLAY_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Parser)]
#[command(name = "dirsort")]
#[command(about = "Watch a directory and route files into folders by extension")]
pub struct Cli {
    /// Configuration file (defaults to ~/.file_organizer_config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Set the directory to organize
    Source {
        /// Directory whose files get routed
        dir: PathBuf,
    },
    /// Add or replace a rule, e.g. `add .pdf ~/Documents/pdf`
    Add {
        /// File extension, with or without the leading dot
        extension: String,
        /// Destination folder for files with this extension
        destination: String,
    },
    /// Remove the rule for an extension
    Remove {
        /// File extension, with or without the leading dot
        extension: String,
    },
    /// Show the source directory and all rules
    Rules,
    /// Organize the source directory once and exit
    Scan,
    /// Watch the source directory and organize new files until Ctrl-C
    Watch,
}

/// Runs the parsed command line.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dirsort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["dirsort", "rules"]);
/// run_cli(&cli).expect("command failed");
/// ```
pub fn run_cli(cli: &Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => OrganizerConfig::default_path()?,
    };
    run_command(&cli.command, &config_path)
}

/// Runs one command against the configuration stored at `config_path`.
pub fn run_command(command: &Command, config_path: &Path) -> Result<()> {
    let mut config = OrganizerConfig::load_from(config_path)?;

    match command {
        Command::Source { dir } => {
            if !dir.is_dir() {
                OutputFormatter::warning(&format!(
                    "{} is not an existing directory; watching will fail until it exists",
                    dir.display()
                ));
            }
            config.set_source_directory(dir.to_string_lossy());
            config.save_to(config_path)?;
            OutputFormatter::success(&format!("Source directory set to {}", dir.display()));
        }
        Command::Add {
            extension,
            destination,
        } => {
            let key = config.add_rule(extension, destination)?;
            config.save_to(config_path)?;
            OutputFormatter::success(&format!("Files ending in {} go to {}", key, destination));
        }
        Command::Remove { extension } => match config.remove_rule(extension) {
            Some(_) => {
                config.save_to(config_path)?;
                OutputFormatter::success(&format!("Removed rule for {}", extension));
            }
            None => OutputFormatter::warning(&format!("No rule for {}", extension)),
        },
        Command::Rules => OutputFormatter::rules_table(&config),
        Command::Scan => scan_once(&config)?,
        Command::Watch => watch(&config)?,
    }

    Ok(())
}

fn require_source(config: &OrganizerConfig) -> Result<()> {
    if !config.has_source_directory() {
        bail!("no source directory; set one with `dirsort source <DIR>`");
    }
    Ok(())
}

/// Organizes the source directory once and prints what happened.
fn scan_once(config: &OrganizerConfig) -> Result<()> {
    require_source(config)?;

    let log = ActivityLog::new();
    let organizer = Organizer::from_config(config, log.clone());
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        organizer.source().display()
    ));

    let report = organizer.scan_once();
    for entry in log.drain() {
        OutputFormatter::log_entry(&entry);
    }

    OutputFormatter::header("SUMMARY");
    println!("Moved:   {}", report.moved);
    println!("Failed:  {}", report.failed);
    println!("No rule: {}", report.skipped);
    Ok(())
}

/// Runs a watch session, streaming activity until Ctrl-C.
fn watch(config: &OrganizerConfig) -> Result<()> {
    require_source(config)?;

    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("failed to install Ctrl-C handler")?;

    let log = ActivityLog::new();
    let session = WatchSession::start(config, log.clone())
        .with_context(|| format!("could not watch {}", config.source_directory))?;
    OutputFormatter::success(&format!(
        "Organizer is running on {} (Ctrl-C to stop)",
        session.source().display()
    ));

    loop {
        for entry in log.drain() {
            OutputFormatter::log_entry(&entry);
        }
        if !session.is_running() {
            OutputFormatter::error("Watch session ended unexpectedly");
            break;
        }
        match stop_rx.recv_timeout(DISPLAY_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    info!("stopping watch session");
    session.stop();
    for entry in log.drain() {
        OutputFormatter::log_entry(&entry);
    }
    OutputFormatter::info("Organizer stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_add_command() {
        let cli = Cli::parse_from(["dirsort", "--config", "/tmp/c.json", "add", ".pdf", "/docs"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
        assert!(matches!(
            cli.command,
            Command::Add { ref extension, ref destination }
                if extension == ".pdf" && destination == "/docs"
        ));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["dirsort", "watch", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Watch));
    }

    #[test]
    fn test_commands_edit_config_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.json");

        run_command(
            &Command::Source {
                dir: temp_dir.path().to_path_buf(),
            },
            &config_path,
        )
        .unwrap();
        run_command(
            &Command::Add {
                extension: "PNG".to_string(),
                destination: "/images".to_string(),
            },
            &config_path,
        )
        .unwrap();

        let config = OrganizerConfig::load_from(&config_path).unwrap();
        assert_eq!(config.source_directory, temp_dir.path().to_string_lossy());
        assert_eq!(config.rules.get(".png").map(String::as_str), Some("/images"));

        run_command(
            &Command::Remove {
                extension: ".png".to_string(),
            },
            &config_path,
        )
        .unwrap();
        let config = OrganizerConfig::load_from(&config_path).unwrap();
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_scan_without_source_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = run_command(&Command::Scan, &temp_dir.path().join("config.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_command_moves_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("in");
        let dest = temp_dir.path().join("docs");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("a.pdf"), "pdf").unwrap();

        let config_path = temp_dir.path().join("config.json");
        let mut config = OrganizerConfig::new(source.to_string_lossy());
        config.add_rule(".pdf", &dest.to_string_lossy()).unwrap();
        config.save_to(&config_path).unwrap();

        run_command(&Command::Scan, &config_path).unwrap();
        assert!(dest.join("a.pdf").exists());
        assert!(!source.join("a.pdf").exists());
    }
}
