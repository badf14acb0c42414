//! Watch mode for resmerge
//!
//! Monitors the input trees and reruns the pipeline after changes.

use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use thiserror::Error;

/// Watch mode errors
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to create file watcher: {0}")]
    WatcherError(#[from] notify::Error),
    #[error("Failed to receive events: {0}")]
    RecvError(#[from] std::sync::mpsc::RecvError),
}

/// File watcher for continuous regeneration
pub struct FileWatcher {
    /// Debounce duration in milliseconds
    debounce_ms: u64,
    /// Trees whose changes never trigger (the pipeline's own outputs)
    ignored: Vec<PathBuf>,
}

impl FileWatcher {
    /// Create a new file watcher with default settings
    pub fn new() -> Self {
        Self {
            debounce_ms: 500,
            ignored: Vec::new(),
        }
    }

    /// Ignore changes below `path`
    pub fn ignore(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignored.push(path.into());
        self
    }

    /// Check if a path should trigger a rerun
    fn should_trigger(&self, path: &Path) -> bool {
        if self.ignored.iter().any(|root| path.starts_with(root)) {
            return false;
        }

        let name = match path.file_name() {
            Some(name) => name.to_string_lossy(),
            None => return false,
        };

        // Hidden files, staging directories and editor swap files
        !(name.starts_with('.') || name.ends_with('~') || name.ends_with(".swp"))
    }

    /// Start watching `paths` and call the callback on changes
    pub fn watch<F>(&self, paths: &[&Path], mut on_change: F) -> Result<(), WatchError>
    where
        F: FnMut() -> bool, // Returns false to stop watching
    {
        let (tx, rx) = channel();

        // Create debounced watcher
        let mut debouncer = new_debouncer(Duration::from_millis(self.debounce_ms), tx)?;

        for path in paths {
            debouncer.watcher().watch(path, RecursiveMode::Recursive)?;
        }

        println!();
        println!("{}", "👁  Watch mode active. Press Ctrl+C to stop.".cyan().bold());
        for path in paths {
            println!("{}", format!("   Watching: {}", path.display()).dimmed());
        }
        println!();

        // Initial run
        if !on_change() {
            return Ok(());
        }

        loop {
            match rx.recv()? {
                Ok(events) => {
                    let relevant: Vec<_> = events
                        .iter()
                        .filter(|e| {
                            matches!(e.kind, DebouncedEventKind::Any | DebouncedEventKind::AnyContinuous)
                                && self.should_trigger(&e.path)
                        })
                        .collect();

                    if relevant.is_empty() {
                        continue;
                    }

                    println!();
                    println!(
                        "{}",
                        format!("🔄 Changes detected in {} file(s), regenerating...", relevant.len()).yellow()
                    );
                    for event in relevant.iter().take(5) {
                        if let Some(name) = event.path.file_name() {
                            println!("   • {}", name.to_string_lossy().dimmed());
                        }
                    }
                    if relevant.len() > 5 {
                        println!("   • ... and {} more", relevant.len() - 5);
                    }
                    println!();

                    if !on_change() {
                        break;
                    }
                }
                Err(e) => {
                    eprintln!("{}: {:?}", "Watch error".red(), e);
                }
            }
        }

        Ok(())
    }
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new()
    }
}
