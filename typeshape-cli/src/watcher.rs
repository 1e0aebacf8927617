//! File watcher for watch mode.
//!
//! Watches the directory containing the declaration file, so editors that
//! save by replacing the file are still noticed, and forwards only events
//! for the declaration file itself.

use crate::error::{CliResult, WatchError};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

/// Event types for file changes.
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// The file was written or replaced.
    Modified(PathBuf),
    /// The file was removed.
    Deleted(PathBuf),
    /// An error occurred.
    Error(String),
}

/// Watches one declaration file.
pub struct FileWatcher {
    /// File to watch.
    file: PathBuf,
    /// Debounce duration in milliseconds.
    debounce_ms: u64,
}

impl FileWatcher {
    /// Create a new watcher for the given file.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            debounce_ms: 500,
        }
    }

    /// Set the debounce duration in milliseconds.
    pub fn with_debounce(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Start watching.
    ///
    /// The returned debouncer must be kept alive for as long as events are
    /// wanted.
    pub fn watch(&self) -> CliResult<(Debouncer<RecommendedWatcher>, Receiver<WatchEvent>)> {
        let (tx, rx) = channel::<WatchEvent>();
        let target = self.file.file_name().map(|name| name.to_os_string());

        let mut debouncer = new_debouncer(
            Duration::from_millis(self.debounce_ms),
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        let path = event.path;
                        if path.file_name().map(|name| name.to_os_string()) != target {
                            continue;
                        }
                        let watch_event = if path.exists() {
                            WatchEvent::Modified(path)
                        } else {
                            WatchEvent::Deleted(path)
                        };
                        let _ = tx.send(watch_event);
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchEvent::Error(e.to_string()));
                }
            },
        )
        .map_err(|e| WatchError::Init(e.to_string()))?;

        debouncer
            .watcher()
            .watch(self.watch_dir(), RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Init(e.to_string()))?;

        Ok((debouncer, rx))
    }

    /// The watched file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Directory registered with the OS watcher.
    pub fn watch_dir(&self) -> &Path {
        match self.file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl WatchEvent {
    /// Get the path associated with this event.
    pub fn path(&self) -> Option<&Path> {
        match self {
            WatchEvent::Modified(p) | WatchEvent::Deleted(p) => Some(p),
            WatchEvent::Error(_) => None,
        }
    }

    /// Check if this is an error event.
    pub fn is_error(&self) -> bool {
        matches!(self, WatchEvent::Error(_))
    }

    /// Get the error message if this is an error event.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            WatchEvent::Error(msg) => Some(msg),
            _ => None,
        }
    }
}
