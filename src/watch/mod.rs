// src/watch/mod.rs

//! Polling file watcher with quiet-period debouncing.
//!
//! This module is responsible for:
//! - Producing snapshots of the watched roots (`scanner`, `snapshot`).
//! - Diffing snapshots into change sets (`change_set`).
//! - Coalescing bursts of changes into one notification (`debounce`).
//! - Running the poll loop and dispatching to listeners (`watcher`).
//!
//! It does **not** know about builds or containers; it only turns filesystem
//! changes into change notifications.

pub mod change_set;
pub mod debounce;
pub mod listener;
pub mod path_utils;
pub mod scanner;
pub mod snapshot;
pub mod watcher;

pub use change_set::{diff, ChangeSet};
pub use debounce::{Debouncer, WatchPhase};
pub use listener::{ChangeListener, ChannelListener};
pub use scanner::DirectoryScanner;
pub use snapshot::{FileRecord, Snapshot};
pub use watcher::{WatchSession, WatcherHandle};
