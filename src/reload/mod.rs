//! Background reload of a bound configuration file.
//!
//! # Data Flow
//! ```text
//! Polling (poller.rs):
//!     interval tick
//!     → Configuration::reload_if_modified (stat, compare mtime)
//!     → clear + load when the file is newer
//!
//! File events (watcher.rs):
//!     notify modify/create event
//!     → Configuration::reload_if_modified
//! ```
//!
//! # Design Decisions
//! - A tick that fails to reload is logged and the loop keeps going
//! - The background task holds a weak reference; dropping the store ends it
//! - Stopping is idempotent and never blocks on an in-flight reload

pub mod poller;
pub mod watcher;

pub use poller::{PollingConfig, ReloadScheduler, TimeUnit};
pub use watcher::ConfigWatcher;
