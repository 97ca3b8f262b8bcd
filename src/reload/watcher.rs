//! Configuration file watcher for event-driven reload.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::{ConfigError, Result};
use crate::store::Configuration;

/// Watches the file a store is bound to and reloads it on change.
///
/// An alternative to [`super::ReloadScheduler`] for platforms with native
/// file events; both funnel into `Configuration::reload_if_modified`.
pub struct ConfigWatcher {
    path: PathBuf,
    store: Weak<Configuration>,
}

impl ConfigWatcher {
    /// Create a watcher for the file `store` is currently bound to.
    pub fn new(store: &Arc<Configuration>) -> Result<Self> {
        let path = store
            .source()
            .and_then(|source| source.path().cloned())
            .ok_or_else(|| {
                ConfigError::InvalidArgument("store is not bound to a file".to_string())
            })?;

        Ok(Self {
            path,
            store: Arc::downgrade(store),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start watching. Events are handled on the watcher's own thread; drop
    /// the returned watcher to stop.
    pub fn run(self) -> std::result::Result<RecommendedWatcher, notify::Error> {
        let store = self.store.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        let Some(store) = store.upgrade() else {
                            return;
                        };
                        match store.reload_if_modified() {
                            Ok(true) => tracing::info!(
                                path = %path.display(),
                                "Config file change detected, reloaded"
                            ),
                            Ok(false) => {}
                            Err(e) => tracing::error!(
                                error = %e,
                                "Failed to reload config after file change"
                            ),
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
