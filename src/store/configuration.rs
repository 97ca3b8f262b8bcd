//! Typed, hierarchical configuration store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::convert::{Converter, ConverterRegistry};
use crate::error::{CodecError, ConfigError, Result};
use crate::observability::metrics;
use crate::persistence::{Format, PersistenceAdapter};
use crate::reload::{PollingConfig, ReloadScheduler};
use crate::store::binding::{environment_table, SourceBinding};
use crate::tree::{ConfigNode, NestedKey, Table};

/// Default list delimiter.
pub const DEFAULT_DELIMITER: char = ',';

const INLINE_SOURCE: &str = "<inline>";

/// State guarded by the store lock.
struct StoreState {
    tree: Table,
    source: Option<SourceBinding>,
    delimiter: char,
}

/// A mutable configuration tree with typed access.
///
/// All methods take `&self`; share the store across threads with `Arc`.
/// Polling requires the store to live in an `Arc` (see
/// [`Configuration::start_polling`]).
pub struct Configuration {
    registry: Arc<ConverterRegistry>,
    adapter: Arc<dyn PersistenceAdapter>,
    state: Mutex<StoreState>,
    scheduler: Mutex<Option<ReloadScheduler>>,
}

impl Configuration {
    /// Create an empty store using the default converter registry.
    pub fn new(adapter: Arc<dyn PersistenceAdapter>) -> Self {
        Self::with_registry(Arc::new(ConverterRegistry::new()), adapter)
    }

    /// Create an empty store with an explicit registry.
    pub fn with_registry(
        registry: Arc<ConverterRegistry>,
        adapter: Arc<dyn PersistenceAdapter>,
    ) -> Self {
        Self {
            registry,
            adapter,
            state: Mutex::new(StoreState {
                tree: Table::new(),
                source: None,
                delimiter: DEFAULT_DELIMITER,
            }),
            scheduler: Mutex::new(None),
        }
    }

    /// Create an empty store for `format`.
    pub fn for_format(format: Format) -> Self {
        Self::new(format.adapter())
    }

    /// Create a store for the file at `path`, picking the format from its
    /// extension, and load it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path).ok_or_else(|| {
            ConfigError::InvalidArgument(format!(
                "unrecognised configuration format: {}",
                path.display()
            ))
        })?;
        let config = Self::for_format(format);
        config.load(path)?;
        Ok(config)
    }

    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    pub fn format(&self) -> Format {
        self.adapter.format()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        // every mutation is a single insert, clear or swap, so a panicking
        // holder cannot leave the tree half-written
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn delimiter(&self) -> char {
        self.state().delimiter
    }

    /// Change the character used to join and split list values.
    pub fn set_delimiter(&self, delimiter: char) {
        self.state().delimiter = delimiter;
    }

    /// The currently bound source, if any.
    pub fn source(&self) -> Option<SourceBinding> {
        self.state().source.clone()
    }

    /// Load the file at `path` and bind the store to it.
    ///
    /// Decoded top-level entries are merged into the tree, replacing entries
    /// with the same key. The binding is only changed on success.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidArgument("path is empty".to_string()));
        }

        let mut state = self.state();
        let (table, modified) = read_file(self.adapter.as_ref(), path, state.delimiter)
            .map_err(|source| ConfigError::LoadFailed {
                source_name: path.display().to_string(),
                source,
            })?;
        let loaded = table.len();
        state.tree.extend(table);
        state.source = Some(SourceBinding::file(path, modified));
        metrics::record_tree_size(state.tree.len());

        tracing::info!(
            path = %path.display(),
            format = %self.adapter.format(),
            keys = loaded,
            "Configuration loaded"
        );
        Ok(())
    }

    /// Decode `content` with the store's adapter and merge it into the tree
    /// without binding a source.
    pub fn load_str(&self, content: &str) -> Result<()> {
        let mut state = self.state();
        let table = self
            .adapter
            .decode(content, state.delimiter)
            .map_err(|source| ConfigError::LoadFailed {
                source_name: INLINE_SOURCE.to_string(),
                source,
            })?;
        state.tree.extend(table);
        metrics::record_tree_size(state.tree.len());
        Ok(())
    }

    /// Load environment variables starting with `prefix` as flat keys and
    /// bind the environment, so that `reload` reads it again.
    pub fn load_env(&self, prefix: &str) -> Result<()> {
        let table = environment_table(prefix, std::env::vars_os());
        let mut state = self.state();
        let loaded = table.len();
        state.tree.extend(table);
        state.source = Some(SourceBinding::Environment {
            prefix: prefix.to_string(),
        });
        metrics::record_tree_size(state.tree.len());

        tracing::info!(prefix, keys = loaded, "Environment loaded");
        Ok(())
    }

    /// Read and convert the value at top-level `key`.
    ///
    /// Returns `Ok(None)` when the key is absent or holds a table.
    pub fn get<T: 'static>(&self, key: &str) -> Result<Option<T>> {
        let converter = self.registry.get_converter::<T>()?;
        check_flat_key(key)?;
        let raw = self.state().tree.get(key).and_then(ConfigNode::as_leaf).map(str::to_string);
        convert_raw(converter.as_ref(), raw)
    }

    /// Read the value at top-level `key` as a delimited list.
    ///
    /// An absent or empty value yields `Ok(None)`.
    pub fn get_list<T: 'static>(&self, key: &str) -> Result<Option<Vec<T>>> {
        let converter = self.registry.get_converter::<T>()?;
        check_flat_key(key)?;
        let (raw, delimiter) = {
            let state = self.state();
            let raw = state.tree.get(key).and_then(ConfigNode::as_leaf).map(str::to_string);
            (raw, state.delimiter)
        };
        split_raw(converter.as_ref(), raw, delimiter)
    }

    /// Convert `value` with the converter registered for `T` and store it at
    /// top-level `key`.
    pub fn set<T: 'static>(&self, key: &str, value: T) -> Result<()> {
        check_flat_key(key)?;
        let converter = self.registry.get_converter::<T>()?;
        let raw = converter.format(&value);
        self.write_flat(key, raw);
        Ok(())
    }

    /// Store every element of `values`, joined by the delimiter, at
    /// top-level `key`.
    pub fn set_list<T: 'static>(&self, key: &str, values: &[T]) -> Result<()> {
        check_flat_key(key)?;
        check_values(values)?;
        let converter = self.registry.get_converter::<T>()?;
        let mut state = self.state();
        let raw = join_values(converter.as_ref(), values, state.delimiter);
        tracing::debug!(key, value = %raw, "Storing list");
        state.tree.insert(key.to_string(), ConfigNode::Leaf(raw));
        metrics::record_tree_size(state.tree.len());
        Ok(())
    }

    /// Store a string at top-level `key` without conversion.
    pub fn set_raw(&self, key: &str, value: impl Into<String>) -> Result<()> {
        check_flat_key(key)?;
        self.write_flat(key, value.into());
        Ok(())
    }

    fn write_flat(&self, key: &str, raw: String) {
        tracing::debug!(key, value = %raw, "Storing key");
        let mut state = self.state();
        state.tree.insert(key.to_string(), ConfigNode::Leaf(raw));
        metrics::record_tree_size(state.tree.len());
    }

    /// Read and convert the value at dotted `key`, e.g. `db.primary.port`.
    ///
    /// Returns `Ok(None)` when any segment is missing, an intermediate
    /// segment is a leaf, or the addressed node is a table.
    pub fn get_nested<T: 'static>(&self, key: &str) -> Result<Option<T>> {
        let converter = self.registry.get_converter::<T>()?;
        let key = NestedKey::parse(key)?;
        let raw = self.read_nested(&key);
        convert_raw(converter.as_ref(), raw)
    }

    /// Nested counterpart of [`Configuration::get_list`].
    pub fn get_nested_list<T: 'static>(&self, key: &str) -> Result<Option<Vec<T>>> {
        let converter = self.registry.get_converter::<T>()?;
        let key = NestedKey::parse(key)?;
        let (raw, delimiter) = {
            let state = self.state();
            let raw = key.lookup(&state.tree).and_then(ConfigNode::as_leaf).map(str::to_string);
            (raw, state.delimiter)
        };
        split_raw(converter.as_ref(), raw, delimiter)
    }

    /// Convert `value` and store it at dotted `key`, creating intermediate
    /// tables as needed.
    ///
    /// Fails with `InvalidPath` if an intermediate segment holds a value.
    pub fn set_nested<T: 'static>(&self, key: &str, value: T) -> Result<()> {
        let key = NestedKey::parse(key)?;
        let converter = self.registry.get_converter::<T>()?;
        let raw = converter.format(&value);
        tracing::debug!(key = %key, value = %raw, "Storing nested key");
        let mut state = self.state();
        key.insert(&mut state.tree, ConfigNode::Leaf(raw))?;
        metrics::record_tree_size(state.tree.len());
        Ok(())
    }

    /// Nested counterpart of [`Configuration::set_list`].
    pub fn set_nested_list<T: 'static>(&self, key: &str, values: &[T]) -> Result<()> {
        let key = NestedKey::parse(key)?;
        check_values(values)?;
        let converter = self.registry.get_converter::<T>()?;
        let mut state = self.state();
        let raw = join_values(converter.as_ref(), values, state.delimiter);
        tracing::debug!(key = %key, value = %raw, "Storing nested list");
        key.insert(&mut state.tree, ConfigNode::Leaf(raw))?;
        metrics::record_tree_size(state.tree.len());
        Ok(())
    }

    fn read_nested(&self, key: &NestedKey) -> Option<String> {
        let state = self.state();
        key.lookup(&state.tree).and_then(ConfigNode::as_leaf).map(str::to_string)
    }

    /// Whether `key` addresses a node (leaf or table), either as a flat
    /// top-level key or as a dotted path.
    pub fn contains_key(&self, key: &str) -> bool {
        let state = self.state();
        if state.tree.contains_key(key) {
            return true;
        }
        match NestedKey::parse(key) {
            Ok(key) => key.lookup(&state.tree).is_some(),
            Err(_) => false,
        }
    }

    /// Top-level keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.state().tree.keys().cloned().collect()
    }

    /// Deep copy of the tree.
    pub fn snapshot(&self) -> Table {
        self.state().tree.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state().tree.is_empty()
    }

    /// Remove every entry. The source binding is kept.
    pub fn clear(&self) {
        tracing::debug!("Clearing configuration");
        self.state().tree.clear();
        metrics::record_tree_size(0);
    }

    /// Clear the tree and load the bound source again.
    ///
    /// No-op when no source is bound. On failure the tree stays cleared and
    /// `ReloadFailed` is returned: values held before the call are lost.
    pub fn reload(&self) -> Result<()> {
        let mut state = self.state();
        self.reload_locked(&mut state)
    }

    /// Reload only if the bound file changed since it was last loaded.
    ///
    /// Returns whether a reload happened. A missing file or a non-file source
    /// is reported as "no change".
    pub fn reload_if_modified(&self) -> Result<bool> {
        let mut state = self.state();
        let Some(SourceBinding::File { path, last_modified }) = state.source.as_ref() else {
            return Ok(false);
        };
        let Ok(current) = fs::metadata(path).and_then(|meta| meta.modified()) else {
            tracing::debug!(path = %path.display(), "Bound file not readable, skipping reload");
            return Ok(false);
        };
        let changed = match last_modified {
            Some(previous) => current > *previous,
            None => true,
        };
        if !changed {
            return Ok(false);
        }
        tracing::info!(path = %path.display(), "Change detected, reload required");
        self.reload_locked(&mut state)?;
        Ok(true)
    }

    fn reload_locked(&self, state: &mut StoreState) -> Result<()> {
        let Some(source) = state.source.clone() else {
            return Ok(());
        };
        tracing::info!(source = %source, "Reloading configuration");
        state.tree.clear();

        let loaded = match &source {
            SourceBinding::File { path, .. } => {
                read_file(self.adapter.as_ref(), path, state.delimiter)
            }
            SourceBinding::Environment { prefix } => {
                Ok((environment_table(prefix, std::env::vars_os()), None))
            }
        };

        match loaded {
            Ok((table, modified)) => {
                state.tree = table;
                if let Some(binding) = state.source.as_mut() {
                    binding.set_last_modified(modified);
                }
                metrics::record_reload(true);
                metrics::record_tree_size(state.tree.len());
                tracing::info!(source = %source, keys = state.tree.len(), "Reloading done");
                Ok(())
            }
            Err(source_err) => {
                metrics::record_reload(false);
                metrics::record_tree_size(0);
                Err(ConfigError::ReloadFailed {
                    source_name: source.to_string(),
                    source: source_err,
                })
            }
        }
    }

    /// Write the tree to `path` using the store's format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.save_with(self.adapter.as_ref(), path.as_ref())
    }

    /// Write the tree to `path` using `format` instead of the store's own.
    pub fn save_as(&self, path: impl AsRef<Path>, format: Format) -> Result<PathBuf> {
        self.save_with(format.adapter().as_ref(), path.as_ref())
    }

    fn save_with(&self, adapter: &dyn PersistenceAdapter, path: &Path) -> Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidArgument("path is empty".to_string()));
        }
        let state = self.state();
        let result = adapter.store(&state.tree, path);
        metrics::record_save(result.is_ok());
        result.map_err(|source| ConfigError::PersistFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), format = %adapter.format(), "Configuration saved");
        Ok(path.to_path_buf())
    }

    /// Start polling the bound file, reloading whenever its modification
    /// time advances. Replaces a scheduler that is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_polling(self: &Arc<Self>, polling: &PollingConfig) -> Result<()> {
        let scheduler = ReloadScheduler::start(Arc::downgrade(self), polling)?;
        let previous = self
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(scheduler);
        if let Some(previous) = previous {
            previous.stop_polling();
        }
        Ok(())
    }

    /// Stop polling. Safe to call when polling never started.
    pub fn stop_polling(&self) {
        let scheduler = self.scheduler.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(scheduler) = scheduler {
            scheduler.stop_polling();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(ReloadScheduler::is_running)
    }
}

fn check_flat_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(ConfigError::InvalidArgument("key is blank".to_string()));
    }
    Ok(())
}

fn check_values<T>(values: &[T]) -> Result<()> {
    if values.is_empty() {
        return Err(ConfigError::InvalidArgument("list is empty".to_string()));
    }
    Ok(())
}

/// Read the file's modification time, then decode it. Taking the time first
/// means a write racing the read is picked up by the next poll.
fn read_file(
    adapter: &dyn PersistenceAdapter,
    path: &Path,
    delimiter: char,
) -> std::result::Result<(Table, Option<SystemTime>), CodecError> {
    let modified = fs::metadata(path)?.modified().ok();
    let table = adapter.load(path, delimiter)?;
    Ok((table, modified))
}

fn convert_raw<T>(converter: &dyn Converter<T>, raw: Option<String>) -> Result<Option<T>> {
    match raw {
        Some(raw) => Ok(Some(converter.convert(&raw)?)),
        None => Ok(None),
    }
}

fn split_raw<T>(
    converter: &dyn Converter<T>,
    raw: Option<String>,
    delimiter: char,
) -> Result<Option<Vec<T>>> {
    match raw {
        Some(raw) if !raw.is_empty() => {
            let values = raw
                .split(delimiter)
                .map(|item| converter.convert(item))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Some(values))
        }
        _ => Ok(None),
    }
}

fn join_values<T>(converter: &dyn Converter<T>, values: &[T], delimiter: char) -> String {
    let mut buf = [0u8; 4];
    let separator: &str = delimiter.encode_utf8(&mut buf);
    values
        .iter()
        .map(|value| converter.format(value))
        .collect::<Vec<_>>()
        .join(separator)
}
