//! Typed, hierarchical configuration store.
//!
//! # Architecture Overview
//!
//! ```text
//!   get::<T>(key) / set(key, value)
//!            │
//!            ▼
//!   ┌──────────────────┐     ┌──────────────────┐
//!   │  store           │────▶│  convert         │  Converter<T> by type
//!   │  Configuration   │     │  registry        │
//!   └────────┬─────────┘     └──────────────────┘
//!            │
//!            ▼
//!   ┌──────────────────┐     ┌──────────────────┐
//!   │  tree            │     │  persistence     │  properties / yaml /
//!   │  NestedKey/Table │     │  adapters        │  json / toml
//!   └──────────────────┘     └────────▲─────────┘
//!                                     │ load / reload / save
//!   ┌──────────────────┐              │
//!   │  reload          │──────────────┘
//!   │  poller/watcher  │
//!   └──────────────────┘
//! ```
//!
//! ```no_run
//! use config_store::Configuration;
//!
//! # fn main() -> config_store::Result<()> {
//! let config = Configuration::open("app.yaml")?;
//! let port: Option<i32> = config.get_nested("server.port")?;
//! config.set_nested("server.port", port.unwrap_or(8080) + 1)?;
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod error;
pub mod observability;
pub mod persistence;
pub mod reload;
pub mod store;
pub mod tree;

pub use convert::{Converter, ConverterRegistry};
pub use error::{CodecError, ConfigError, ConversionError, Result};
pub use persistence::{Format, PersistenceAdapter};
pub use reload::{ConfigWatcher, PollingConfig, ReloadScheduler, TimeUnit};
pub use store::{Configuration, SourceBinding};
pub use tree::{ConfigNode, NestedKey, Table};
