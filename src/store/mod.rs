//! The configuration store.
//!
//! # Data Flow
//! ```text
//! load(path) / load_env(prefix)
//!     → PersistenceAdapter decodes the source
//!     → entries merged into the tree, source bound
//!
//! get::<T>(key) / get_nested::<T>(key)
//!     → registry lookup (fails before touching the tree)
//!     → lock, read leaf, unlock
//!     → Converter::convert
//!
//! set(key, value) / set_nested(key, value)
//!     → Converter::format
//!     → lock, write leaf (creating tables for nested keys), unlock
//!
//! reload()
//!     → lock, clear tree, decode bound source again, unlock
//! ```
//!
//! # Design Decisions
//! - One mutex guards the tree, the bound source and the delimiter; reads
//!   take it too, so no reader ever sees a half-cleared tree during reload
//! - Conversion runs outside the lock
//! - A failed reload leaves the tree cleared; callers must notice the error
//! - Polling is owned by the store and stopped explicitly or on drop

pub mod binding;
pub mod configuration;

pub use binding::SourceBinding;
pub use configuration::{Configuration, DEFAULT_DELIMITER};
