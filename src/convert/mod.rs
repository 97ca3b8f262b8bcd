//! Typed conversion subsystem.
//!
//! # Data Flow
//! ```text
//! typed get::<T>(key)
//!     → registry.rs looks up Converter<T> by TypeId
//!     → store reads the raw leaf string
//!     → Converter::convert(raw) → T
//!
//! typed set(key, value: T)
//!     → registry.rs looks up Converter<T>
//!     → Converter::format(&value) → String
//!     → store writes the leaf
//! ```
//!
//! # Design Decisions
//! - The type tag is the generic parameter at the call site, not a runtime
//!   inspection of the value
//! - One converter per type; registering again replaces the previous one
//! - Converters are pure: no I/O, failures only on malformed input

pub mod builtin;
pub mod registry;

use crate::error::ConversionError;

/// Bidirectional `String ⇄ T` transformer.
pub trait Converter<T>: Send + Sync {
    /// Parse a raw leaf value.
    fn convert(&self, raw: &str) -> Result<T, ConversionError>;

    /// Render a value as the leaf string stored in the tree.
    fn format(&self, value: &T) -> String;
}

pub use builtin::{DateConverter, DateTimeConverter, FromStrConverter, PathConverter};
pub use registry::ConverterRegistry;
