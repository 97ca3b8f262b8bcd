//! Persistence adapters: bytes on disk ⇄ configuration tree.
//!
//! # Data Flow
//! ```text
//! load:  file → fs::read_to_string → PersistenceAdapter::decode → Table
//! save:  Table → PersistenceAdapter::encode → fs::write → file
//! ```
//!
//! # Design Decisions
//! - The store only sees the trait; it never inspects file grammar
//! - Scalars of every kind become leaf strings, typing is left to converters
//! - Sequences of scalars become one leaf joined with the store delimiter so
//!   that `get_list` reads them back
//! - Formats are picked from the file extension when not given explicitly

pub mod json;
pub mod properties;
pub mod toml;
pub mod yaml;

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::CodecError;
use crate::tree::Table;

/// Reads and writes the tree in one concrete file format.
pub trait PersistenceAdapter: Send + Sync {
    /// The format this adapter speaks.
    fn format(&self) -> Format;

    /// Parse a document. Scalar sequences are joined with `delimiter`.
    fn decode(&self, input: &str, delimiter: char) -> Result<Table, CodecError>;

    /// Render the tree as a document.
    fn encode(&self, table: &Table) -> Result<String, CodecError>;

    /// Read and decode the file at `path`.
    fn load(&self, path: &Path, delimiter: char) -> Result<Table, CodecError> {
        let content = fs::read_to_string(path)?;
        self.decode(&content, delimiter)
    }

    /// Encode `table` and write it to `path`, replacing any existing file.
    fn store(&self, table: &Table, path: &Path) -> Result<(), CodecError> {
        let content = self.encode(table)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Properties,
    Yaml,
    Json,
    Toml,
}

impl Format {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "properties" => Some(Format::Properties),
            "yaml" | "yml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    /// The adapter implementing this format.
    pub fn adapter(self) -> Arc<dyn PersistenceAdapter> {
        match self {
            Format::Properties => Arc::new(properties::PropertiesAdapter),
            Format::Yaml => Arc::new(yaml::YamlAdapter),
            Format::Json => Arc::new(json::JsonAdapter),
            Format::Toml => Arc::new(toml::TomlAdapter),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Properties => "properties",
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Toml => "toml",
        };
        f.write_str(name)
    }
}

/// Join already stringified sequence items into a single leaf.
pub(crate) fn join_items(items: Vec<String>, delimiter: char) -> String {
    let mut buf = [0u8; 4];
    items.join(&*delimiter.encode_utf8(&mut buf))
}
