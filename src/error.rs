//! Error definitions shared by every subsystem.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed underlying failure carried by [`ConversionError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the configuration store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No converter is registered for the requested type.
    #[error("no converter registered for {type_name}")]
    ConverterNotFound { type_name: &'static str },

    /// A registered converter rejected the stored value.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Blank key, empty list or invalid scheduler parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed nested key.
    #[error("invalid key '{0}'")]
    InvalidKey(String),

    /// A nested write walked into a leaf where a table was expected.
    #[error("invalid path '{key}': segment '{segment}' holds a value, not a table")]
    InvalidPath { key: String, segment: String },

    /// The initial load of a source failed.
    #[error("unable to load {source_name}")]
    LoadFailed {
        source_name: String,
        #[source]
        source: CodecError,
    },

    /// Reload failed after the tree had already been cleared.
    #[error("unable to reload {source_name}")]
    ReloadFailed {
        source_name: String,
        #[source]
        source: CodecError,
    },

    /// Saving the tree to disk failed.
    #[error("unable to save configuration to {}", path.display())]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: CodecError,
    },
}

/// A converter could not turn a raw string into its target type.
#[derive(Debug, Error)]
#[error("conversion of '{input}' to {target} failed")]
pub struct ConversionError {
    pub input: String,
    pub target: &'static str,
    #[source]
    pub source: BoxError,
}

impl ConversionError {
    /// Wrap a parse failure for `input` targeting `T`.
    pub fn new<T: ?Sized>(input: &str, source: impl Into<BoxError>) -> Self {
        Self {
            input: input.to_string(),
            target: std::any::type_name::<T>(),
            source: source.into(),
        }
    }
}

/// Failures of a persistence adapter while reading or writing a source.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("properties error at line {line}: {message}")]
    Properties { line: usize, message: String },

    /// The document has a shape the tree cannot hold.
    #[error("unsupported document: {0}")]
    Unsupported(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::ConverterNotFound { type_name: "u128" };
        assert_eq!(err.to_string(), "no converter registered for u128");

        let err = ConfigError::InvalidPath {
            key: "a.b.c".into(),
            segment: "b".into(),
        };
        assert!(err.to_string().contains("segment 'b'"));
    }

    #[test]
    fn test_conversion_error_keeps_source() {
        let parse = "abc".parse::<i32>().unwrap_err();
        let err = ConversionError::new::<i32>("abc", parse);
        assert_eq!(err.target, "i32");
        assert!(err.to_string().contains("'abc'"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
