//! Type-keyed converter registry.

use std::any::{Any, TypeId};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use url::Url;

use crate::convert::builtin::{DateConverter, DateTimeConverter, FromStrConverter, PathConverter};
use crate::convert::Converter;
use crate::error::{ConfigError, Result};

/// Registered converter, type-erased. Always holds an `Arc<dyn Converter<T>>`
/// for the `T` whose `TypeId` keys the entry.
type ErasedConverter = Arc<dyn Any + Send + Sync>;

/// Maps a type to its active [`Converter`].
///
/// Shared between stores via `Arc`; lookups and registrations may happen
/// concurrently.
pub struct ConverterRegistry {
    converters: DashMap<TypeId, ErasedConverter>,
}

impl ConverterRegistry {
    /// Create a registry seeded with the default converters.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.load_defaults();
        registry
    }

    /// Create a registry with no converters at all.
    pub fn empty() -> Self {
        Self {
            converters: DashMap::new(),
        }
    }

    fn load_defaults(&self) {
        self.add_converter::<i32, _>(FromStrConverter::new());
        self.add_converter::<i64, _>(FromStrConverter::new());
        self.add_converter::<f64, _>(FromStrConverter::new());
        self.add_converter::<f32, _>(FromStrConverter::new());
        self.add_converter::<i8, _>(FromStrConverter::new());
        self.add_converter::<u8, _>(FromStrConverter::new());
        self.add_converter::<bool, _>(FromStrConverter::new());
        self.add_converter::<String, _>(FromStrConverter::new());
        self.add_converter::<Url, _>(FromStrConverter::new());
        self.add_converter::<PathBuf, _>(PathConverter);
        self.add_converter::<NaiveDate, _>(DateConverter::default());
        self.add_converter::<NaiveDateTime, _>(DateTimeConverter::default());
    }

    /// Register `converter` for `T`, replacing any previous one.
    pub fn add_converter<T, C>(&self, converter: C)
    where
        T: 'static,
        C: Converter<T> + 'static,
    {
        let converter: Arc<dyn Converter<T>> = Arc::new(converter);
        self.converters.insert(TypeId::of::<T>(), Arc::new(converter));
        tracing::debug!(type_name = std::any::type_name::<T>(), "Converter registered");
    }

    /// Look up the converter for `T`.
    pub fn get_converter<T: 'static>(&self) -> Result<Arc<dyn Converter<T>>> {
        self.converters
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value().downcast_ref::<Arc<dyn Converter<T>>>().cloned())
            .ok_or(ConfigError::ConverterNotFound {
                type_name: std::any::type_name::<T>(),
            })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Remove every converter, defaults included.
    pub fn clear(&self) {
        self.converters.clear();
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
