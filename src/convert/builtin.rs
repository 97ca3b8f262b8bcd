//! Converters registered by default.

use std::fmt::Display;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};

use crate::convert::Converter;
use crate::error::ConversionError;

/// Pattern used by [`DateConverter::default`].
pub const DEFAULT_DATE_PATTERN: &str = "%m/%d/%Y";

/// Pattern used by [`DateTimeConverter::default`].
pub const DEFAULT_DATE_TIME_PATTERN: &str = "%Y-%m-%dT%H:%M:%S";

/// Converter for any type with a `FromStr`/`Display` pair.
///
/// Covers the numeric primitives, `bool`, `String` and `url::Url`.
pub struct FromStrConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> FromStrConverter<T> {
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }
}

impl<T> Default for FromStrConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Converter<T> for FromStrConverter<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    fn convert(&self, raw: &str) -> Result<T, ConversionError> {
        raw.parse::<T>().map_err(|e| ConversionError::new::<T>(raw, e))
    }

    fn format(&self, value: &T) -> String {
        value.to_string()
    }
}

/// File path converter. Any string is a valid path.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathConverter;

impl Converter<PathBuf> for PathConverter {
    fn convert(&self, raw: &str) -> Result<PathBuf, ConversionError> {
        Ok(PathBuf::from(raw))
    }

    fn format(&self, value: &PathBuf) -> String {
        value.to_string_lossy().into_owned()
    }
}

/// Calendar date converter using a `chrono` format pattern.
#[derive(Debug, Clone)]
pub struct DateConverter {
    pattern: String,
}

impl DateConverter {
    /// Create a converter for the given pattern, e.g. `%Y-%m-%d`.
    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into() }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Default for DateConverter {
    fn default() -> Self {
        Self::with_pattern(DEFAULT_DATE_PATTERN)
    }
}

impl Converter<NaiveDate> for DateConverter {
    fn convert(&self, raw: &str) -> Result<NaiveDate, ConversionError> {
        NaiveDate::parse_from_str(raw, &self.pattern)
            .map_err(|e| ConversionError::new::<NaiveDate>(raw, e))
    }

    fn format(&self, value: &NaiveDate) -> String {
        value.format(&self.pattern).to_string()
    }
}

/// Date and time converter using a `chrono` format pattern.
#[derive(Debug, Clone)]
pub struct DateTimeConverter {
    pattern: String,
}

impl DateTimeConverter {
    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into() }
    }
}

impl Default for DateTimeConverter {
    fn default() -> Self {
        Self::with_pattern(DEFAULT_DATE_TIME_PATTERN)
    }
}

impl Converter<NaiveDateTime> for DateTimeConverter {
    fn convert(&self, raw: &str) -> Result<NaiveDateTime, ConversionError> {
        NaiveDateTime::parse_from_str(raw, &self.pattern)
            .map_err(|e| ConversionError::new::<NaiveDateTime>(raw, e))
    }

    fn format(&self, value: &NaiveDateTime) -> String {
        value.format(&self.pattern).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_integer_conversion() {
        let converter = FromStrConverter::<i32>::new();
        assert_eq!(converter.convert("42").unwrap(), 42);
        assert_eq!(converter.format(&-7), "-7");
        assert!(converter.convert("4x2").is_err());
    }

    #[test]
    fn test_byte_overflow_rejected() {
        let converter = FromStrConverter::<i8>::new();
        assert_eq!(converter.convert("-128").unwrap(), -128);
        assert!(converter.convert("128").is_err());
    }

    #[test]
    fn test_date_default_pattern() {
        let converter = DateConverter::default();
        let date = converter.convert("02/23/2012").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2012, 2, 23).unwrap());
        assert_eq!(converter.format(&date), "02/23/2012");
    }

    #[test]
    fn test_date_custom_pattern() {
        let converter = DateConverter::with_pattern("%Y-%m-%d");
        assert_eq!(converter.pattern(), "%Y-%m-%d");
        let date = converter.convert("2012-02-23").unwrap();
        assert_eq!(converter.format(&date), "2012-02-23");
        assert!(converter.convert("02/23/2012").is_err());
    }

    #[test]
    fn test_malformed_date_reports_target() {
        let err = DateConverter::default().convert("not a date").unwrap_err();
        assert_eq!(err.input, "not a date");
        assert!(err.target.contains("NaiveDate"));
    }

    #[test]
    fn test_date_time() {
        let converter = DateTimeConverter::default();
        let value = converter.convert("2024-05-01T08:30:00").unwrap();
        assert_eq!(converter.format(&value), "2024-05-01T08:30:00");
    }

    #[test]
    fn test_url_and_path() {
        let urls = FromStrConverter::<Url>::new();
        let url = urls.convert("https://example.com/a?b=c").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert!(urls.convert("not a uri").is_err());

        let paths = PathConverter;
        let path = paths.convert("/tmp/app.yaml").unwrap();
        assert_eq!(paths.format(&path), "/tmp/app.yaml");
    }
}
