//! Bidirectional conversion between text and typed values.
//!
//! Every scalar that appears in a document, as an attribute value, a property
//! element or text content, goes through a [`TypeConverter`] looked up by the
//! exact type of the destination field. There is no fallback between types.

mod builtin;

use std::any::{Any, TypeId};
use std::collections::HashMap;

use thiserror::Error;

use crate::error::{BindingError, Result};

pub use builtin::{
    BooleanConverter, DateTimeConverter, DateTimeFormat, EnumConverter, FromStrConverter,
    NaiveDateConverter, StrictBooleanConverter, StringConverter,
};

/// Failure to read a typed value from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot convert '{text}' to {type_name}: {cause}")]
pub struct ConversionError {
    pub type_name: &'static str,
    pub text: String,
    pub cause: String,
}

impl ConversionError {
    /// Create a conversion error.
    #[must_use]
    pub fn new(type_name: &'static str, text: impl Into<String>, cause: impl ToString) -> Self {
        Self {
            type_name,
            text: text.into(),
            cause: cause.to_string(),
        }
    }
}

/// Converts between text and values of one type.
///
/// `write` is total: every value has a textual form.
pub trait TypeConverter<T>: Send + Sync {
    /// Parse a value from document text.
    fn read(&self, text: &str) -> std::result::Result<T, ConversionError>;

    /// Render a value as document text.
    fn write(&self, value: &T) -> String;
}

/// Registry mapping value types to converters.
///
/// Built once per engine and shared read-only by every operation.
pub struct ConverterRegistry {
    converters: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ConverterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Create a registry with the built-in converters.
    ///
    /// | Type | Converter | Policy |
    /// |------|-----------|--------|
    /// | `bool` | [`BooleanConverter`] | lenient: `true`, `1`, `yes` are true, anything else false |
    /// | integers, `f32`, `f64` | [`FromStrConverter`] | strict, surrounding whitespace ignored |
    /// | `String` | [`StringConverter`] | identity |
    /// | `DateTime<FixedOffset>` | [`DateTimeConverter`] | strict, RFC 3339 (RFC 2822 also read) |
    /// | `NaiveDate` | [`NaiveDateConverter`] | strict, `YYYY-MM-DD` |
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<bool>(BooleanConverter);
        registry.register::<String>(StringConverter);

        registry.register::<i8>(FromStrConverter::<i8>::new());
        registry.register::<i16>(FromStrConverter::<i16>::new());
        registry.register::<i32>(FromStrConverter::<i32>::new());
        registry.register::<i64>(FromStrConverter::<i64>::new());
        registry.register::<isize>(FromStrConverter::<isize>::new());
        registry.register::<u8>(FromStrConverter::<u8>::new());
        registry.register::<u16>(FromStrConverter::<u16>::new());
        registry.register::<u32>(FromStrConverter::<u32>::new());
        registry.register::<u64>(FromStrConverter::<u64>::new());
        registry.register::<usize>(FromStrConverter::<usize>::new());
        registry.register::<f32>(FromStrConverter::<f32>::new());
        registry.register::<f64>(FromStrConverter::<f64>::new());

        registry.register::<chrono::DateTime<chrono::FixedOffset>>(DateTimeConverter::default());
        registry.register::<chrono::NaiveDate>(NaiveDateConverter);
        registry
    }

    /// Register a converter for `T`, replacing any previous one.
    pub fn register<T: 'static>(&mut self, converter: impl TypeConverter<T> + 'static) {
        let boxed: Box<dyn TypeConverter<T>> = Box::new(converter);
        self.converters.insert(TypeId::of::<T>(), Box::new(boxed));
    }

    /// Get the converter for `T`.
    pub fn get<T: 'static>(&self) -> Result<&dyn TypeConverter<T>> {
        self.converters
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Box<dyn TypeConverter<T>>>())
            .map(|converter| converter.as_ref())
            .ok_or(BindingError::ConverterNotFound {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Check if a converter is registered for `T`.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered converters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// True if no converter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
