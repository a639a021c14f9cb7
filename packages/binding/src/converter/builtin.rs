//! Built-in converters.

use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};

use super::{ConversionError, TypeConverter};

/// Lenient boolean converter.
///
/// `true`, `1` and `yes` (case-insensitive, surrounding whitespace ignored) read as
/// `true`. Every other text, including `banana`, reads as `false` and never fails.
/// Writes `true` or `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl TypeConverter<bool> for BooleanConverter {
    fn read(&self, text: &str) -> Result<bool, ConversionError> {
        let text = text.trim();
        Ok(["true", "1", "yes"]
            .iter()
            .any(|candidate| text.eq_ignore_ascii_case(candidate)))
    }

    fn write(&self, value: &bool) -> String {
        value.to_string()
    }
}

/// Strict boolean converter.
///
/// Accepts `true`/`false`, `1`/`0` and `yes`/`no`, anything else is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictBooleanConverter;

impl TypeConverter<bool> for StrictBooleanConverter {
    fn read(&self, text: &str) -> Result<bool, ConversionError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConversionError::new(
                "bool",
                text,
                "expected true/false, 1/0 or yes/no",
            )),
        }
    }

    fn write(&self, value: &bool) -> String {
        value.to_string()
    }
}

/// Identity converter for text.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringConverter;

impl TypeConverter<String> for StringConverter {
    fn read(&self, text: &str) -> Result<String, ConversionError> {
        Ok(text.to_string())
    }

    fn write(&self, value: &String) -> String {
        value.clone()
    }
}

/// Strict converter for any `FromStr + Display` type, used for numbers.
///
/// Surrounding whitespace is ignored; anything `FromStr` rejects is an error.
pub struct FromStrConverter<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> FromStrConverter<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T> Default for FromStrConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypeConverter<T> for FromStrConverter<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    fn read(&self, text: &str) -> Result<T, ConversionError> {
        text.trim()
            .parse()
            .map_err(|err: T::Err| ConversionError::new(std::any::type_name::<T>(), text, err))
    }

    fn write(&self, value: &T) -> String {
        value.to_string()
    }
}

/// Converter for enumerations by variant name.
///
/// `name_of` gives the name of every value, so writing is total; an exhaustive
/// `match` makes the compiler check that no variant is forgotten. Reading accepts
/// the names of the listed `values`.
///
/// # Examples
/// ```
/// use regelrecht_binding::converter::{EnumConverter, TypeConverter};
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Shelf {
///     Fiction,
///     Poetry,
/// }
///
/// let converter = EnumConverter::new([Shelf::Fiction, Shelf::Poetry], |shelf| match shelf {
///     Shelf::Fiction => "fiction",
///     Shelf::Poetry => "poetry",
/// });
/// assert_eq!(converter.read("poetry").unwrap(), Shelf::Poetry);
/// assert!(converter.read("cooking").is_err());
/// assert_eq!(converter.write(&Shelf::Fiction), "fiction");
/// ```
pub struct EnumConverter<T> {
    values: Vec<T>,
    name_of: fn(&T) -> &'static str,
}

impl<T> EnumConverter<T> {
    /// Create a converter for `values`, named by `name_of`.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = T>, name_of: fn(&T) -> &'static str) -> Self {
        Self {
            values: values.into_iter().collect(),
            name_of,
        }
    }
}

impl<T> TypeConverter<T> for EnumConverter<T>
where
    T: Clone + Send + Sync,
{
    fn read(&self, text: &str) -> Result<T, ConversionError> {
        let wanted = text.trim();
        self.values
            .iter()
            .find(|value| (self.name_of)(value) == wanted)
            .cloned()
            .ok_or_else(|| {
                let names: Vec<&str> = self.values.iter().map(self.name_of).collect();
                ConversionError::new(
                    std::any::type_name::<T>(),
                    text,
                    format!("expected one of: {}", names.join(", ")),
                )
            })
    }

    fn write(&self, value: &T) -> String {
        (self.name_of)(value).to_string()
    }
}

/// Output format of [`DateTimeConverter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateTimeFormat {
    /// `2024-05-01T09:30:00+02:00`
    #[default]
    Rfc3339,
    /// `Wed, 01 May 2024 09:30:00 +0200`, as used by RSS.
    Rfc2822,
}

/// Strict converter for timestamps with offset.
///
/// Reads RFC 3339 and RFC 2822 regardless of the configured output format.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeConverter {
    format: DateTimeFormat,
}

impl DateTimeConverter {
    #[must_use]
    pub fn new(format: DateTimeFormat) -> Self {
        Self { format }
    }
}

impl TypeConverter<DateTime<FixedOffset>> for DateTimeConverter {
    fn read(&self, text: &str) -> Result<DateTime<FixedOffset>, ConversionError> {
        let trimmed = text.trim();
        DateTime::parse_from_rfc3339(trimmed)
            .or_else(|_| DateTime::parse_from_rfc2822(trimmed))
            .map_err(|err| ConversionError::new("DateTime<FixedOffset>", text, err))
    }

    fn write(&self, value: &DateTime<FixedOffset>) -> String {
        match self.format {
            DateTimeFormat::Rfc3339 => value.to_rfc3339(),
            DateTimeFormat::Rfc2822 => value.to_rfc2822(),
        }
    }
}

/// Strict converter for `YYYY-MM-DD` dates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveDateConverter;

impl TypeConverter<NaiveDate> for NaiveDateConverter {
    fn read(&self, text: &str) -> Result<NaiveDate, ConversionError> {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|err| ConversionError::new("NaiveDate", text, err))
    }

    fn write(&self, value: &NaiveDate) -> String {
        value.format("%Y-%m-%d").to_string()
    }
}
