//! Scalar text ⇄ value conversion.

use crate::{Error, Result};
use std::any::{Any, TypeId, type_name};
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;
use std::sync::Arc;

/// Bidirectional scalar ⇄ text conversion, pluggable per type.
///
/// Converters are consulted in registration order; the first converter whose
/// `can_convert` answers true for a type wins. Registering a custom
/// converter ahead of the defaults is how it takes precedence for a type the
/// defaults already cover.
pub trait TypeConverter: Send + Sync {
    /// True when this converter handles values of the given type.
    fn can_convert(&self, type_id: TypeId) -> bool;

    /// Parse `text` into a value, honoring the optional format string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conversion`] when the text is not parseable for the
    /// target type.
    fn from_text(&self, text: &str, format: Option<&str>) -> Result<Box<dyn Any>>;

    /// Render a value as text, honoring the optional format string.
    ///
    /// # Errors
    ///
    /// Returns an error when `value` is not of a type this converter
    /// accepts.
    fn to_text(&self, value: &dyn Any, format: Option<&str>) -> Result<String>;
}

/// Converter for any scalar that parses from and displays as plain text.
///
/// Covers the primitive types; the format string is ignored here, it exists
/// for custom converters that need one.
pub struct ScalarConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ScalarConverter<T> {
    /// Create the converter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ScalarConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypeConverter for ScalarConverter<T>
where
    T: FromStr + Display + Send + Sync + 'static,
    T::Err: Display,
{
    fn can_convert(&self, type_id: TypeId) -> bool {
        type_id == TypeId::of::<T>()
    }

    fn from_text(&self, text: &str, _format: Option<&str>) -> Result<Box<dyn Any>> {
        match text.parse::<T>() {
            Ok(value) => Ok(Box::new(value)),
            Err(err) => Err(Error::Conversion {
                field: String::new(),
                text: text.to_string(),
                message: format!("not a valid {}: {}", type_name::<T>(), err),
            }),
        }
    }

    fn to_text(&self, value: &dyn Any, _format: Option<&str>) -> Result<String> {
        value
            .downcast_ref::<T>()
            .map(ToString::to_string)
            .ok_or_else(|| Error::TypeMismatch {
                field: String::new(),
                expected: type_name::<T>().to_string(),
            })
    }
}

/// The built-in converter set, one per supported primitive type.
#[must_use]
pub fn default_converters() -> Vec<Arc<dyn TypeConverter>> {
    vec![
        Arc::new(ScalarConverter::<String>::new()),
        Arc::new(ScalarConverter::<bool>::new()),
        Arc::new(ScalarConverter::<i32>::new()),
        Arc::new(ScalarConverter::<i64>::new()),
        Arc::new(ScalarConverter::<u32>::new()),
        Arc::new(ScalarConverter::<u64>::new()),
        Arc::new(ScalarConverter::<f32>::new()),
        Arc::new(ScalarConverter::<f64>::new()),
    ]
}
