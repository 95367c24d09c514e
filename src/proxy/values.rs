//! Builders for hand-written field values.
//!
//! Schema defaults and test fixtures use these to produce the same indexed shape decoded
//! properties have. Each helper takes plain values or `Option`s; the position in the input
//! is the array index, and a `None` leaves that index unset.
//!
//! ```rust
//! use uepkg::proxy::values::{floats, strings};
//! use uepkg::package::properties::PropertyValue;
//!
//! let stats = floats([Some(100.0_f32), None, Some(0.5)]);
//! assert_eq!(stats.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
//! assert_eq!(stats[&2], PropertyValue::Float(0.5));
//!
//! let names = strings(["Dodo"]);
//! assert_eq!(names[&0], PropertyValue::Str("Dodo".into()));
//! ```

use crate::package::properties::{FieldValues, PropertyValue};

fn indexed<I, T>(values: I, wrap: impl Fn(T) -> PropertyValue) -> FieldValues
where
    I: IntoIterator,
    I::Item: Into<Option<T>>,
{
    values
        .into_iter()
        .zip(0u32..)
        .filter_map(|(value, index)| value.into().map(|value| (index, wrap(value))))
        .collect()
}

/// Float field values.
pub fn floats<I>(values: I) -> FieldValues
where
    I: IntoIterator,
    I::Item: Into<Option<f32>>,
{
    indexed(values, PropertyValue::Float)
}

/// Byte field values.
pub fn bytes<I>(values: I) -> FieldValues
where
    I: IntoIterator,
    I::Item: Into<Option<u8>>,
{
    indexed(values, PropertyValue::Byte)
}

/// Enum-valued byte field values; every value belongs to `enum_name`.
pub fn enums<'a, I>(enum_name: &str, values: I) -> FieldValues
where
    I: IntoIterator,
    I::Item: Into<Option<&'a str>>,
{
    indexed(values, |value: &str| PropertyValue::Enum {
        enum_name: enum_name.to_string(),
        value: value.to_string(),
    })
}

/// Boolean field values.
pub fn bools<I>(values: I) -> FieldValues
where
    I: IntoIterator,
    I::Item: Into<Option<bool>>,
{
    indexed(values, PropertyValue::Bool)
}

/// Integer field values.
pub fn ints<I>(values: I) -> FieldValues
where
    I: IntoIterator,
    I::Item: Into<Option<i32>>,
{
    indexed(values, PropertyValue::Int)
}

/// String field values.
pub fn strings<'a, I>(values: I) -> FieldValues
where
    I: IntoIterator,
    I::Item: Into<Option<&'a str>>,
{
    indexed(values, |value: &str| PropertyValue::Str(value.to_string()))
}
