//! Tagged property lists.
//!
//! The body of every export starts with a list of tagged properties. Each tag names the
//! property, its type and the byte size of its value, so unknown types can be skipped
//! without losing track of the list. The list ends at a `None` name or at the end of the
//! export's serial region, depending on the configured [`crate::PropertyBoundary`].
//!
//! # Tag layout
//!
//! | Field          | Type                                      |
//! |----------------|-------------------------------------------|
//! | name           | name reference                            |
//! | type           | name reference                            |
//! | size           | `i32`, byte size of the value             |
//! | array index    | `i32`                                     |
//! | type data      | struct name + GUID, bool value, enum name or inner type |
//! | has guid       | `u8` + 16 bytes, on newer engine versions |
//! | value          | `size` bytes                              |
//!
//! Properties are keyed by name *and* array index: fixed-size arrays are written as one
//! tag per element, and indices may be sparse.

mod decoder;
mod value;

use std::collections::BTreeMap;

use serde::{ser::SerializeMap, Serialize, Serializer};

pub(crate) use decoder::PropertyDecoder;
pub use value::{format_guid, ObjectValue, PropertyValue, StructValue};

/// Values of one field, keyed by array index.
///
/// Indices may be sparse: a field can carry values at 0 and 3 with nothing in between.
pub type FieldValues = BTreeMap<u32, PropertyValue>;

/// One decoded tagged property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Property type name, e.g. `FloatProperty`
    pub type_name: String,
    /// Array index of this element
    pub index: u32,
    /// Decoded value
    pub value: PropertyValue,
}

/// The decoded tagged property list of an export or struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyList {
    properties: Vec<Property>,
    end: usize,
}

impl PropertyList {
    pub(crate) fn new(properties: Vec<Property>, end: usize) -> PropertyList {
        PropertyList { properties, end }
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if the list holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over the properties in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    /// Absolute offset just past the list (after the terminator, if there was one).
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Looks up one value by name and array index.
    #[must_use]
    pub fn get(&self, name: &str, index: u32) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|property| property.index == index && property.name == name)
            .map(|property| &property.value)
    }

    /// Groups the list into field name → index → value.
    ///
    /// If a name/index pair appears more than once the last occurrence wins.
    #[must_use]
    pub fn field_map(&self) -> BTreeMap<String, FieldValues> {
        let mut fields: BTreeMap<String, FieldValues> = BTreeMap::new();
        for property in &self.properties {
            fields
                .entry(property.name.clone())
                .or_default()
                .insert(property.index, property.value.clone());
        }
        fields
    }
}

impl<'a> IntoIterator for &'a PropertyList {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Serialize for PropertyList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.properties.len()))?;
        for property in &self.properties {
            if property.index == 0 {
                map.serialize_entry(&property.name, &property.value)?;
            } else {
                map.serialize_entry(
                    &format!("{}[{}]", property.name, property.index),
                    &property.value,
                )?;
            }
        }
        map.end()
    }
}
