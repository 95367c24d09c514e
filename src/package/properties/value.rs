//! Decoded property values.
//!
//! Every value knows how to describe itself as a JSON document through its
//! [`serde::Serialize`] implementation. Scalars serialise as themselves, enum values as their
//! value name, object references as their full path, and structs as maps.

use std::fmt;

use serde::{ser::SerializeMap, Serialize, Serializer};

use crate::package::{objects::ObjectRef, properties::PropertyList};

/// A decoded object reference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    /// The validated table reference
    pub reference: ObjectRef,
    /// Full path of the referenced object; `None` for null references
    pub path: Option<String>,
}

/// A decoded struct value.
#[derive(Debug, Clone, PartialEq)]
pub enum StructValue {
    /// Three-component float vector
    Vector {
        /// X component
        x: f32,
        /// Y component
        y: f32,
        /// Z component
        z: f32,
    },
    /// Two-component float vector
    Vector2D {
        /// X component
        x: f32,
        /// Y component
        y: f32,
    },
    /// Rotation in degrees
    Rotator {
        /// Pitch
        pitch: f32,
        /// Yaw
        yaw: f32,
        /// Roll
        roll: f32,
    },
    /// Linear float colour
    LinearColor {
        /// Red
        r: f32,
        /// Green
        g: f32,
        /// Blue
        b: f32,
        /// Alpha
        a: f32,
    },
    /// 8-bit colour, stored as BGRA
    Color {
        /// Red
        r: u8,
        /// Green
        g: u8,
        /// Blue
        b: u8,
        /// Alpha
        a: u8,
    },
    /// 128-bit identifier
    Guid([u8; 16]),
    /// Any other struct, stored as its own tagged property list
    Tagged(PropertyList),
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `IntProperty`
    Int(i32),
    /// `Int8Property`
    Int8(i8),
    /// `Int16Property`
    Int16(i16),
    /// `Int64Property`
    Int64(i64),
    /// `UInt32Property`
    UInt32(u32),
    /// `UInt64Property`
    UInt64(u64),
    /// `FloatProperty`
    Float(f32),
    /// `DoubleProperty`
    Double(f64),
    /// `BoolProperty`; the value lives in the tag
    Bool(bool),
    /// `ByteProperty` without an enum
    Byte(u8),
    /// `ByteProperty` or `EnumProperty` holding an enum value name
    Enum {
        /// The enum type, e.g. `EPrimalItemType`
        enum_name: String,
        /// The value name, e.g. `EPrimalItemType::Resource`
        value: String,
    },
    /// `NameProperty`
    Name(String),
    /// `StrProperty`
    Str(String),
    /// `ObjectProperty` or `ClassProperty`
    Object(ObjectValue),
    /// `StructProperty`
    Struct {
        /// Struct type name, e.g. `Vector`
        struct_name: String,
        /// The decoded struct
        value: Box<StructValue>,
    },
    /// `ArrayProperty`
    Array(Vec<PropertyValue>),
    /// A property type this decoder does not know; the raw value bytes are kept
    Unknown {
        /// The property type name
        type_name: String,
        /// Raw value bytes
        data: Vec<u8>,
    },
}

impl PropertyValue {
    /// Returns the value as an `f64` if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            PropertyValue::Int(v) => Some(f64::from(v)),
            PropertyValue::Int8(v) => Some(f64::from(v)),
            PropertyValue::Int16(v) => Some(f64::from(v)),
            #[allow(clippy::cast_precision_loss)]
            PropertyValue::Int64(v) => Some(v as f64),
            PropertyValue::UInt32(v) => Some(f64::from(v)),
            #[allow(clippy::cast_precision_loss)]
            PropertyValue::UInt64(v) => Some(v as f64),
            PropertyValue::Float(v) => Some(f64::from(v)),
            PropertyValue::Double(v) => Some(v),
            PropertyValue::Byte(v) => Some(f64::from(v)),
            _ => None,
        }
    }

    /// Returns the value as a boolean if it is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            PropertyValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the text of string-like values (`Str`, `Name` and enum value names).
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(v) | PropertyValue::Name(v) => Some(v),
            PropertyValue::Enum { value, .. } => Some(value),
            PropertyValue::Object(object) => object.path.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the value carries no information: zero, `false`, an empty string,
    /// a null object or an empty array.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            PropertyValue::Bool(v) => !v,
            PropertyValue::Str(v) | PropertyValue::Name(v) => v.is_empty() || v == "None",
            PropertyValue::Object(object) => object.reference.is_null(),
            PropertyValue::Array(items) => items.is_empty(),
            PropertyValue::Enum { .. } | PropertyValue::Struct { .. } => false,
            PropertyValue::Unknown { data, .. } => data.is_empty(),
            other => other.as_f64() == Some(0.0),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Int8(v) => write!(f, "{v}"),
            PropertyValue::Int16(v) => write!(f, "{v}"),
            PropertyValue::Int64(v) => write!(f, "{v}"),
            PropertyValue::UInt32(v) => write!(f, "{v}"),
            PropertyValue::UInt64(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Double(v) => write!(f, "{v}"),
            PropertyValue::Bool(v) => write!(f, "{v}"),
            PropertyValue::Byte(v) => write!(f, "{v}"),
            PropertyValue::Enum { value, .. } => f.write_str(value),
            PropertyValue::Name(v) => f.write_str(v),
            PropertyValue::Str(v) => write!(f, "{v:?}"),
            PropertyValue::Object(object) => match &object.path {
                Some(path) => f.write_str(path),
                None => f.write_str("null"),
            },
            PropertyValue::Struct { struct_name, value } => match value.as_ref() {
                StructValue::Tagged(list) => write!(f, "{struct_name}({} properties)", list.len()),
                native => write!(f, "{struct_name}{native}"),
            },
            PropertyValue::Array(items) => write!(f, "[{} items]", items.len()),
            PropertyValue::Unknown { type_name, data } => {
                write!(f, "<{type_name}: {} bytes>", data.len())
            }
        }
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructValue::Vector { x, y, z } => write!(f, "({x}, {y}, {z})"),
            StructValue::Vector2D { x, y } => write!(f, "({x}, {y})"),
            StructValue::Rotator { pitch, yaw, roll } => write!(f, "({pitch}, {yaw}, {roll})"),
            StructValue::LinearColor { r, g, b, a } => write!(f, "({r}, {g}, {b}, {a})"),
            StructValue::Color { r, g, b, a } => write!(f, "({r}, {g}, {b}, {a})"),
            StructValue::Guid(bytes) => f.write_str(&format_guid(bytes)),
            StructValue::Tagged(list) => write!(f, "({} properties)", list.len()),
        }
    }
}

/// Formats a GUID as four upper-case hex groups of its little-endian `u32` components.
#[must_use]
pub fn format_guid(bytes: &[u8; 16]) -> String {
    bytes
        .chunks_exact(4)
        .map(|chunk| format!("{:08X}", u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])))
        .collect::<Vec<_>>()
        .join("-")
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Int(v) => serializer.serialize_i32(*v),
            PropertyValue::Int8(v) => serializer.serialize_i8(*v),
            PropertyValue::Int16(v) => serializer.serialize_i16(*v),
            PropertyValue::Int64(v) => serializer.serialize_i64(*v),
            PropertyValue::UInt32(v) => serializer.serialize_u32(*v),
            PropertyValue::UInt64(v) => serializer.serialize_u64(*v),
            PropertyValue::Float(v) => serializer.serialize_f32(*v),
            PropertyValue::Double(v) => serializer.serialize_f64(*v),
            PropertyValue::Bool(v) => serializer.serialize_bool(*v),
            PropertyValue::Byte(v) => serializer.serialize_u8(*v),
            PropertyValue::Enum { value, .. } => serializer.serialize_str(value),
            PropertyValue::Name(v) | PropertyValue::Str(v) => serializer.serialize_str(v),
            PropertyValue::Object(object) => match &object.path {
                Some(path) => serializer.serialize_str(path),
                None => serializer.serialize_none(),
            },
            PropertyValue::Struct { value, .. } => value.serialize(serializer),
            PropertyValue::Array(items) => items.serialize(serializer),
            PropertyValue::Unknown { type_name, data } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", type_name)?;
                map.serialize_entry("size", &data.len())?;
                map.end()
            }
        }
    }
}

impl Serialize for StructValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StructValue::Vector { x, y, z } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("x", x)?;
                map.serialize_entry("y", y)?;
                map.serialize_entry("z", z)?;
                map.end()
            }
            StructValue::Vector2D { x, y } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("x", x)?;
                map.serialize_entry("y", y)?;
                map.end()
            }
            StructValue::Rotator { pitch, yaw, roll } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("pitch", pitch)?;
                map.serialize_entry("yaw", yaw)?;
                map.serialize_entry("roll", roll)?;
                map.end()
            }
            StructValue::LinearColor { r, g, b, a } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("r", r)?;
                map.serialize_entry("g", g)?;
                map.serialize_entry("b", b)?;
                map.serialize_entry("a", a)?;
                map.end()
            }
            StructValue::Color { r, g, b, a } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("r", r)?;
                map.serialize_entry("g", g)?;
                map.serialize_entry("b", b)?;
                map.serialize_entry("a", a)?;
                map.end()
            }
            StructValue::Guid(bytes) => serializer.serialize_str(&format_guid(bytes)),
            StructValue::Tagged(list) => list.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serialize_scalars() {
        assert_eq!(serde_json::to_value(PropertyValue::Int(-4)).unwrap(), json!(-4));
        assert_eq!(serde_json::to_value(PropertyValue::Float(1.5)).unwrap(), json!(1.5));
        assert_eq!(serde_json::to_value(PropertyValue::Bool(true)).unwrap(), json!(true));
        assert_eq!(
            serde_json::to_value(PropertyValue::Enum {
                enum_name: "EPrimalItemType".into(),
                value: "EPrimalItemType::Resource".into()
            })
            .unwrap(),
            json!("EPrimalItemType::Resource")
        );
        assert_eq!(
            serde_json::to_value(PropertyValue::Object(ObjectValue::default())).unwrap(),
            json!(null)
        );
    }

    #[test]
    fn serialize_structs() {
        let vector = PropertyValue::Struct {
            struct_name: "Vector".into(),
            value: Box::new(StructValue::Vector { x: 1.0, y: 2.0, z: 0.5 }),
        };
        assert_eq!(
            serde_json::to_value(&vector).unwrap(),
            json!({"x": 1.0, "y": 2.0, "z": 0.5})
        );

        let guid = StructValue::Guid([1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 0xFF, 0, 0, 0]);
        assert_eq!(guid.to_string(), "00000001-00000002-00000003-000000FF");
    }

    #[test]
    fn emptiness() {
        assert!(PropertyValue::Int(0).is_empty());
        assert!(PropertyValue::Float(0.0).is_empty());
        assert!(!PropertyValue::Float(0.1).is_empty());
        assert!(PropertyValue::Name("None".into()).is_empty());
        assert!(PropertyValue::Array(Vec::new()).is_empty());
        assert!(!PropertyValue::Bool(true).is_empty());
    }
}
