use log::warn;

use crate::{
    config::PropertyBoundary,
    file::cursor::Cursor,
    package::{
        names::NONE_NAME,
        objects::ObjectIndex,
        properties::{ObjectValue, Property, PropertyList, PropertyValue, StructValue},
        Package,
    },
    Result,
};

/// Type-specific data carried in a property tag.
#[derive(Debug)]
enum TagData {
    Plain,
    Struct { struct_name: String },
    Bool(bool),
    Enum { enum_name: String },
    Array { inner_type: String },
}

#[derive(Debug)]
struct Tag {
    name: String,
    type_name: String,
    size: usize,
    index: u32,
    data: TagData,
}

/// Decodes tagged property lists of one package.
///
/// Names and object references are resolved against the package, which must be linked.
pub(crate) struct PropertyDecoder<'p> {
    package: &'p Package,
    max_depth: usize,
}

impl<'p> PropertyDecoder<'p> {
    pub(crate) fn new(package: &'p Package, max_depth: usize) -> Self {
        PropertyDecoder { package, max_depth }
    }

    /// Reads a top-level property list from `cursor`, whose window is the export's serial
    /// region.
    pub(crate) fn read_list(
        &self,
        cursor: &mut Cursor,
        boundary: PropertyBoundary,
    ) -> Result<PropertyList> {
        self.read_list_at(cursor, boundary, 0)
    }

    fn read_list_at(
        &self,
        cursor: &mut Cursor,
        boundary: PropertyBoundary,
        depth: usize,
    ) -> Result<PropertyList> {
        let start = cursor.pos();
        let mut properties = Vec::new();

        loop {
            if cursor.is_exhausted() {
                if boundary == PropertyBoundary::Terminator {
                    return Err(malformed_error!(
                        "Property list starting at {} has no terminator before {}",
                        start,
                        cursor.end()
                    ));
                }
                break;
            }

            let Some(tag) = self.read_tag(cursor)? else {
                if boundary == PropertyBoundary::DeclaredSize {
                    continue;
                }
                break;
            };

            let mut value_cursor = cursor.sub(tag.size)?;
            let value = self.read_value(&tag, &mut value_cursor, depth)?;
            properties.push(Property {
                name: tag.name,
                type_name: tag.type_name,
                index: tag.index,
                value,
            });
        }

        Ok(PropertyList::new(properties, cursor.pos()))
    }

    /// Reads a tag; `None` means the `None` terminator was consumed.
    fn read_tag(&self, cursor: &mut Cursor) -> Result<Option<Tag>> {
        let names = self.package.names();
        cursor.transactional(|cursor| {
            let name = names.read_name(cursor)?;
            if name == NONE_NAME {
                return Ok(None);
            }

            let type_name = names.read_name(cursor)?;
            let size = cursor.read_i32()?;
            let index = cursor.read_i32()?;
            let (Ok(size), Ok(index)) = (usize::try_from(size), u32::try_from(index)) else {
                return Err(malformed_error!(
                    "Property '{}' has a negative size ({}) or index ({})",
                    name,
                    size,
                    index
                ));
            };

            let data = match type_name.as_str() {
                "StructProperty" => {
                    let struct_name = names.read_name(cursor)?;
                    cursor.skip(16)?;
                    TagData::Struct { struct_name }
                }
                "BoolProperty" => TagData::Bool(cursor.read_bool8()?),
                "ByteProperty" | "EnumProperty" => TagData::Enum {
                    enum_name: names.read_name(cursor)?,
                },
                "ArrayProperty" => TagData::Array {
                    inner_type: names.read_name(cursor)?,
                },
                _ => TagData::Plain,
            };

            if self.package.header().has_property_guids() && cursor.read_bool8()? {
                cursor.skip(16)?;
            }

            Ok(Some(Tag {
                name,
                type_name,
                size,
                index,
                data,
            }))
        })
    }

    fn read_value(&self, tag: &Tag, cursor: &mut Cursor, depth: usize) -> Result<PropertyValue> {
        match &tag.data {
            TagData::Bool(value) => Ok(PropertyValue::Bool(*value)),
            TagData::Struct { struct_name } => {
                let depth = self.nested(depth, &tag.name)?;
                self.read_struct(struct_name, cursor, depth)
            }
            TagData::Array { inner_type } => {
                let depth = self.nested(depth, &tag.name)?;
                self.read_array(inner_type, cursor, depth)
            }
            TagData::Enum { enum_name } => {
                if tag.type_name == "ByteProperty" && enum_name == NONE_NAME && cursor.len() == 1 {
                    Ok(PropertyValue::Byte(cursor.read_u8()?))
                } else {
                    Ok(PropertyValue::Enum {
                        enum_name: enum_name.clone(),
                        value: self.package.names().read_name(cursor)?,
                    })
                }
            }
            TagData::Plain => match self.read_scalar(&tag.type_name, cursor)? {
                Some(value) => Ok(value),
                None => Ok(unknown(&tag.type_name, cursor)?),
            },
        }
    }

    /// Reads a value whose size is implied by its type. Returns `None` for unknown types.
    fn read_scalar(&self, type_name: &str, cursor: &mut Cursor) -> Result<Option<PropertyValue>> {
        let value = match type_name {
            "IntProperty" => PropertyValue::Int(cursor.read_i32()?),
            "Int8Property" => PropertyValue::Int8(cursor.read_i8()?),
            "Int16Property" => PropertyValue::Int16(cursor.read_le()?),
            "Int64Property" => PropertyValue::Int64(cursor.read_i64()?),
            "UInt32Property" => PropertyValue::UInt32(cursor.read_u32()?),
            "UInt64Property" => PropertyValue::UInt64(cursor.read_u64()?),
            "FloatProperty" => PropertyValue::Float(cursor.read_f32()?),
            "DoubleProperty" => PropertyValue::Double(cursor.read_le()?),
            "NameProperty" => PropertyValue::Name(self.package.names().read_name(cursor)?),
            "StrProperty" => PropertyValue::Str(cursor.read_fstring()?),
            "ObjectProperty" | "ClassProperty" => {
                let index = ObjectIndex::read(cursor)?;
                let reference = self.package.resolve_index(index, "object property")?;
                PropertyValue::Object(ObjectValue {
                    reference,
                    path: self.package.object_path(reference),
                })
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    fn read_struct(
        &self,
        struct_name: &str,
        cursor: &mut Cursor,
        depth: usize,
    ) -> Result<PropertyValue> {
        let value = match struct_name {
            "Vector" => StructValue::Vector {
                x: cursor.read_f32()?,
                y: cursor.read_f32()?,
                z: cursor.read_f32()?,
            },
            "Vector2D" => StructValue::Vector2D {
                x: cursor.read_f32()?,
                y: cursor.read_f32()?,
            },
            "Rotator" => StructValue::Rotator {
                pitch: cursor.read_f32()?,
                yaw: cursor.read_f32()?,
                roll: cursor.read_f32()?,
            },
            "LinearColor" => StructValue::LinearColor {
                r: cursor.read_f32()?,
                g: cursor.read_f32()?,
                b: cursor.read_f32()?,
                a: cursor.read_f32()?,
            },
            "Color" => {
                let b = cursor.read_u8()?;
                let g = cursor.read_u8()?;
                let r = cursor.read_u8()?;
                let a = cursor.read_u8()?;
                StructValue::Color { r, g, b, a }
            }
            "Guid" => {
                let mut guid = [0u8; 16];
                guid.copy_from_slice(cursor.read_bytes(16)?);
                StructValue::Guid(guid)
            }
            _ => StructValue::Tagged(self.read_list_at(cursor, PropertyBoundary::Either, depth)?),
        };

        Ok(PropertyValue::Struct {
            struct_name: struct_name.to_string(),
            value: Box::new(value),
        })
    }

    fn read_array(&self, inner_type: &str, cursor: &mut Cursor, depth: usize) -> Result<PropertyValue> {
        let start = cursor.pos();
        let count = cursor.read_u32()? as usize;
        if count > cursor.remaining() {
            return Err(malformed_error!(
                "Array at {} claims {} elements in {} bytes",
                start,
                count,
                cursor.remaining()
            ));
        }

        let mut items = Vec::with_capacity(count);
        if inner_type == "StructProperty" {
            let inner = self
                .read_tag(cursor)?
                .ok_or_else(|| malformed_error!("Struct array at {} has no inner tag", start))?;
            let TagData::Struct { struct_name } = inner.data else {
                return Err(malformed_error!(
                    "Struct array at {} has a {} inner tag",
                    start,
                    inner.type_name
                ));
            };

            let mut body = cursor.sub(inner.size)?;
            for _ in 0..count {
                items.push(self.read_struct(&struct_name, &mut body, depth)?);
            }
            return Ok(PropertyValue::Array(items));
        }

        let byte_names = inner_type == "ByteProperty" && cursor.remaining() != count;
        for _ in 0..count {
            let item = match inner_type {
                "BoolProperty" => Some(PropertyValue::Bool(cursor.read_bool8()?)),
                "ByteProperty" if !byte_names => Some(PropertyValue::Byte(cursor.read_u8()?)),
                "ByteProperty" | "EnumProperty" => Some(PropertyValue::Enum {
                    enum_name: String::new(),
                    value: self.package.names().read_name(cursor)?,
                }),
                other => self.read_scalar(other, cursor)?,
            };

            match item {
                Some(item) => items.push(item),
                None => {
                    cursor.seek(start)?;
                    return unknown(&format!("ArrayProperty<{inner_type}>"), cursor);
                }
            }
        }

        Ok(PropertyValue::Array(items))
    }

    fn nested(&self, depth: usize, name: &str) -> Result<usize> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(malformed_error!(
                "Property '{}' nests deeper than {} levels",
                name,
                self.max_depth
            ));
        }
        Ok(depth)
    }
}

fn unknown(type_name: &str, cursor: &mut Cursor) -> Result<PropertyValue> {
    warn!(
        "Keeping {} bytes of unsupported {} at offset {} as raw data",
        cursor.remaining(),
        type_name,
        cursor.pos()
    );
    Ok(PropertyValue::Unknown {
        type_name: type_name.to_string(),
        data: cursor.read_bytes(cursor.remaining())?.to_vec(),
    })
}
