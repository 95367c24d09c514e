//! Synthesizes package bytes for tests.
//!
//! [`ByteWriter`] writes little-endian primitives and package strings. [`PackageBuilder`]
//! lays out a complete package (header, name, import and export tables, export bodies and
//! an optional end-of-file bulk section) and interns every name it is given.

use crate::package::{
    exports::ExportFlags,
    header::{PackageFlags, PACKAGE_TAG},
};

/// Little-endian byte writer.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    data: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn i8(&mut self, value: i8) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.data.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// `u32` byte count (terminator included), text, terminator.
    pub fn string(&mut self, text: &str) -> &mut Self {
        self.u32(count(text.len() + 1));
        self.bytes(text.as_bytes()).u8(0)
    }

    /// `u32` code-unit count (terminator included), UTF-16LE text, terminator.
    pub fn wide_string(&mut self, text: &str) -> &mut Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.u32(count(units.len() + 1));
        self.units(&units)
    }

    /// Single-byte package string with a positive `i32` prefix; empty strings are a bare
    /// zero prefix.
    pub fn fstring(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self.i32(0);
        }
        self.i32(signed(text.len() + 1));
        self.bytes(text.as_bytes()).u8(0)
    }

    /// UTF-16 package string with a negative `i32` prefix.
    pub fn wide_fstring(&mut self, text: &str) -> &mut Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.i32(-signed(units.len() + 1));
        self.units(&units)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn units(&mut self, units: &[u16]) -> &mut Self {
        for unit in units {
            self.data.extend_from_slice(&unit.to_le_bytes());
        }
        self.data.extend_from_slice(&[0, 0]);
        self
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).expect("test string too long")
}

fn signed(len: usize) -> i32 {
    i32::try_from(len).expect("test string too long")
}

/// Engine file version written by default; property tags carry the GUID flag.
pub const FILE_VERSION: i32 = 504;

/// Size of one export table entry.
const EXPORT_ENTRY_SIZE: usize = 44;

#[derive(Debug, Clone)]
struct ImportSpec {
    class_package: i32,
    class_name: i32,
    outer: i32,
    object_name: i32,
}

#[derive(Debug, Clone)]
struct ExportSpec {
    class: i32,
    super_index: i32,
    outer: i32,
    name: i32,
    export_flags: u32,
    body: Vec<u8>,
}

/// Builds complete package files.
///
/// Object indices follow the package convention: imports are `-1, -2, ...`, exports are
/// `1, 2, ...` and `0` is null.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    file_version: i32,
    names: Vec<String>,
    imports: Vec<ImportSpec>,
    exports: Vec<ExportSpec>,
    bulk: Vec<u8>,
}

impl Default for PackageBuilder {
    fn default() -> Self {
        PackageBuilder {
            file_version: FILE_VERSION,
            names: vec!["None".to_string()],
            imports: Vec::new(),
            exports: Vec::new(),
            bulk: Vec::new(),
        }
    }
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_version(mut self, version: i32) -> Self {
        self.file_version = version;
        self
    }

    pub fn has_property_guids(&self) -> bool {
        self.file_version >= crate::package::header::VER_PROPERTY_GUID_IN_PROPERTY_TAG
    }

    /// Index of `name` in the name table, adding it if needed.
    pub fn name(&mut self, name: &str) -> i32 {
        let index = match self.names.iter().position(|known| known == name) {
            Some(index) => index,
            None => {
                self.names.push(name.to_string());
                self.names.len() - 1
            }
        };
        signed(index)
    }

    /// Adds an import and returns its object index.
    pub fn import(&mut self, class_package: &str, class_name: &str, outer: i32, object_name: &str) -> i32 {
        let spec = ImportSpec {
            class_package: self.name(class_package),
            class_name: self.name(class_name),
            outer,
            object_name: self.name(object_name),
        };
        self.imports.push(spec);
        -signed(self.imports.len())
    }

    /// Adds a package import and a class import below it; returns the class index.
    pub fn import_class(&mut self, package: &str, class: &str) -> i32 {
        let outer = self.import("/Script/CoreUObject", "Package", 0, package);
        self.import("/Script/CoreUObject", "Class", outer, class)
    }

    /// Adds an export and returns its object index.
    pub fn export(&mut self, class: i32, outer: i32, name: &str, body: Vec<u8>) -> i32 {
        self.push_export(class, outer, name, 0, body)
    }

    /// Adds an export flagged as carrying a bulk data record.
    pub fn bulk_export(&mut self, class: i32, outer: i32, name: &str, body: Vec<u8>) -> i32 {
        self.push_export(class, outer, name, ExportFlags::HAS_BULK_DATA.bits(), body)
    }

    fn push_export(&mut self, class: i32, outer: i32, name: &str, flags: u32, body: Vec<u8>) -> i32 {
        let spec = ExportSpec {
            class,
            super_index: 0,
            outer,
            name: self.name(name),
            export_flags: flags,
            body,
        };
        self.exports.push(spec);
        signed(self.exports.len())
    }

    /// Appends bytes to the end-of-file bulk section.
    pub fn with_bulk_section(mut self, bytes: &[u8]) -> Self {
        self.bulk.extend_from_slice(bytes);
        self
    }

    /// Writes a tagged property list; the closure decides whether it is terminated.
    pub fn properties(&mut self, f: impl FnOnce(&mut PropertyWriter)) -> Vec<u8> {
        let mut writer = PropertyWriter::new(self);
        f(&mut writer);
        writer.out.into_bytes()
    }

    pub fn build(&self) -> Vec<u8> {
        let header_len = self.header(&Layout::default()).len();

        let mut names = ByteWriter::new();
        for name in &self.names {
            names.fstring(name).u32(0);
        }

        let mut imports = ByteWriter::new();
        for import in &self.imports {
            imports
                .i32(import.class_package)
                .i32(0)
                .i32(import.class_name)
                .i32(0)
                .i32(import.outer)
                .i32(import.object_name)
                .i32(0);
        }

        let name_offset = header_len;
        let import_offset = name_offset + names.len();
        let export_offset = import_offset + imports.len();
        let bodies_offset = export_offset + EXPORT_ENTRY_SIZE * self.exports.len();

        let mut table = ByteWriter::new();
        let mut bodies = ByteWriter::new();
        for export in &self.exports {
            let offset = bodies_offset + bodies.len();
            table
                .i32(export.class)
                .i32(export.super_index)
                .i32(export.outer)
                .i32(export.name)
                .i32(0)
                .u32(0)
                .i64(export.body.len() as i64)
                .i64(offset as i64)
                .u32(export.export_flags);
            bodies.bytes(&export.body);
        }

        let bulk_offset = bodies_offset + bodies.len();
        let layout = Layout {
            name_offset,
            import_offset,
            export_offset,
            bulk_offset: if self.bulk.is_empty() { 0 } else { bulk_offset },
        };

        let mut package = self.header(&layout);
        package
            .bytes(&names.into_bytes())
            .bytes(&imports.into_bytes())
            .bytes(&table.into_bytes())
            .bytes(&bodies.into_bytes())
            .bytes(&self.bulk);
        package.into_bytes()
    }

    fn header(&self, layout: &Layout) -> ByteWriter {
        let mut writer = ByteWriter::new();
        writer
            .u32(PACKAGE_TAG)
            .i32(-6)
            .i32(self.file_version)
            .u32(u32::try_from(layout.export_offset).unwrap_or(0))
            .fstring("None")
            .u32(PackageFlags::FILTER_EDITOR_ONLY.bits())
            .u32(count(self.names.len()))
            .u32(count(layout.name_offset))
            .u32(count(self.exports.len()))
            .u32(count(layout.export_offset))
            .u32(count(self.imports.len()))
            .u32(count(layout.import_offset))
            .i64(layout.bulk_offset as i64);
        writer
    }
}

#[derive(Debug, Default)]
struct Layout {
    name_offset: usize,
    import_offset: usize,
    export_offset: usize,
    bulk_offset: usize,
}

/// Writes tagged properties, interning names in the owning [`PackageBuilder`].
pub struct PropertyWriter<'b> {
    builder: &'b mut PackageBuilder,
    out: ByteWriter,
}

impl<'b> PropertyWriter<'b> {
    fn new(builder: &'b mut PackageBuilder) -> Self {
        PropertyWriter {
            builder,
            out: ByteWriter::new(),
        }
    }

    fn name_ref(&mut self, name: &str) -> &mut Self {
        let index = self.builder.name(name);
        self.out.i32(index).i32(0);
        self
    }

    /// Writes a tag; `data` writes the type-specific part.
    fn tag(
        &mut self,
        name: &str,
        type_name: &str,
        index: u32,
        size: usize,
        data: impl FnOnce(&mut Self),
    ) -> &mut Self {
        self.name_ref(name).name_ref(type_name);
        self.out.i32(signed(size)).u32(index);
        data(self);
        if self.builder.has_property_guids() {
            self.out.u8(0);
        }
        self
    }

    pub fn int(&mut self, name: &str, index: u32, value: i32) -> &mut Self {
        self.tag(name, "IntProperty", index, 4, |_| {});
        self.out.i32(value);
        self
    }

    pub fn float(&mut self, name: &str, index: u32, value: f32) -> &mut Self {
        self.tag(name, "FloatProperty", index, 4, |_| {});
        self.out.f32(value);
        self
    }

    pub fn bool(&mut self, name: &str, index: u32, value: bool) -> &mut Self {
        self.tag(name, "BoolProperty", index, 0, |w| {
            w.out.u8(u8::from(value));
        })
    }

    pub fn byte(&mut self, name: &str, index: u32, value: u8) -> &mut Self {
        self.tag(name, "ByteProperty", index, 1, |w| {
            w.name_ref("None");
        });
        self.out.u8(value);
        self
    }

    pub fn enum_value(&mut self, name: &str, index: u32, enum_name: &str, value: &str) -> &mut Self {
        self.tag(name, "EnumProperty", index, 8, |w| {
            w.name_ref(enum_name);
        });
        self.name_ref(value)
    }

    pub fn str(&mut self, name: &str, index: u32, value: &str) -> &mut Self {
        let mut text = ByteWriter::new();
        text.fstring(value);
        self.tag(name, "StrProperty", index, text.len(), |_| {});
        self.out.bytes(&text.into_bytes());
        self
    }

    pub fn name_value(&mut self, name: &str, index: u32, value: &str) -> &mut Self {
        self.tag(name, "NameProperty", index, 8, |_| {});
        self.name_ref(value)
    }

    pub fn object(&mut self, name: &str, index: u32, object: i32) -> &mut Self {
        self.tag(name, "ObjectProperty", index, 4, |_| {});
        self.out.i32(object);
        self
    }

    pub fn vector(&mut self, name: &str, index: u32, x: f32, y: f32, z: f32) -> &mut Self {
        self.tag(name, "StructProperty", index, 12, |w| {
            w.name_ref("Vector");
            w.out.bytes(&[0; 16]);
        });
        self.out.f32(x).f32(y).f32(z);
        self
    }

    /// A struct written as a nested, `None`-terminated property list.
    pub fn struct_list(
        &mut self,
        name: &str,
        index: u32,
        struct_name: &str,
        f: impl FnOnce(&mut PropertyWriter),
    ) -> &mut Self {
        let body = {
            let mut nested = PropertyWriter::new(self.builder);
            f(&mut nested);
            nested.none();
            nested.out.into_bytes()
        };

        self.tag(name, "StructProperty", index, body.len(), |w| {
            w.name_ref(struct_name);
            w.out.bytes(&[0; 16]);
        });
        self.out.bytes(&body);
        self
    }

    pub fn int_array(&mut self, name: &str, values: &[i32]) -> &mut Self {
        self.tag(name, "ArrayProperty", 0, 4 + 4 * values.len(), |w| {
            w.name_ref("IntProperty");
        });
        self.out.u32(count(values.len()));
        for &value in values {
            self.out.i32(value);
        }
        self
    }

    /// A property of a type the decoder does not know.
    pub fn raw(&mut self, name: &str, type_name: &str, data: &[u8]) -> &mut Self {
        self.tag(name, type_name, 0, data.len(), |_| {});
        self.out.bytes(data);
        self
    }

    /// Arbitrary bytes outside of any tag.
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.out.bytes(data);
        self
    }

    /// The `None` terminator.
    pub fn none(&mut self) -> &mut Self {
        self.name_ref("None")
    }
}
