//! The package export table and decoded objects.
//!
//! Each [`Export`] starts as a bare table entry (class, super and outer indices, name,
//! flags and the location of its serial region) and is filled in as its package advances:
//! the link stage attaches resolved references, the properties stage its tagged property
//! list and the bulk data stage the trailing bulk record. Each of those is published
//! exactly once; reading one before the package reached the stage that produces it fails
//! with [`crate::Error::StageNotReached`].

use std::{
    ops::Range,
    sync::{Arc, OnceLock, Weak},
};

use bitflags::bitflags;

use crate::{
    file::cursor::Cursor,
    package::{
        bulkdata::BulkData,
        names::{NameIndex, NameTable},
        objects::{ObjectFlags, ObjectIndex, ObjectRef},
        properties::PropertyList,
        Package, PackageRc, Stage,
    },
    Error, Result,
};

/// A reference counted export
pub type ExportRc = Arc<Export>;

bitflags! {
    /// Export table flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExportFlags: u32 {
        /// Always exported, even if unreferenced
        const FORCED_EXPORT = 0x0000_0001;
        /// Stripped on clients
        const NOT_FOR_CLIENT = 0x0000_0002;
        /// Stripped on servers
        const NOT_FOR_SERVER = 0x0000_0004;
        /// A bulk data record follows the property list
        const HAS_BULK_DATA = 0x0000_0100;
    }
}

/// An export table entry as read during deserialization, before it is bound to a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    /// Class of the object; null for classes themselves
    pub class: ObjectIndex,
    /// Super struct, for class and struct exports
    pub super_index: ObjectIndex,
    /// Enclosing object; null for top-level objects
    pub outer: ObjectIndex,
    /// Object name
    pub name: String,
    /// Object flags
    pub object_flags: ObjectFlags,
    /// Size of the serial region
    pub serial_size: usize,
    /// Absolute offset of the serial region
    pub serial_offset: usize,
    /// Export flags
    pub export_flags: ExportFlags,
}

impl ExportEntry {
    /// Reads one export table entry.
    ///
    /// `file_len` is used to check that the serial region lies inside the file.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] for truncated tables or
    /// [`crate::Error::Malformed`] for bad names or an out-of-file serial region.
    pub fn read(cursor: &mut Cursor, names: &NameTable, file_len: usize) -> Result<ExportEntry> {
        let class = ObjectIndex::read(cursor)?;
        let super_index = ObjectIndex::read(cursor)?;
        let outer = ObjectIndex::read(cursor)?;
        let name_index = NameIndex::read(cursor)?;
        let object_flags = ObjectFlags::from_bits_retain(cursor.read_u32()?);
        let serial_size = cursor.read_i64()?;
        let serial_offset = cursor.read_i64()?;
        let export_flags = ExportFlags::from_bits_retain(cursor.read_u32()?);

        let name = names.resolve(name_index)?;
        let (Ok(serial_size), Ok(serial_offset)) =
            (usize::try_from(serial_size), usize::try_from(serial_offset))
        else {
            return Err(malformed_error!(
                "Export '{}' has a negative serial region ({} bytes at {})",
                name,
                serial_size,
                serial_offset
            ));
        };

        if serial_offset
            .checked_add(serial_size)
            .map_or(true, |end| end > file_len)
        {
            return Err(malformed_error!(
                "Export '{}' serial region {}+{} exceeds the file ({} bytes)",
                name,
                serial_offset,
                serial_size,
                file_len
            ));
        }

        Ok(ExportEntry {
            class,
            super_index,
            outer,
            name,
            object_flags,
            serial_size,
            serial_offset,
            export_flags,
        })
    }
}

/// References of an export, resolved by the link stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLink {
    /// Class of the object
    pub class: ObjectRef,
    /// Super struct
    pub super_struct: ObjectRef,
    /// Enclosing object
    pub outer: ObjectRef,
    /// Name of the class; `Class` for exports without a class reference
    pub class_name: String,
    /// Full object path, `{package}.{object}` with `:` separating sub-objects
    pub path: String,
}

/// A decoded object of a package.
pub struct Export {
    /// Position in the export table
    pub index: usize,
    /// The raw table entry
    pub entry: ExportEntry,
    package_name: String,
    package: Weak<Package>,
    pub(crate) link: OnceLock<ExportLink>,
    pub(crate) properties: OnceLock<PropertyList>,
    pub(crate) bulk_data: OnceLock<Option<BulkData>>,
}

impl Export {
    pub(crate) fn new(
        index: usize,
        entry: ExportEntry,
        package_name: String,
        package: Weak<Package>,
    ) -> Export {
        Export {
            index,
            entry,
            package_name,
            package,
            link: OnceLock::new(),
            properties: OnceLock::new(),
            bulk_data: OnceLock::new(),
        }
    }

    /// Object name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Name of the owning package.
    #[must_use]
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// The owning package, if it is still alive.
    #[must_use]
    pub fn package(&self) -> Option<PackageRc> {
        self.package.upgrade()
    }

    /// Absolute byte range of the serial region.
    #[must_use]
    pub fn serial_range(&self) -> Range<usize> {
        self.entry.serial_offset..self.entry.serial_offset + self.entry.serial_size
    }

    /// A cursor over the serial region inside the package buffer.
    pub(crate) fn serial_cursor<'a>(&self, file: &Cursor<'a>) -> Result<Cursor<'a>> {
        file.window(self.entry.serial_offset, self.entry.serial_size)
    }

    /// Resolved references.
    ///
    /// # Errors
    /// Returns [`crate::Error::StageNotReached`] before the package is linked.
    pub fn link(&self) -> Result<&ExportLink> {
        self.link
            .get()
            .ok_or_else(|| self.not_reached(Stage::Linked))
    }

    /// Name of the object's class.
    ///
    /// # Errors
    /// Returns [`crate::Error::StageNotReached`] before the package is linked.
    pub fn class_name(&self) -> Result<&str> {
        Ok(&self.link()?.class_name)
    }

    /// Full object path.
    ///
    /// # Errors
    /// Returns [`crate::Error::StageNotReached`] before the package is linked.
    pub fn path(&self) -> Result<&str> {
        Ok(&self.link()?.path)
    }

    /// The decoded tagged property list.
    ///
    /// # Errors
    /// Returns [`crate::Error::StageNotReached`] before the package's properties are parsed.
    pub fn properties(&self) -> Result<&PropertyList> {
        self.properties
            .get()
            .ok_or_else(|| self.not_reached(Stage::PropertiesParsed))
    }

    /// The bulk data record, if this export carries one.
    ///
    /// # Errors
    /// Returns [`crate::Error::StageNotReached`] before the package's bulk data is parsed.
    pub fn bulk_data(&self) -> Result<Option<&BulkData>> {
        self.bulk_data
            .get()
            .map(Option::as_ref)
            .ok_or_else(|| self.not_reached(Stage::BulkDataParsed))
    }

    /// Returns `true` if the export table declares a bulk data record.
    #[must_use]
    pub fn declares_bulk_data(&self) -> bool {
        self.entry.export_flags.contains(ExportFlags::HAS_BULK_DATA)
    }

    /// Returns `true` if this is a top-level object of its package.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.entry.outer.is_null()
    }

    fn not_reached(&self, required: Stage) -> Error {
        Error::StageNotReached {
            package: self.package_name.clone(),
            required,
            current: self
                .package
                .upgrade()
                .map_or(Stage::Deserialized, |package| package.stage()),
        }
    }
}

impl std::fmt::Debug for Export {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Export")
            .field("index", &self.index)
            .field("package", &self.package_name)
            .field("entry", &self.entry)
            .field("link", &self.link.get())
            .field("properties", &self.properties.get().map(PropertyList::len))
            .finish_non_exhaustive()
    }
}
