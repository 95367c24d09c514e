//! The package summary header.
//!
//! The header sits at offset zero and locates every table in the file:
//!
//! | Field                    | Type      |
//! |--------------------------|-----------|
//! | tag                      | `u32`     |
//! | legacy file version      | `i32`     |
//! | engine file version      | `i32`     |
//! | total header size        | `u32`     |
//! | folder name              | `FString` |
//! | package flags            | `u32`     |
//! | name count / offset      | `u32` × 2 |
//! | export count / offset    | `u32` × 2 |
//! | import count / offset    | `u32` × 2 |
//! | bulk data start offset   | `i64`     |

use bitflags::bitflags;

use crate::{file::cursor::Cursor, Result};

/// Magic tag at the start of every package.
pub const PACKAGE_TAG: u32 = 0x9E2A_83C1;

/// First engine file version whose property tags carry an optional property GUID.
pub const VER_PROPERTY_GUID_IN_PROPERTY_TAG: i32 = 503;

bitflags! {
    /// Package-level flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PackageFlags: u32 {
        /// Newly created package, not saved yet
        const NEWLY_CREATED = 0x0000_0001;
        /// Purely optional for clients
        const CLIENT_OPTIONAL = 0x0000_0002;
        /// Only needed on the server side
        const SERVER_SIDE_ONLY = 0x0000_0004;
        /// This package is from "compiled in" classes
        const COMPILED_IN = 0x0000_0010;
        /// Package is editor-only
        const EDITOR_ONLY = 0x0000_0040;
        /// Contains a map
        const CONTAINS_MAP = 0x0002_0000;
        /// Editor-only data was filtered out when cooking
        const FILTER_EDITOR_ONLY = 0x8000_0000;
    }
}

/// The decoded package summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageHeader {
    /// Legacy file version (negative for modern packages)
    pub legacy_version: i32,
    /// Engine file version
    pub file_version: i32,
    /// Size of everything up to the first export body
    pub total_header_size: u32,
    /// Folder name recorded by the editor
    pub folder_name: String,
    /// Package flags
    pub flags: PackageFlags,
    /// Number of name table entries
    pub name_count: u32,
    /// Absolute offset of the name table
    pub name_offset: u32,
    /// Number of export table entries
    pub export_count: u32,
    /// Absolute offset of the export table
    pub export_offset: u32,
    /// Number of import table entries
    pub import_count: u32,
    /// Absolute offset of the import table
    pub import_offset: u32,
    /// Absolute offset where end-of-file bulk payloads start; zero or negative if none
    pub bulk_data_start: i64,
}

impl PackageHeader {
    /// Reads the header from the start of the cursor window.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for a wrong tag or a non-negative legacy
    /// version, [`crate::Error::Malformed`] for inconsistent tables and
    /// [`crate::Error::EndOfStream`] for truncated data.
    pub fn read(cursor: &mut Cursor) -> Result<PackageHeader> {
        let tag = cursor.read_u32()?;
        if tag != PACKAGE_TAG {
            return Err(crate::Error::NotSupported);
        }

        let legacy_version = cursor.read_i32()?;
        if legacy_version >= 0 {
            return Err(crate::Error::NotSupported);
        }

        let header = PackageHeader {
            legacy_version,
            file_version: cursor.read_i32()?,
            total_header_size: cursor.read_u32()?,
            folder_name: cursor.read_fstring()?,
            flags: PackageFlags::from_bits_retain(cursor.read_u32()?),
            name_count: cursor.read_u32()?,
            name_offset: cursor.read_u32()?,
            export_count: cursor.read_u32()?,
            export_offset: cursor.read_u32()?,
            import_count: cursor.read_u32()?,
            import_offset: cursor.read_u32()?,
            bulk_data_start: cursor.read_i64()?,
        };

        header.validate(cursor.end())?;
        Ok(header)
    }

    /// Returns `true` if property tags carry the optional property GUID.
    #[must_use]
    pub fn has_property_guids(&self) -> bool {
        self.file_version >= VER_PROPERTY_GUID_IN_PROPERTY_TAG
    }

    /// Returns the bulk data start offset, if the package declares one.
    #[must_use]
    pub fn bulk_data_start(&self) -> Option<usize> {
        usize::try_from(self.bulk_data_start)
            .ok()
            .filter(|&start| start > 0)
    }

    fn validate(&self, file_len: usize) -> Result<()> {
        for (table, offset, count) in [
            ("name", self.name_offset, self.name_count),
            ("export", self.export_offset, self.export_count),
            ("import", self.import_offset, self.import_count),
        ] {
            if count > 0 && offset as usize >= file_len {
                return Err(malformed_error!(
                    "The {} table offset {} lies outside of the file ({} bytes)",
                    table,
                    offset,
                    file_len
                ));
            }
        }

        if self.name_count == 0 {
            return Err(malformed_error!("Package has an empty name table"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::builder::ByteWriter, Error};

    fn header_bytes(tag: u32, legacy: i32, name_offset: u32) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer
            .u32(tag)
            .i32(legacy)
            .i32(504)
            .u32(0)
            .fstring("None")
            .u32(PackageFlags::FILTER_EDITOR_ONLY.bits())
            .u32(1)
            .u32(name_offset)
            .u32(0)
            .u32(0)
            .u32(0)
            .u32(0)
            .i64(0);
        writer.into_bytes()
    }

    #[test]
    fn read_header() {
        let data = header_bytes(PACKAGE_TAG, -6, 8);
        let header = PackageHeader::read(&mut Cursor::new(&data)).unwrap();
        assert_eq!(header.file_version, 504);
        assert_eq!(header.folder_name, "None");
        assert!(header.flags.contains(PackageFlags::FILTER_EDITOR_ONLY));
        assert!(header.has_property_guids());
        assert_eq!(header.bulk_data_start(), None);
    }

    #[test]
    fn wrong_tag() {
        let data = header_bytes(0x1234_5678, -6, 8);
        assert!(matches!(
            PackageHeader::read(&mut Cursor::new(&data)),
            Err(Error::NotSupported)
        ));
    }

    #[test]
    fn table_outside_file() {
        let data = header_bytes(PACKAGE_TAG, -6, 4096);
        assert!(matches!(
            PackageHeader::read(&mut Cursor::new(&data)),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn truncated() {
        let data = header_bytes(PACKAGE_TAG, -6, 8);
        assert!(PackageHeader::read(&mut Cursor::new(&data[..20]))
            .unwrap_err()
            .is_end_of_stream());
    }
}
