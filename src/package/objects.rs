//! Object indices and object flags.
//!
//! Tables and property values refer to objects through a signed [`ObjectIndex`]: negative
//! values address the import table (`-1` is import 0), positive values address the export
//! table (`1` is export 0) and zero is the null reference.

use std::fmt;

use bitflags::bitflags;

use crate::{file::cursor::Cursor, Result};

bitflags! {
    /// Object flags stored on every export table entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u32 {
        /// Visible outside its package
        const PUBLIC = 0x0000_0001;
        /// Kept even when unreferenced
        const STANDALONE = 0x0000_0002;
        /// Native object
        const NATIVE = 0x0000_0004;
        /// Participates in undo/redo
        const TRANSACTIONAL = 0x0000_0008;
        /// The class default object of its class
        const CLASS_DEFAULT_OBJECT = 0x0000_0010;
        /// A template for other objects
        const ARCHETYPE_OBJECT = 0x0000_0020;
        /// Not saved to disk
        const TRANSIENT = 0x0000_0040;
    }
}

/// A raw, signed object reference as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectIndex(pub i32);

impl ObjectIndex {
    /// The null reference.
    pub const NULL: ObjectIndex = ObjectIndex(0);

    /// Reads an object index (one `i32`).
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if the cursor runs out.
    pub fn read(cursor: &mut Cursor) -> Result<ObjectIndex> {
        Ok(ObjectIndex(cursor.read_i32()?))
    }

    /// Returns `true` for the null reference.
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this addresses the import table.
    #[must_use]
    pub fn is_import(self) -> bool {
        self.0 < 0
    }

    /// Returns `true` if this addresses the export table.
    #[must_use]
    pub fn is_export(self) -> bool {
        self.0 > 0
    }

    /// Resolves the index against table sizes.
    ///
    /// Returns `None` if the index points outside its table.
    #[must_use]
    pub fn resolve(self, import_count: usize, export_count: usize) -> Option<ObjectRef> {
        match self.0 {
            0 => Some(ObjectRef::Null),
            index if index < 0 => {
                let slot = usize::try_from(-(i64::from(index)) - 1).ok()?;
                (slot < import_count).then_some(ObjectRef::Import(slot))
            }
            index => {
                let slot = usize::try_from(index - 1).ok()?;
                (slot < export_count).then_some(ObjectRef::Export(slot))
            }
        }
    }
}

/// A validated object reference into the tables of the same package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectRef {
    /// No object
    #[default]
    Null,
    /// Position in the import table
    Import(usize),
    /// Position in the export table
    Export(usize),
}

impl ObjectRef {
    /// Returns `true` for the null reference.
    #[must_use]
    pub fn is_null(self) -> bool {
        matches!(self, ObjectRef::Null)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Null => f.write_str("null"),
            ObjectRef::Import(index) => write!(f, "import[{index}]"),
            ObjectRef::Export(index) => write!(f, "export[{index}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_indices() {
        assert_eq!(ObjectIndex(0).resolve(2, 2), Some(ObjectRef::Null));
        assert_eq!(ObjectIndex(-1).resolve(2, 2), Some(ObjectRef::Import(0)));
        assert_eq!(ObjectIndex(-2).resolve(2, 2), Some(ObjectRef::Import(1)));
        assert_eq!(ObjectIndex(-3).resolve(2, 2), None);
        assert_eq!(ObjectIndex(2).resolve(2, 2), Some(ObjectRef::Export(1)));
        assert_eq!(ObjectIndex(3).resolve(2, 2), None);
        assert_eq!(ObjectIndex(i32::MIN).resolve(2, 2), None);
    }

    #[test]
    fn index_kinds() {
        assert!(ObjectIndex::NULL.is_null());
        assert!(ObjectIndex(-4).is_import());
        assert!(ObjectIndex(4).is_export());
        assert_eq!(ObjectRef::Import(3).to_string(), "import[3]");
    }
}
