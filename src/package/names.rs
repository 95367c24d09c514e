//! The package name table.
//!
//! Every identifier in a package (object names, class names, property names and types,
//! enum values) is stored once in the name table and referenced by a [`NameIndex`]: a table
//! index plus an instance number. A number of `n > 0` renders as `Name_{n-1}`.

use std::fmt;

use crate::{file::cursor::Cursor, Result};

/// The name used to terminate tagged property lists and to mean "no value".
pub const NONE_NAME: &str = "None";

/// A reference into a package's name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NameIndex {
    /// Index into the name table
    pub index: i32,
    /// Instance number; zero means no suffix
    pub number: i32,
}

impl NameIndex {
    /// Reads a name reference (two `i32`s).
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if the cursor runs out.
    pub fn read(cursor: &mut Cursor) -> Result<NameIndex> {
        cursor.transactional(|cursor| {
            Ok(NameIndex {
                index: cursor.read_i32()?,
                number: cursor.read_i32()?,
            })
        })
    }
}

/// One decoded name table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    /// The name text
    pub name: String,
    /// The hash stored alongside the name; kept for inspection only
    pub hash: u32,
}

/// The decoded name table of a package.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: Vec<NameEntry>,
}

impl NameTable {
    /// Reads `count` entries starting at the cursor position.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] or [`crate::Error::Malformed`] on bad entries.
    pub fn read(cursor: &mut Cursor, count: usize) -> Result<NameTable> {
        let mut entries = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            let name = cursor.read_fstring()?;
            let hash = cursor.read_u32()?;
            entries.push(NameEntry { name, hash });
        }

        Ok(NameTable { entries })
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &NameEntry> {
        self.entries.iter()
    }

    /// Returns the base text of a name reference, without the instance suffix.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the index is outside the table.
    pub fn base(&self, name: NameIndex) -> Result<&str> {
        usize::try_from(name.index)
            .ok()
            .and_then(|index| self.entries.get(index))
            .map(|entry| entry.name.as_str())
            .ok_or_else(|| {
                malformed_error!(
                    "Name index {} outside of name table ({} entries)",
                    name.index,
                    self.entries.len()
                )
            })
    }

    /// Resolves a name reference into its display text, including the instance suffix.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the index is outside the table.
    pub fn resolve(&self, name: NameIndex) -> Result<String> {
        let base = self.base(name)?;
        if name.number > 0 {
            Ok(format!("{}_{}", base, name.number - 1))
        } else {
            Ok(base.to_string())
        }
    }

    /// Reads a name reference from the cursor and resolves it.
    ///
    /// # Errors
    /// See [`NameIndex::read`] and [`NameTable::resolve`].
    pub fn read_name(&self, cursor: &mut Cursor) -> Result<String> {
        cursor.transactional(|cursor| {
            let index = NameIndex::read(cursor)?;
            self.resolve(index)
        })
    }
}

impl fmt::Display for NameEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
