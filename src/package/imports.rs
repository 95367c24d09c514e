//! The package import table.
//!
//! An import names an object living in another package. Package imports sit at the root of
//! an outer chain (their outer is null); object imports hang below them. Linking turns the
//! chain into a full object path and, where the owning package is already cached and
//! linked, binds the import to the target export.

use std::sync::OnceLock;

use crate::{
    file::cursor::Cursor,
    package::{exports::ExportRc, names::NameTable, objects::ObjectIndex},
    Result,
};

/// What an import points at after linking.
#[derive(Debug, Clone)]
pub enum ImportTarget {
    /// The owning package is not loaded; only the path is known
    External,
    /// The import resolved to an export of another cached package
    Export(ExportRc),
}

/// One import table entry.
#[derive(Debug)]
pub struct Import {
    /// Position in the import table
    pub index: usize,
    /// Package holding the class of the imported object (e.g. `/Script/CoreUObject`)
    pub class_package: String,
    /// Class of the imported object (e.g. `Package`, `BlueprintGeneratedClass`)
    pub class_name: String,
    /// The import's outer; null for package imports
    pub outer: ObjectIndex,
    /// Name of the imported object
    pub object_name: String,
    /// Full object path, set by the link stage
    pub(crate) full_path: OnceLock<String>,
    /// Binding, set by the link stage
    pub(crate) target: OnceLock<ImportTarget>,
}

impl Import {
    /// Reads one import table entry and resolves its names.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] or [`crate::Error::Malformed`] for bad names.
    pub fn read(cursor: &mut Cursor, names: &NameTable, index: usize) -> Result<Import> {
        Ok(Import {
            index,
            class_package: names.read_name(cursor)?,
            class_name: names.read_name(cursor)?,
            outer: ObjectIndex::read(cursor)?,
            object_name: names.read_name(cursor)?,
            full_path: OnceLock::new(),
            target: OnceLock::new(),
        })
    }

    /// Returns `true` if this import names a whole package.
    #[must_use]
    pub fn is_package(&self) -> bool {
        self.outer.is_null()
    }

    /// Full object path, available once the owning package is linked.
    pub fn full_path(&self) -> Option<&str> {
        self.full_path.get().map(String::as_str)
    }

    /// The link-stage binding, available once the owning package is linked.
    pub fn target(&self) -> Option<&ImportTarget> {
        self.target.get()
    }

    /// The bound export, if the import resolved into another cached package.
    pub fn bound_export(&self) -> Option<&ExportRc> {
        match self.target.get() {
            Some(ImportTarget::Export(export)) => Some(export),
            _ => None,
        }
    }
}
