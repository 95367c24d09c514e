//! Staged package decoding.
//!
//! A [`Package`] is the in-memory form of one package file. It is decoded in four
//! cumulative stages (see [`Stage`]):
//!
//! 1. **Deserialized** - [`Package::deserialize`] reads the header, name, import and export
//!    tables. No object bodies are touched.
//! 2. **Linked** - object indices are resolved, imports get full paths and, where the
//!    owning package is already loaded and linked, are bound to its exports.
//! 3. **PropertiesParsed** - the tagged property list of every export is decoded.
//! 4. **BulkDataParsed** - the bulk data record following the property list of flagged
//!    exports is located.
//!
//! Later stages are reached with [`Package::advance_to`], which runs the missing stages in
//! order on the *same* package. Other holders of the package observe the upgrade. Stages are
//! never skipped and never undone. Each stage decodes into temporaries and commits only when
//! it succeeded as a whole, so a failing stage leaves the package at the last stage that
//! completed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use uepkg::{File, LoaderConfig, package::{Package, Stage, StandaloneResolver}};
//!
//! let file = File::from_file("Content/PrimalEarth/Dinos/Dodo/Dodo_Character_BP.uasset".as_ref())?;
//! let package = Package::deserialize("/Game/PrimalEarth/Dinos/Dodo/Dodo_Character_BP", file)?;
//! package.advance_to(Stage::PropertiesParsed, &StandaloneResolver, &LoaderConfig::default())?;
//!
//! if let Some(export) = package.default_export() {
//!     for property in export.properties()? {
//!         println!("{}[{}] = {}", property.name, property.index, property.value);
//!     }
//! }
//! # Ok::<(), uepkg::Error>(())
//! ```

pub mod bulkdata;
pub mod exports;
pub mod header;
pub mod imports;
mod link;
pub mod names;
pub mod objects;
pub mod properties;
mod stage;

use std::{
    fmt,
    sync::{
        atomic::{AtomicU8, Ordering},
        Arc, Mutex,
    },
};

use log::{debug, trace};

pub use link::{ImportResolver, StandaloneResolver};
pub use stage::Stage;

use crate::{
    config::{LoaderConfig, PropertyBoundary},
    file::File,
    package::{
        bulkdata::BulkData,
        exports::{Export, ExportEntry, ExportRc},
        header::PackageHeader,
        imports::Import,
        names::NameTable,
        objects::{ObjectIndex, ObjectRef},
        properties::PropertyDecoder,
    },
    Error, Result,
};

/// A reference counted package
pub type PackageRc = Arc<Package>;

/// One decoded package.
pub struct Package {
    name: String,
    file: File,
    header: PackageHeader,
    names: NameTable,
    imports: Vec<Import>,
    exports: Vec<ExportRc>,
    default_export: Option<usize>,
    /// Current [`Stage`], stored as its discriminant
    stage: AtomicU8,
    /// Serializes stage upgrades
    upgrade: Mutex<()>,
}

impl Package {
    /// Deserializes the header and tables of a package.
    ///
    /// `name` is the package's logical name, e.g. `/Game/PrimalEarth/Dinos/Dodo/Dodo_Character_BP`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Decoding`] tagged with [`Stage::Deserialized`] if the header
    /// or a table is damaged.
    pub fn deserialize(name: impl Into<String>, file: File) -> Result<PackageRc> {
        let name = name.into();
        let (header, names, imports, entries) =
            read_tables(&file).map_err(|error| Error::Decoding {
                package: name.clone(),
                stage: Stage::Deserialized,
                reached: None,
                source: Box::new(error),
            })?;

        let default_export = find_default_export(&name, &entries);
        debug!(
            "Deserialized {} ({} names, {} imports, {} exports)",
            name,
            names.len(),
            imports.len(),
            entries.len()
        );

        Ok(Arc::new_cyclic(|package| Package {
            exports: entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| {
                    Arc::new(Export::new(index, entry, name.clone(), package.clone()))
                })
                .collect(),
            name,
            file,
            header,
            names,
            imports,
            default_export,
            stage: AtomicU8::new(Stage::Deserialized as u8),
            upgrade: Mutex::new(()),
        }))
    }

    /// Deserializes a package from an in-memory buffer.
    ///
    /// # Errors
    /// See [`Package::deserialize`]; also [`crate::Error::Empty`] for an empty buffer.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<PackageRc> {
        Package::deserialize(name, File::from_mem(data)?)
    }

    /// Logical package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last path component of the package name.
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// The decoded header.
    #[must_use]
    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    /// The name table.
    #[must_use]
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// The import table.
    #[must_use]
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// The export table.
    #[must_use]
    pub fn exports(&self) -> &[ExportRc] {
        &self.exports
    }

    /// The underlying file.
    #[must_use]
    pub fn file(&self) -> &File {
        &self.file
    }

    /// The main object of the package.
    ///
    /// This is the only export if there is exactly one, otherwise the first top-level export
    /// named like the package itself.
    #[must_use]
    pub fn default_export(&self) -> Option<&ExportRc> {
        self.default_export.and_then(|index| self.exports.get(index))
    }

    /// Finds a top-level export by name.
    #[must_use]
    pub fn find_export(&self, name: &str) -> Option<&ExportRc> {
        self.exports
            .iter()
            .find(|export| export.is_top_level() && export.name() == name)
    }

    /// The stage this package has reached.
    #[must_use]
    pub fn stage(&self) -> Stage {
        Stage::from_repr(self.stage.load(Ordering::Acquire)).unwrap_or(Stage::Deserialized)
    }

    /// Returns `true` once references are resolved.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.stage() >= Stage::Linked
    }

    /// Returns `true` once property lists are decoded.
    #[must_use]
    pub fn has_properties(&self) -> bool {
        self.stage() >= Stage::PropertiesParsed
    }

    /// Returns `true` once bulk data records are decoded.
    #[must_use]
    pub fn has_bulk_data(&self) -> bool {
        self.stage() >= Stage::BulkDataParsed
    }

    /// Validates an object index against this package's tables.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnresolvedReference`] describing `what` if the index is out
    /// of range.
    pub fn resolve_index(&self, index: ObjectIndex, what: &str) -> Result<ObjectRef> {
        index
            .resolve(self.imports.len(), self.exports.len())
            .ok_or_else(|| Error::UnresolvedReference {
                package: self.name.clone(),
                index: index.0,
                message: what.to_string(),
            })
    }

    /// Full path of a referenced object; the bare name before linking.
    #[must_use]
    pub fn object_path(&self, reference: ObjectRef) -> Option<String> {
        match reference {
            ObjectRef::Null => None,
            ObjectRef::Import(index) => self.imports.get(index).map(|import| {
                import
                    .full_path()
                    .map_or_else(|| import.object_name.clone(), str::to_string)
            }),
            ObjectRef::Export(index) => self.exports.get(index).map(|export| {
                export
                    .path()
                    .map_or_else(|_| export.name().to_string(), str::to_string)
            }),
        }
    }

    /// The bulk payload bytes of one of this package's exports.
    ///
    /// # Errors
    /// Returns [`crate::Error::StageNotReached`] before bulk data is parsed.
    pub fn bulk_payload(&self, export: &Export) -> Result<Option<&[u8]>> {
        if export.package_name() != self.name {
            return Err(Error::Error(format!(
                "Export '{}' belongs to '{}', not '{}'",
                export.name(),
                export.package_name(),
                self.name
            )));
        }

        match export.bulk_data()? {
            Some(BulkData {
                payload: Some(range),
                ..
            }) => Ok(Some(self.file.data_slice(range.start, range.len())?)),
            _ => Ok(None),
        }
    }

    /// Runs the missing stages up to `target`, in order, on this package.
    ///
    /// Returns the stage reached. A package already at or beyond `target` is left alone.
    /// Upgrades are serialized per package.
    ///
    /// # Errors
    /// Returns [`crate::Error::Decoding`] naming the failing stage; the package stays at the
    /// last stage that completed. Returns [`crate::Error::LockError`] if an earlier upgrade
    /// panicked while holding the upgrade lock.
    pub fn advance_to(
        &self,
        target: Stage,
        resolver: &dyn ImportResolver,
        config: &LoaderConfig,
    ) -> Result<Stage> {
        if self.stage() >= target {
            return Ok(self.stage());
        }

        let _upgrade = lock!(self.upgrade)?;
        while let Some(next) = self.stage().next().filter(|&next| next <= target) {
            let reached = self.stage();
            let result = match next {
                Stage::Deserialized => Ok(()),
                Stage::Linked => self.run_link(resolver),
                Stage::PropertiesParsed => self.run_properties(config),
                Stage::BulkDataParsed => self.run_bulk_data(config),
            };

            if let Err(error) = result {
                debug!("{} failed at {}: {}", self.name, next, error);
                return Err(Error::Decoding {
                    package: self.name.clone(),
                    stage: next,
                    reached: Some(reached),
                    source: Box::new(error),
                });
            }

            self.stage.store(next as u8, Ordering::Release);
            debug!("{} reached {}", self.name, next);
        }

        Ok(self.stage())
    }

    fn run_link(&self, resolver: &dyn ImportResolver) -> Result<()> {
        let linked = link::link(self, resolver)?;

        for ((import, path), target) in self
            .imports
            .iter()
            .zip(linked.import_paths)
            .zip(linked.import_targets)
        {
            let _ = import.full_path.set(path);
            let _ = import.target.set(target);
        }
        for (export, link) in self.exports.iter().zip(linked.exports) {
            let _ = export.link.set(link);
        }

        Ok(())
    }

    fn run_properties(&self, config: &LoaderConfig) -> Result<()> {
        let file = self.file.cursor();
        let decoder = PropertyDecoder::new(self, config.max_property_depth);

        let mut lists = Vec::with_capacity(self.exports.len());
        for export in &self.exports {
            let boundary = config.boundary_for(export.class_name()?);
            let mut cursor = export.serial_cursor(&file)?;
            let list = decoder.read_list(&mut cursor, boundary)?;
            trace!(
                "{}: decoded {} properties of '{}' ({})",
                self.name,
                list.len(),
                export.name(),
                boundary
            );
            lists.push(list);
        }

        for (export, list) in self.exports.iter().zip(lists) {
            let _ = export.properties.set(list);
        }

        Ok(())
    }

    fn run_bulk_data(&self, config: &LoaderConfig) -> Result<()> {
        let file = self.file.cursor();

        let mut records = Vec::with_capacity(self.exports.len());
        for export in &self.exports {
            let record = if !export.declares_bulk_data() {
                None
            } else if config.boundary_for(export.class_name()?) == PropertyBoundary::DeclaredSize
            {
                debug!(
                    "{}: '{}' spans its whole serial region, no bulk record",
                    self.name,
                    export.name()
                );
                None
            } else {
                let mut cursor = export.serial_cursor(&file)?;
                cursor.seek(export.properties()?.end())?;
                Some(BulkData::read(
                    &mut cursor,
                    &file,
                    self.header.bulk_data_start(),
                )?)
            };
            records.push(record);
        }

        for (export, record) in self.exports.iter().zip(records) {
            let _ = export.bulk_data.set(record);
        }

        Ok(())
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("name", &self.name)
            .field("stage", &self.stage())
            .field("names", &self.names.len())
            .field("imports", &self.imports.len())
            .field("exports", &self.exports.len())
            .finish_non_exhaustive()
    }
}

fn read_tables(file: &File) -> Result<(PackageHeader, NameTable, Vec<Import>, Vec<ExportEntry>)> {
    let data = file.cursor();

    let mut cursor = data;
    let header = PackageHeader::read(&mut cursor)?;

    cursor.seek(header.name_offset as usize)?;
    let names = NameTable::read(&mut cursor, header.name_count as usize)?;

    let count = header.import_count as usize;
    let mut imports = Vec::with_capacity(count.min(data.len()));
    if count > 0 {
        cursor.seek(header.import_offset as usize)?;
        for index in 0..count {
            imports.push(Import::read(&mut cursor, &names, index)?);
        }
    }

    let count = header.export_count as usize;
    let mut exports = Vec::with_capacity(count.min(data.len()));
    if count > 0 {
        cursor.seek(header.export_offset as usize)?;
        for _ in 0..count {
            exports.push(ExportEntry::read(&mut cursor, &names, file.len())?);
        }
    }

    Ok((header, names, imports, exports))
}

fn short_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn find_default_export(name: &str, entries: &[ExportEntry]) -> Option<usize> {
    if entries.len() == 1 {
        return Some(0);
    }

    let short = short_name(name);
    entries
        .iter()
        .position(|entry| entry.outer.is_null() && entry.name == short)
}
