//! Package loading and caching.
//!
//! [`PackageLoader`] owns the cache of decoded packages, keyed by cleaned package name. Every
//! fetch names the depth it needs; a cached package that is not yet deep enough is upgraded
//! in place, so every holder of it sees the new stages. A package is never downgraded and
//! never dropped from the cache by a shallower request.
//!
//! [`PackageLoader::get`] fetches at the depth of the active
//! [`crate::context::ParsingContext`] scope.
//!
//! # Examples
//!
//! ```rust,no_run
//! use uepkg::{
//!     context::{with_parsing_depth, DepthRequest},
//!     loader::{DirectorySource, PackageLoader},
//!     LoaderConfig,
//! };
//!
//! let loader = PackageLoader::new(DirectorySource::new("Content"), LoaderConfig::default());
//!
//! // Tables only
//! let package = with_parsing_depth(DepthRequest::new().link(false), || {
//!     loader.get("/Game/PrimalEarth/CoreBlueprints/PrimalGameData_BP")
//! })?;
//! assert!(!package.is_linked());
//!
//! // The same package, upgraded in place
//! let again = loader.get("/Game/PrimalEarth/CoreBlueprints/PrimalGameData_BP")?;
//! assert!(std::sync::Arc::ptr_eq(&package, &again));
//! assert!(package.has_properties());
//! # Ok::<(), uepkg::Error>(())
//! ```

mod instances;
mod source;

use dashmap::DashMap;
use log::debug;

pub use crate::config::{LoaderConfig, PropertyBoundary};
pub use instances::Instances;
pub use source::{DirectorySource, MemorySource, PackageSource};

use crate::{
    context::{ParsingContext, ParsingDepth},
    export::ExportUnit,
    package::{ImportResolver, Package, PackageRc},
    proxy::SchemaRegistry,
    Result,
};

/// Loads packages from a [`PackageSource`] and caches them.
pub struct PackageLoader {
    source: Box<dyn PackageSource>,
    config: LoaderConfig,
    cache: DashMap<String, PackageRc>,
}

impl PackageLoader {
    /// Creates a loader with an empty cache.
    pub fn new(source: impl PackageSource + 'static, config: LoaderConfig) -> Self {
        PackageLoader {
            source: Box::new(source),
            config,
            cache: DashMap::new(),
        }
    }

    /// The loader's configuration.
    #[must_use]
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Normalises a package name.
    ///
    /// Backslashes become slashes, the package file extension and any `.Object` suffix
    /// are dropped, duplicate slashes are collapsed, and relative names are rooted at the
    /// mount point.
    ///
    /// ```rust
    /// use uepkg::{loader::{MemorySource, PackageLoader}, LoaderConfig};
    ///
    /// let loader = PackageLoader::new(MemorySource::new(), LoaderConfig::default());
    /// assert_eq!(loader.clean_package_name("PrimalEarth\\Test\\Dodo.uasset"), "/Game/PrimalEarth/Test/Dodo");
    /// assert_eq!(loader.clean_package_name("/Game/Test/Dodo.Dodo_C"), "/Game/Test/Dodo");
    /// ```
    #[must_use]
    pub fn clean_package_name(&self, name: &str) -> String {
        let name = name.trim().replace('\\', "/");
        let (folder, last) = match name.rfind('/') {
            Some(split) => name.split_at(split + 1),
            None => ("", name.as_str()),
        };
        let last = last.split('.').next().unwrap_or(last);

        let mut parts = folder
            .split('/')
            .chain(std::iter::once(last))
            .filter(|part| !part.is_empty())
            .peekable();

        // Absolute names keep their own root, e.g. `/Script/Engine`
        let mount = self.config.mount_point.trim_matches('/');
        let rooted = name.starts_with('/') || parts.peek().is_some_and(|first| *first == mount);

        let mut cleaned = String::new();
        if !rooted {
            cleaned.push('/');
            cleaned.push_str(mount);
        }

        for part in parts {
            cleaned.push('/');
            cleaned.push_str(part);
        }
        cleaned
    }

    /// Fetches a package decoded at least to `depth`.
    ///
    /// A cached package is upgraded in place if needed; otherwise the package is loaded,
    /// deserialized and cached first.
    ///
    /// # Errors
    /// Returns [`crate::Error::PackageNotFound`], I/O errors, or [`crate::Error::Decoding`].
    /// A package that fails to deserialize is not cached; one that fails a later stage stays
    /// cached at its last good stage.
    pub fn fetch(&self, name: &str, depth: ParsingDepth) -> Result<PackageRc> {
        let name = self.clean_package_name(name);
        let package = match self.cached(&name) {
            Some(package) => {
                debug!("Cache hit: {} ({})", name, package.stage());
                package
            }
            None => {
                let file = self.source.load(&name)?;
                let package = Package::deserialize(name.clone(), file)?;
                self.cache.insert(name, package.clone());
                package
            }
        };

        package.advance_to(depth.target_stage(), self, &self.config)?;
        Ok(package)
    }

    /// Fetches a package at the depth of the current parsing scope.
    ///
    /// # Errors
    /// See [`PackageLoader::fetch`].
    pub fn get(&self, name: &str) -> Result<PackageRc> {
        self.fetch(name, ParsingContext::current())
    }

    /// The cached package of this name, without loading or upgrading anything.
    #[must_use]
    pub fn cached(&self, name: &str) -> Option<PackageRc> {
        self.cache.get(name).map(|entry| entry.value().clone())
    }

    /// Number of cached packages.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops every cached package. Packages still held elsewhere stay alive.
    pub fn wipe_cache(&self) {
        debug!("Wiping {} cached packages", self.cache.len());
        self.cache.clear();
    }

    /// Names of the packages belonging to `unit`, sorted.
    ///
    /// Core content is everything outside the mods directory; a mod's content is everything
    /// below its own directory.
    ///
    /// # Errors
    /// Returns the source's listing error.
    pub fn discover(&self, unit: &ExportUnit) -> Result<Vec<String>> {
        let mut names = self.source.list()?;
        match unit.mod_id() {
            None => {
                let mods = self.config.mods_root();
                names.retain(|name| !name.starts_with(&mods));
            }
            Some(id) => {
                let prefix = self.config.mod_prefix(id);
                names.retain(|name| name.starts_with(&prefix));
            }
        }
        Ok(names)
    }

    /// Lazily iterates over proxy instances of `ue_type` and its registered subtypes found
    /// in the packages of `unit`.
    ///
    /// # Errors
    /// Returns the source's listing error. Errors decoding individual packages are
    /// yielded by the iterator.
    pub fn instances_of_type<'l>(
        &'l self,
        registry: &'l SchemaRegistry,
        ue_type: &str,
        unit: &ExportUnit,
    ) -> Result<Instances<'l>> {
        Ok(Instances::new(
            self,
            registry,
            ue_type,
            self.discover(unit)?,
        ))
    }
}

impl ImportResolver for PackageLoader {
    fn linked_package(&self, name: &str) -> Option<PackageRc> {
        self.cached(&self.clean_package_name(name))
    }
}

impl std::fmt::Debug for PackageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageLoader")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> PackageLoader {
        PackageLoader::new(MemorySource::new(), LoaderConfig::default())
    }

    #[test]
    fn clean_names() {
        let loader = loader();
        assert_eq!(loader.clean_package_name("/Game/A/B"), "/Game/A/B");
        assert_eq!(loader.clean_package_name("Game/A/B.uasset"), "/Game/A/B");
        assert_eq!(loader.clean_package_name("A\\B.uasset"), "/Game/A/B");
        assert_eq!(loader.clean_package_name("//Game//A/B.B_C"), "/Game/A/B");
        assert_eq!(loader.clean_package_name("/Script/Engine"), "/Script/Engine");
    }

    #[test]
    fn missing_package() {
        let loader = loader();
        assert!(matches!(
            loader.fetch("/Game/Nothing", ParsingDepth::default()),
            Err(crate::Error::PackageNotFound(name)) if name == "/Game/Nothing"
        ));
        assert_eq!(loader.cache_len(), 0);
    }
}
