//! Where package bytes come from.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{config::LoaderConfig, file::File, Error, Result};

/// A provider of package files, addressed by cleaned package name
/// (e.g. `/Game/PrimalEarth/Dinos/Dodo/Dodo_Character_BP`).
pub trait PackageSource: Send + Sync {
    /// Opens the package called `name`.
    ///
    /// # Errors
    /// Returns [`crate::Error::PackageNotFound`] if there is no such package, or the I/O
    /// error that prevented opening it.
    fn load(&self, name: &str) -> Result<File>;

    /// Lists the names of all available packages, sorted.
    ///
    /// # Errors
    /// Returns the I/O error that prevented listing.
    fn list(&self) -> Result<Vec<String>>;
}

/// Packages in a content directory on disk, memory-mapped on load.
///
/// The directory is mounted at the configured mount point: with the default configuration,
/// `Content/PrimalEarth/Test.uasset` is the package `/Game/PrimalEarth/Test`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    mount_point: String,
    extension: String,
}

impl DirectorySource {
    /// Mounts `root` with the default mount point and file extension.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_config(root, &LoaderConfig::default())
    }

    /// Mounts `root` with the mount point and file extension of `config`.
    pub fn with_config(root: impl Into<PathBuf>, config: &LoaderConfig) -> Self {
        DirectorySource {
            root: root.into(),
            mount_point: config.mount_point.trim_end_matches('/').to_string(),
            extension: config.package_extension.clone(),
        }
    }

    /// The mounted directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The file a package name maps to, if the name is below the mount point.
    #[must_use]
    pub fn path_for(&self, name: &str) -> Option<PathBuf> {
        let relative = name
            .strip_prefix(&self.mount_point)?
            .strip_prefix('/')?;

        let mut path = self.root.clone();
        path.extend(relative.split('/').filter(|part| !part.is_empty()));
        path.set_extension(&self.extension);
        Some(path)
    }

    fn collect(&self, dir: &Path, prefix: &str, names: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            if entry.file_type()?.is_dir() {
                let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                self.collect(&path, &format!("{prefix}/{dir_name}"), names)?;
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
            {
                names.push(format!("{prefix}/{stem}"));
            }
        }
        Ok(())
    }
}

impl PackageSource for DirectorySource {
    fn load(&self, name: &str) -> Result<File> {
        let path = self
            .path_for(name)
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        if !path.is_file() {
            return Err(Error::PackageNotFound(name.to_string()));
        }
        File::from_file(&path)
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        self.collect(&self.root, &self.mount_point, &mut names)?;
        names.sort();
        Ok(names)
    }
}

/// Packages held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    packages: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a package.
    pub fn insert(&mut self, name: impl Into<String>, data: Vec<u8>) -> &mut Self {
        self.packages.insert(name.into(), data);
        self
    }

    /// Adds a package, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(name, data);
        self
    }
}

impl PackageSource for MemorySource {
    fn load(&self, name: &str) -> Result<File> {
        let data = self
            .packages
            .get(name)
            .ok_or_else(|| Error::PackageNotFound(name.to_string()))?;
        File::from_mem(data.clone())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.packages.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_names() {
        let dir = tempfile::tempdir().unwrap();
        let dinos = dir.path().join("PrimalEarth").join("Dinos");
        fs::create_dir_all(&dinos).unwrap();
        fs::write(dinos.join("Dodo.uasset"), [1u8, 2, 3]).unwrap();
        fs::write(dinos.join("Dodo.uexp"), [1u8]).unwrap();
        fs::write(dir.path().join("Root.uasset"), [1u8]).unwrap();

        let source = DirectorySource::new(dir.path());
        assert_eq!(
            source.list().unwrap(),
            vec!["/Game/PrimalEarth/Dinos/Dodo", "/Game/Root"]
        );
        assert_eq!(source.load("/Game/PrimalEarth/Dinos/Dodo").unwrap().len(), 3);
        assert!(matches!(
            source.load("/Game/PrimalEarth/Dinos/Raptor"),
            Err(Error::PackageNotFound(_))
        ));
        assert!(source.path_for("/Script/Engine").is_none());
    }

    #[test]
    fn memory_source() {
        let source = MemorySource::new()
            .with("/Game/B", vec![2])
            .with("/Game/A", vec![1]);
        assert_eq!(source.list().unwrap(), vec!["/Game/A", "/Game/B"]);
        assert_eq!(source.load("/Game/B").unwrap().data(), &[2]);
        assert!(source.load("/Game/C").is_err());
    }
}
