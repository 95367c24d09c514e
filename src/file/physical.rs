//! Memory-mapped package files.
//!
//! Content directories hold tens of thousands of packages, most of which are only
//! deserialized far enough to look at their export table. Untouched object bodies and bulk
//! payloads of a mapped file are never paged in.

use std::{fs, path::Path};

use memmap2::Mmap;

use super::Backend;
use crate::{Error, Result};

/// A package file on disk, mapped read-only.
#[derive(Debug)]
pub struct Physical {
    map: Mmap,
}

impl Physical {
    /// Maps the file at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = fs::File::open(path).map_err(Error::FileError)?;

        // Package files are treated as immutable while mapped
        let map = unsafe { Mmap::map(&file) }.map_err(Error::FileError)?;
        Ok(Physical { map })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Dodo.uasset");
        let mut data = vec![0u8; 64];
        data[..4].copy_from_slice(&[0xC1, 0x83, 0x2A, 0x9E]);
        fs::write(&path, &data).unwrap();

        let physical = Physical::new(&path).unwrap();
        assert_eq!(physical.len(), 64);
        assert_eq!(physical.data_slice(0, 4).unwrap(), &[0xC1, 0x83, 0x2A, 0x9E]);
        assert!(physical.data_slice(60, 5).is_err());
    }

    #[test]
    fn missing_file() {
        let result = Physical::new("/nonexistent/Content/Dodo.uasset");
        assert!(matches!(
            result,
            Err(Error::FileError(error)) if error.kind() == std::io::ErrorKind::NotFound
        ));
    }
}
