//! Package file access and binary decoding primitives.
//!
//! This module abstracts over where package bytes come from (disk or memory) and provides
//! the bounded cursor every decoding layer reads through.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - An immutable, shareable package byte buffer
//! - [`crate::file::Backend`] - Trait for different data sources
//! - [`crate::file::cursor::Cursor`] - Bounds-checked little-endian reader over a window
//! - [`crate::file::io`] - Low-level primitive decoding
//!
//! ## Backend Implementations
//! - `Physical` - memory-mapped package files on disk
//! - `Memory` - owned in-memory buffers
//!
//! # Examples
//!
//! ```rust
//! use uepkg::File;
//!
//! let file = File::from_mem(vec![0xC1, 0x83, 0x2A, 0x9E])?;
//! let mut cursor = file.cursor();
//! assert_eq!(cursor.read_u32()?, 0x9E2A_83C1);
//! # Ok::<(), uepkg::Error>(())
//! ```

pub mod cursor;
pub mod io;
mod memory;
mod physical;

use std::path::Path;

use crate::{file::cursor::Cursor, Result};
use memory::Memory;
use physical::Physical;

/// A source of package bytes.
///
/// Backends only expose their buffer; range checks are shared. Implementations must be
/// thread-safe so that a [`File`] can be shared between the loader cache and every package
/// holding it.
pub trait Backend: Send + Sync {
    /// The whole buffer.
    fn data(&self) -> &[u8];

    /// Length of the buffer in bytes.
    fn len(&self) -> usize {
        self.data().len()
    }

    /// The `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EndOfStream`] if the range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let data = self.data();
        offset
            .checked_add(len)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| end_of_stream_error!(offset, len, data.len().saturating_sub(offset)))
    }
}

/// An immutable package byte buffer.
///
/// A `File` never changes after construction; packages keep it alive for as long as any
/// of their stages still need to read from it.
pub struct File {
    /// The underlying data source (memory or file).
    data: Box<dyn Backend>,
}

impl File {
    /// Memory-maps a package file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened, or
    /// [`crate::Error::Empty`] if it is empty.
    pub fn from_file(file: &Path) -> Result<File> {
        let input = Physical::new(file)?;
        if input.len() == 0 {
            return Err(crate::Error::Empty);
        }

        Ok(File {
            data: Box::new(input),
        })
    }

    /// Wraps an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Empty`] if `data` is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        if data.is_empty() {
            return Err(crate::Error::Empty);
        }

        Ok(File {
            data: Box::new(Memory::new(data)),
        })
    }

    /// Returns the length of the buffer in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == 0
    }

    /// Returns the whole buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data.data()
    }

    /// Returns a bounds-checked slice of the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EndOfStream`] if the range is out of bounds.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.data.data_slice(offset, len)
    }

    /// Returns a cursor over the whole buffer.
    #[must_use]
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self.data.data())
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn from_mem() {
        let file = File::from_mem(vec![1, 2, 3, 4]).unwrap();
        assert_eq!(file.len(), 4);
        assert!(!file.is_empty());
        assert_eq!(file.data_slice(1, 2).unwrap(), &[2, 3]);
        assert!(file.data_slice(3, 2).is_err());
        assert_eq!(file.cursor().read_u32().unwrap(), 0x0403_0201);
    }

    #[test]
    fn from_mem_empty() {
        assert!(matches!(File::from_mem(Vec::new()), Err(Error::Empty)));
    }

    #[test]
    fn from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Test.uasset");
        std::fs::write(&path, [9u8, 8, 7]).unwrap();

        let file = File::from_file(&path).unwrap();
        assert_eq!(file.data(), &[9, 8, 7]);
    }
}
