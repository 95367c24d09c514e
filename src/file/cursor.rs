//! Bounded little-endian cursor used for all package decoding.
//!
//! This module provides the [`crate::file::cursor::Cursor`] type, a cursor over a window of an
//! immutable byte buffer. Every higher layer (header, tables, tagged properties, bulk data)
//! reads exclusively through it.
//!
//! # Architecture
//!
//! A cursor is the triple `(buffer, [start, end), position)`. The buffer is borrowed and never
//! copied; narrowing to a sub-window only produces a new triple over the same slice. Positions
//! are absolute offsets into the backing buffer, which matches how package tables address
//! object bodies.
//!
//! - **Bounds checking** - every read validates against the window end, not the buffer end
//! - **Atomic reads** - a failing read leaves the position where it was
//! - **Package strings** - single-byte and UTF-16LE strings, length-prefixed and
//!   null-terminated
//!
//! # Usage Examples
//!
//! ```rust
//! use uepkg::Cursor;
//!
//! let data = [0x2A, 0x00, 0x00, 0x00, 0x01, 0x05, 0x00, 0x00, 0x00, b'D', b'o', b'd', b'o', 0x00];
//! let mut cursor = Cursor::new(&data);
//!
//! assert_eq!(cursor.read_i32()?, 42);
//! assert!(cursor.read_bool8()?);
//! assert_eq!(cursor.read_fstring()?, "Dodo");
//! assert!(cursor.is_exhausted());
//! # Ok::<(), uepkg::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, PakIO},
    Result,
};

/// A bounds-checked reader over a window of a byte buffer.
///
/// `Cursor` is `Copy`: cloning it is a cheap way to look ahead without disturbing the
/// original position.
///
/// # Examples
///
/// ```rust
/// use uepkg::Cursor;
///
/// let data = [0u8, 1, 2, 3, 4, 5, 6, 7];
/// let cursor = Cursor::new(&data);
///
/// // A window over bytes 4..8 shares the same buffer
/// let mut tail = cursor.window(4, 4)?;
/// assert_eq!(tail.pos(), 4);
/// assert_eq!(tail.read_u32()?, 0x0706_0504);
/// assert!(tail.read_u8().is_err());
/// # Ok::<(), uepkg::Error>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    /// The complete backing buffer
    data: &'a [u8],
    /// First readable offset of the window
    start: usize,
    /// One past the last readable offset of the window
    end: usize,
    /// Current absolute position
    position: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor whose window covers the whole buffer.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Cursor {
            data,
            start: 0,
            end: data.len(),
            position: 0,
        }
    }

    /// Create a cursor over `len` bytes of `data` starting at `offset`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if the window does not fit into `data`.
    pub fn with_window(data: &'a [u8], offset: usize, len: usize) -> Result<Self> {
        Cursor::new(data).window(offset, len)
    }

    /// Create a cursor over a window of this cursor's window.
    ///
    /// `offset` is absolute. The new cursor starts at `offset` and shares the same buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if the requested window is not fully contained
    /// in this cursor's window.
    pub fn window(&self, offset: usize, len: usize) -> Result<Cursor<'a>> {
        let available = self.end.saturating_sub(offset);
        let Some(end) = offset.checked_add(len) else {
            return Err(end_of_stream_error!(offset, len, available));
        };

        if offset < self.start || end > self.end {
            return Err(end_of_stream_error!(offset, len, available));
        }

        Ok(Cursor {
            data: self.data,
            start: offset,
            end,
            position: offset,
        })
    }

    /// Split off the next `len` bytes as their own cursor and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than `len` bytes remain.
    pub fn sub(&mut self, len: usize) -> Result<Cursor<'a>> {
        let sub = self.window(self.position, len)?;
        self.position = sub.end;
        Ok(sub)
    }

    /// Number of bytes in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// First absolute offset of the window.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last absolute offset of the window.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Current absolute position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Bytes left between the position and the window end.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.position)
    }

    /// Returns `true` if every byte of the window has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.end
    }

    /// Move to an absolute position inside the window.
    ///
    /// Seeking to [`Cursor::end`] is allowed and leaves the cursor exhausted.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if `pos` lies outside the window.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos < self.start || pos > self.end {
            return Err(end_of_stream_error!(pos, 0, self.end.saturating_sub(pos)));
        }

        self.position = pos;
        Ok(())
    }

    /// Advance the position by `count` bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if that would pass the window end.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure_remaining(count)?;
        self.position += count;
        Ok(())
    }

    /// Check that at least `needed` bytes remain.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] otherwise.
    pub fn ensure_remaining(&self, needed: usize) -> Result<()> {
        let available = self.remaining();
        if needed > available {
            return Err(end_of_stream_error!(self.position, needed, available));
        }
        Ok(())
    }

    /// Execute a closure transactionally, rolling the position back on failure.
    ///
    /// # Errors
    /// Returns any error produced by `f`.
    pub fn transactional<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved_position = self.position;
        let result = f(self);
        if result.is_err() {
            self.position = saved_position;
        }
        result
    }

    /// Read a little-endian `T` and advance.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if `T` does not fit into the rest of the window.
    pub fn read_le<T: PakIO>(&mut self) -> Result<T> {
        read_le_at::<T>(&self.data[..self.end], &mut self.position)
    }

    /// Read a little-endian `T` without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if `T` does not fit into the rest of the window.
    pub fn peek_le<T: PakIO>(&self) -> Result<T> {
        let mut temp_position = self.position;
        read_le_at::<T>(&self.data[..self.end], &mut temp_position)
    }

    /// Read `count` little-endian values of `T` in one call.
    ///
    /// The whole run is bounds-checked up front, so a short window fails before anything
    /// is consumed.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if the run does not fit.
    pub fn read_array<T: PakIO>(&mut self, count: usize) -> Result<Vec<T>> {
        let Some(total) = count.checked_mul(std::mem::size_of::<T>()) else {
            return Err(end_of_stream_error!(self.position, usize::MAX, self.remaining()));
        };
        self.ensure_remaining(total)?;

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.read_le::<T>()?);
        }
        Ok(values)
    }

    /// Read a signed byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] at the window end.
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_le()
    }

    /// Read an unsigned byte.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] at the window end.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_le()
    }

    /// Read a little-endian `i32`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than 4 bytes remain.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_le()
    }

    /// Read a little-endian `u32`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_le()
    }

    /// Read a little-endian `i64`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than 8 bytes remain.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read_le()
    }

    /// Read a little-endian `u64`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than 8 bytes remain.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_le()
    }

    /// Read a little-endian `f32`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than 4 bytes remain.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_le()
    }

    /// Read a one-byte boolean; any non-zero value is `true`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] at the window end.
    pub fn read_bool8(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a four-byte boolean; any non-zero value is `true`.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than 4 bytes remain.
    pub fn read_bool32(&mut self) -> Result<bool> {
        Ok(self.read_u32()? != 0)
    }

    /// Read `length` raw bytes.
    ///
    /// The returned slice borrows from the backing buffer.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        self.ensure_remaining(length)?;
        let bytes = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(bytes)
    }

    /// Read a single-byte string of `size` bytes, the last of which is the terminator.
    ///
    /// A `size` of zero yields an empty string.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if fewer than `size` bytes remain, or
    /// [`crate::Error::Malformed`] if the terminator is missing or the text is not valid UTF-8.
    pub fn read_terminated_string(&mut self, size: usize) -> Result<String> {
        self.transactional(|cursor| {
            let start = cursor.position;
            let raw = cursor.read_bytes(size)?;
            let Some((&terminator, text)) = raw.split_last() else {
                return Ok(String::new());
            };

            if terminator != 0 {
                return Err(malformed_error!("Unterminated string at offset {}", start));
            }

            std::str::from_utf8(text)
                .map(str::to_string)
                .map_err(|_| malformed_error!("Invalid string at offset {}", start))
        })
    }

    /// Read a UTF-16LE string of `chars` code units, the last of which is the terminator.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if the string does not fit, or
    /// [`crate::Error::Malformed`] for a missing terminator or invalid UTF-16.
    pub fn read_terminated_wide_string(&mut self, chars: usize) -> Result<String> {
        self.transactional(|cursor| {
            let start = cursor.position;
            let mut units: Vec<u16> = cursor.read_array(chars)?;
            match units.pop() {
                None => return Ok(String::new()),
                Some(0) => {}
                Some(_) => {
                    return Err(malformed_error!(
                        "Unterminated wide string at offset {}",
                        start
                    ))
                }
            }

            widestring::U16Str::from_slice(&units)
                .to_string()
                .map_err(|_| malformed_error!("Invalid UTF-16 string at offset {}", start))
        })
    }

    /// Read a single-byte string prefixed by its `u32` size (terminator included).
    ///
    /// # Errors
    /// See [`Cursor::read_terminated_string`].
    pub fn read_string(&mut self) -> Result<String> {
        self.transactional(|cursor| {
            let size = cursor.read_u32()? as usize;
            cursor.read_terminated_string(size)
        })
    }

    /// Read a UTF-16LE string prefixed by its `u32` code-unit count (terminator included).
    ///
    /// # Errors
    /// See [`Cursor::read_terminated_wide_string`].
    pub fn read_wide_string(&mut self) -> Result<String> {
        self.transactional(|cursor| {
            let chars = cursor.read_u32()? as usize;
            cursor.read_terminated_wide_string(chars)
        })
    }

    /// Read a package string with a signed `i32` prefix.
    ///
    /// A positive prefix is the byte size of a single-byte string, a negative prefix is the
    /// negated code-unit count of a UTF-16LE string, and zero is the empty string. Both
    /// counts include the terminator.
    ///
    /// # Errors
    /// See [`Cursor::read_terminated_string`] and [`Cursor::read_terminated_wide_string`].
    pub fn read_fstring(&mut self) -> Result<String> {
        self.transactional(|cursor| {
            let prefix = cursor.read_i32()?;
            let count = prefix.unsigned_abs() as usize;
            if prefix < 0 {
                cursor.read_terminated_wide_string(count)
            } else {
                cursor.read_terminated_string(count)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test::builder::ByteWriter, Error};
    use quickcheck_macros::quickcheck;

    #[test]
    fn reads_all_widths() {
        let mut writer = ByteWriter::new();
        writer
            .i8(-3)
            .u8(200)
            .i32(-70000)
            .u32(0xDEAD_BEEF)
            .i64(-5_000_000_000)
            .u64(u64::MAX)
            .f32(0.25)
            .u8(7)
            .u32(0);
        let data = writer.into_bytes();

        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_i8().unwrap(), -3);
        assert_eq!(cursor.read_u8().unwrap(), 200);
        assert_eq!(cursor.read_i32().unwrap(), -70000);
        assert_eq!(cursor.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(cursor.read_i64().unwrap(), -5_000_000_000);
        assert_eq!(cursor.read_u64().unwrap(), u64::MAX);
        assert_eq!(cursor.read_f32().unwrap(), 0.25);
        assert!(cursor.read_bool8().unwrap());
        assert!(!cursor.read_bool32().unwrap());
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn window_shares_buffer_and_bounds() {
        let data: Vec<u8> = (0..16).collect();
        let cursor = Cursor::new(&data);

        let mut window = cursor.window(4, 4).unwrap();
        assert_eq!(window.start(), 4);
        assert_eq!(window.len(), 4);
        assert_eq!(window.read_bytes(4).unwrap(), &[4, 5, 6, 7]);
        assert!(matches!(
            window.read_u8(),
            Err(Error::EndOfStream {
                offset: 8,
                requested: 1,
                available: 0
            })
        ));

        assert!(cursor.window(12, 8).is_err());
        assert!(window.window(0, 2).is_err());

        let mut tail = Cursor::with_window(&data, 12, 4).unwrap();
        assert_eq!(tail.pos(), 12);
        assert_eq!(tail.read_u32().unwrap(), 0x0F0E_0D0C);
        assert!(Cursor::with_window(&data, 12, 5).is_err());
    }

    #[test]
    fn sub_advances_parent() {
        let data: Vec<u8> = (0..8).collect();
        let mut cursor = Cursor::new(&data);
        cursor.skip(1).unwrap();

        let mut sub = cursor.sub(3).unwrap();
        assert_eq!(cursor.pos(), 4);
        assert_eq!(sub.read_u8().unwrap(), 1);
        assert_eq!(sub.remaining(), 2);
        assert!(cursor.sub(5).is_err());
        assert_eq!(cursor.pos(), 4);
    }

    #[test]
    fn failed_read_keeps_position() {
        let data = [1u8, 2, 3];
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_u8().unwrap(), 1);
        assert!(cursor.read_u32().is_err());
        assert_eq!(cursor.pos(), 1);
        assert!(cursor.read_bytes(3).is_err());
        assert_eq!(cursor.pos(), 1);
        assert_eq!(cursor.read_le::<u16>().unwrap(), 0x0302);
    }

    #[test]
    fn read_array_is_all_or_nothing() {
        let data = [1u8, 0, 2, 0, 3];
        let mut cursor = Cursor::new(&data);
        assert!(cursor.read_array::<u16>(3).is_err());
        assert_eq!(cursor.pos(), 0);
        assert_eq!(cursor.read_array::<u16>(2).unwrap(), vec![1, 2]);
        assert!(cursor.read_array::<u64>(usize::MAX).is_err());
    }

    #[test]
    fn strings() {
        let mut writer = ByteWriter::new();
        writer.fstring("Dodo").wide_fstring("Ptérodactyle").i32(0);
        let data = writer.into_bytes();

        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_fstring().unwrap(), "Dodo");
        assert_eq!(cursor.read_fstring().unwrap(), "Ptérodactyle");
        assert_eq!(cursor.read_fstring().unwrap(), "");
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn unterminated_string_is_malformed() {
        let data = [3u8, 0, 0, 0, b'a', b'b', b'c'];
        let mut cursor = Cursor::new(&data);
        assert!(matches!(cursor.read_string(), Err(Error::Malformed { .. })));
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn truncated_string_rolls_back_prefix() {
        let data = [10u8, 0, 0, 0, b'a', 0];
        let mut cursor = Cursor::new(&data);
        assert!(cursor.read_string().unwrap_err().is_end_of_stream());
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn seek_and_peek() {
        let data = [1u8, 2, 3, 4];
        let mut cursor = Cursor::new(&data);
        cursor.seek(2).unwrap();
        assert_eq!(cursor.peek_le::<u8>().unwrap(), 3);
        assert_eq!(cursor.pos(), 2);
        cursor.seek(4).unwrap();
        assert!(cursor.is_exhausted());
        assert!(cursor.seek(5).is_err());
    }

    #[quickcheck]
    fn string_round_trip(text: String) -> bool {
        let mut writer = ByteWriter::new();
        writer.string(&text).wide_string(&text);
        let data = writer.into_bytes();

        let mut cursor = Cursor::new(&data);
        cursor.read_string().ok() == Some(text.clone())
            && cursor.read_wide_string().ok() == Some(text)
            && cursor.is_exhausted()
    }

    #[quickcheck]
    fn bounded_reads(size: u8, reads: Vec<u8>) -> bool {
        let data = vec![0xAB_u8; usize::from(size)];
        let mut cursor = Cursor::new(&data);
        let mut consumed = 0_usize;
        let mut results = Vec::new();

        for read in reads {
            let len = usize::from(read % 9);
            match cursor.read_bytes(len) {
                Ok(bytes) => {
                    consumed += len;
                    results.push(bytes);
                }
                Err(_) => {
                    // The overrunning read fails without moving the cursor
                    return consumed + len > data.len()
                        && cursor.pos() == consumed
                        && results.iter().all(|r| r.iter().all(|&b| b == 0xAB));
                }
            }
        }
        consumed <= data.len()
    }
}
