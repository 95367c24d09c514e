//! Little-endian primitive decoding for package data.
//!
//! This module provides the [`crate::file::io::PakIO`] trait and the bounds-checked free
//! functions built on it. Package files are little-endian throughout, so only the
//! little-endian direction is exposed; the cursor in [`crate::file::cursor`] is the only
//! intended caller.
//!
//! # Supported Types
//! - **Unsigned integers**: `u8`, `u16`, `u32`, `u64`
//! - **Signed integers**: `i8`, `i16`, `i32`, `i64`
//! - **Floating point**: `f32`, `f64`
//!
//! # Error Handling
//!
//! Every function returns [`crate::Error::EndOfStream`] when the buffer does not hold
//! enough bytes, and never advances the offset in that case.

use crate::Result;

/// Trait for fixed-width primitives that can be decoded from little-endian bytes.
///
/// Each implementation names the byte array it is decoded from via `Bytes`
/// (e.g. `[u8; 4]` for `u32`).
pub trait PakIO: Sized + Copy {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_pak_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PakIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_pak_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Safely reads a value of type `T` in little-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::EndOfStream`] if the buffer is shorter than `T`.
pub fn read_le<T: PakIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing it.
///
/// # Arguments
///
/// * `data` - The byte buffer to read from
/// * `offset` - Mutable reference to the offset position (advanced only on success)
///
/// # Errors
/// Returns [`crate::Error::EndOfStream`] if there are insufficient bytes.
///
/// # Examples
///
/// ```rust,ignore
/// use uepkg::file::io::read_le_at;
///
/// let data = [0x01, 0x00, 0x02, 0x00];
/// let mut offset = 0;
///
/// let first: u16 = read_le_at(&data, &mut offset)?;
/// assert_eq!(first, 1);
/// assert_eq!(offset, 2);
/// # Ok::<(), uepkg::Error>(())
/// ```
pub fn read_le_at<T: PakIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let available = data.len().saturating_sub(*offset);
    if type_len > available {
        return Err(end_of_stream_error!(*offset, type_len, available));
    }

    let Ok(read) = data[*offset..*offset + type_len].try_into() else {
        return Err(end_of_stream_error!(*offset, type_len, available));
    };

    *offset += type_len;

    Ok(T::from_le_bytes(read))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_widths() {
        assert_eq!(read_le::<u8>(&TEST_BUFFER).unwrap(), 0x01);
        assert_eq!(read_le::<i16>(&TEST_BUFFER).unwrap(), 0x0201);
        assert_eq!(read_le::<u32>(&TEST_BUFFER).unwrap(), 0x0403_0201);
        assert_eq!(read_le::<u64>(&TEST_BUFFER).unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn read_le_f32() {
        let data = 1.5_f32.to_le_bytes();
        assert_eq!(read_le::<f32>(&data).unwrap(), 1.5);
    }

    #[test]
    fn read_le_at_advances() {
        let mut offset = 2;
        let value = read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap();
        assert_eq!(value, 0x0403);
        assert_eq!(offset, 4);
    }

    #[test]
    fn read_le_at_overrun_keeps_offset() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(
            result,
            Err(Error::EndOfStream {
                offset: 6,
                requested: 4,
                available: 2
            })
        ));
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_le_at_offset_past_end() {
        let mut offset = 20;
        assert!(read_le_at::<u8>(&TEST_BUFFER, &mut offset).is_err());
        assert_eq!(offset, 20);
    }
}
