//! Bulk data records.
//!
//! Exports flagged with [`crate::package::exports::ExportFlags::HAS_BULK_DATA`] follow their
//! property list with a bulk data record pointing at a raw payload (texture mips, mesh
//! buffers, sound data). The payload either follows the record inline or sits in the
//! bulk section at the end of the file.
//!
//! | Field          | Type  |
//! |----------------|-------|
//! | flags          | `u32` |
//! | element count  | `u32` |
//! | size on disk   | `u32` |
//! | offset         | `i64` |

use std::ops::Range;

use bitflags::bitflags;

use crate::{file::cursor::Cursor, Result};

bitflags! {
    /// Bulk data record flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BulkDataFlags: u32 {
        /// Payload lives in the bulk section, relative to the header's bulk data start
        const PAYLOAD_AT_END_OF_FILE = 0x0000_0001;
        /// Payload is zlib compressed
        const SERIALIZE_COMPRESSED_ZLIB = 0x0000_0002;
        /// Record has no payload
        const UNUSED = 0x0000_0020;
    }
}

/// A decoded bulk data record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkData {
    /// Record flags
    pub flags: BulkDataFlags,
    /// Number of elements in the payload
    pub element_count: u32,
    /// Payload size on disk
    pub size_on_disk: u32,
    /// Raw offset as stored in the record
    pub offset: i64,
    /// Absolute byte range of the payload, if the record has one
    pub payload: Option<Range<usize>>,
}

impl BulkData {
    /// Reads a bulk data record from `cursor`, which must be windowed to the export's
    /// serial region and positioned right after its property list.
    ///
    /// `file` is a cursor over the whole package and `bulk_data_start` the header's bulk
    /// section offset; both are used to validate end-of-file payloads.
    ///
    /// # Errors
    /// Returns [`crate::Error::EndOfStream`] if the record or an inline payload does not
    /// fit into the serial region, or [`crate::Error::Malformed`] for an end-of-file
    /// payload outside of the file.
    pub fn read(
        cursor: &mut Cursor,
        file: &Cursor,
        bulk_data_start: Option<usize>,
    ) -> Result<BulkData> {
        let flags = BulkDataFlags::from_bits_retain(cursor.read_u32()?);
        let element_count = cursor.read_u32()?;
        let size_on_disk = cursor.read_u32()?;
        let offset = cursor.read_i64()?;
        let size = size_on_disk as usize;

        let payload = if flags.contains(BulkDataFlags::UNUSED) {
            None
        } else if flags.contains(BulkDataFlags::PAYLOAD_AT_END_OF_FILE) {
            let start = usize::try_from(offset)
                .ok()
                .and_then(|offset| offset.checked_add(bulk_data_start?))
                .ok_or_else(|| {
                    malformed_error!(
                        "Bulk payload at {} has no valid place in the bulk section ({:?})",
                        offset,
                        bulk_data_start
                    )
                })?;

            let window = file
                .window(start, size)
                .map_err(|_| malformed_error!("Bulk payload {}+{} lies outside of the file", start, size))?;
            Some(window.start()..window.end())
        } else {
            let inline = cursor.sub(size)?;
            Some(inline.start()..inline.end())
        };

        Ok(BulkData {
            flags,
            element_count,
            size_on_disk,
            offset,
            payload,
        })
    }

    /// Size of the payload in bytes; zero if there is none.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, ExactSizeIterator::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::builder::ByteWriter;

    #[test]
    fn inline_payload() {
        let mut writer = ByteWriter::new();
        writer.u32(0).u32(4).u32(4).i64(0).bytes(&[1, 2, 3, 4]);
        let data = writer.into_bytes();
        let file = Cursor::new(&data);

        let bulk = BulkData::read(&mut { file }, &file, None).unwrap();
        assert_eq!(bulk.payload, Some(20..24));
        assert_eq!(bulk.payload_len(), 4);
    }

    #[test]
    fn end_of_file_payload() {
        let mut writer = ByteWriter::new();
        writer
            .u32(BulkDataFlags::PAYLOAD_AT_END_OF_FILE.bits())
            .u32(2)
            .u32(2)
            .i64(1)
            .bytes(&[9, 8, 7]);
        let data = writer.into_bytes();
        let file = Cursor::new(&data);

        let bulk = BulkData::read(&mut file.window(0, 20).unwrap(), &file, Some(20)).unwrap();
        assert_eq!(bulk.payload, Some(21..23));

        assert!(BulkData::read(&mut file.window(0, 20).unwrap(), &file, None).is_err());
        assert!(BulkData::read(&mut file.window(0, 20).unwrap(), &file, Some(22)).is_err());
    }

    #[test]
    fn unused_record() {
        let mut writer = ByteWriter::new();
        writer.u32(BulkDataFlags::UNUSED.bits()).u32(0).u32(0).i64(-1);
        let data = writer.into_bytes();
        let file = Cursor::new(&data);

        let bulk = BulkData::read(&mut { file }, &file, None).unwrap();
        assert_eq!(bulk.payload, None);
        assert_eq!(bulk.payload_len(), 0);
    }

    #[test]
    fn inline_payload_overruns_region() {
        let mut writer = ByteWriter::new();
        writer.u32(0).u32(8).u32(8).i64(0).bytes(&[1, 2]);
        let data = writer.into_bytes();
        let file = Cursor::new(&data);

        assert!(BulkData::read(&mut { file }, &file, None)
            .unwrap_err()
            .is_end_of_stream());
    }
}
