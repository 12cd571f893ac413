//! Minidump file header.
//!
//! The header is the fixed 36-byte structure at offset 0 of every dump: the `MDMP`
//! signature, format versions, the stream count and directory location, and the
//! [`DumpFlags`] bit-set describing which data classes the producer captured.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use dumpscope::Minidump;
//!
//! let dump = Minidump::from_file("crash.dmp".as_ref())?;
//! let header = dump.header();
//!
//! if header.flags.contains(dumpscope::DumpFlags::WITH_FULL_MEMORY) {
//!     println!("full-memory dump, {} streams", header.number_of_streams);
//! }
//! # Ok::<(), dumpscope::Error>(())
//! ```

use bitflags::bitflags;

use crate::{file::parser::Parser, file::io::write_le_at, Result};

/// The on-disk minidump signature: the bytes `4D 44 4D 50` (`b"MDMP"`) decoded as a
/// little-endian `u32`.
pub const DUMP_SIGNATURE: u32 = 0x504d_444d;

/// Size in bytes of the serialized header.
pub const HEADER_SIZE: usize = 36;

bitflags! {
    /// MINIDUMP_TYPE - the dump producer's option bit-set stored in the header flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DumpFlags: u64 {
        /// Stack and register capture only
        const NORMAL                           = 0x0000_0000;
        /// Data sections of loaded modules included
        const WITH_DATA_SEGS                   = 0x0000_0001;
        /// All accessible process memory included (64-bit memory list)
        const WITH_FULL_MEMORY                 = 0x0000_0002;
        /// Handle information included
        const WITH_HANDLE_DATA                 = 0x0000_0004;
        /// Stack/backing-store memory filtered
        const FILTER_MEMORY                    = 0x0000_0008;
        /// Stack/backing-store memory scanned for referenced pages
        const SCAN_MEMORY                      = 0x0000_0010;
        /// Unloaded module list included
        const WITH_UNLOADED_MODULES            = 0x0000_0020;
        /// Pages referenced by stack/backing-store locals included
        const WITH_INDIRECTLY_REFERENCED_MEMORY = 0x0000_0040;
        /// Module paths filtered
        const FILTER_MODULE_PATHS              = 0x0000_0080;
        /// Full per-thread and per-process data included
        const WITH_PROCESS_THREAD_DATA         = 0x0000_0100;
        /// Private read/write pages included
        const WITH_PRIVATE_READ_WRITE_MEMORY   = 0x0000_0200;
        /// Optional data omitted
        const WITHOUT_OPTIONAL_DATA            = 0x0000_0400;
        /// Memory region information included
        const WITH_FULL_MEMORY_INFO            = 0x0000_0800;
        /// Thread state information included
        const WITH_THREAD_INFO                 = 0x0000_1000;
        /// Code sections of loaded modules included
        const WITH_CODE_SEGS                   = 0x0000_2000;
        /// Auxiliary-provider state omitted
        const WITHOUT_AUXILIARY_STATE          = 0x0000_4000;
        /// Full auxiliary-provider state included
        const WITH_FULL_AUXILIARY_STATE        = 0x0000_8000;
        /// Private write-copy pages included
        const WITH_PRIVATE_WRITE_COPY_MEMORY   = 0x0001_0000;
        /// Inaccessible memory ignored
        const IGNORE_INACCESSIBLE_MEMORY       = 0x0002_0000;
        /// Security token information included
        const WITH_TOKEN_INFORMATION           = 0x0004_0000;
        /// Module header pages included
        const WITH_MODULE_HEADERS              = 0x0008_0000;
        /// Triage-style filtering applied
        const FILTER_TRIAGE                    = 0x0010_0000;
        /// Mask of all documented option bits
        const VALID_TYPE_FLAGS                 = 0x001f_ffff;
    }
}

/// The fixed minidump header. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// File magic, always [`DUMP_SIGNATURE`]
    pub signature: u32,
    /// Format version
    pub version: u16,
    /// Producer implementation version
    pub implementation_version: u16,
    /// Number of entries in the stream directory
    pub number_of_streams: u32,
    /// File offset of the stream directory
    pub stream_directory_rva: u32,
    /// Header checksum, usually 0
    pub checksum: u32,
    /// Reserved field
    pub reserved: u32,
    /// Capture time as time_t
    pub time_date_stamp: u32,
    /// Dump option bit-set
    pub flags: DumpFlags,
}

impl Header {
    /// Decode the header from the start of `parser`, validating the signature.
    ///
    /// # Errors
    /// Returns [`crate::Error::BadSignature`] if the magic does not match, or
    /// [`crate::Error::OutOfBounds`] on a truncated header.
    pub fn parse(parser: &mut Parser) -> Result<Header> {
        let signature = parser.read_le::<u32>()?;
        if signature != DUMP_SIGNATURE {
            return Err(crate::Error::BadSignature { found: signature });
        }

        Ok(Header {
            signature,
            version: parser.read_le::<u16>()?,
            implementation_version: parser.read_le::<u16>()?,
            number_of_streams: parser.read_le::<u32>()?,
            stream_directory_rva: parser.read_le::<u32>()?,
            checksum: parser.read_le::<u32>()?,
            reserved: parser.read_le::<u32>()?,
            time_date_stamp: parser.read_le::<u32>()?,
            flags: DumpFlags::from_bits_retain(parser.read_le::<u64>()?),
        })
    }

    /// Serialize the header to its 36-byte on-disk form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buffer = [0u8; HEADER_SIZE];
        let mut offset = 0;

        // Writes into a fixed correctly-sized buffer cannot fail.
        let _ = write_le_at(&mut buffer, &mut offset, self.signature);
        let _ = write_le_at(&mut buffer, &mut offset, self.version);
        let _ = write_le_at(&mut buffer, &mut offset, self.implementation_version);
        let _ = write_le_at(&mut buffer, &mut offset, self.number_of_streams);
        let _ = write_le_at(&mut buffer, &mut offset, self.stream_directory_rva);
        let _ = write_le_at(&mut buffer, &mut offset, self.checksum);
        let _ = write_le_at(&mut buffer, &mut offset, self.reserved);
        let _ = write_le_at(&mut buffer, &mut offset, self.time_date_stamp);
        let _ = write_le_at(&mut buffer, &mut offset, self.flags.bits());

        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crafted() {
        #[rustfmt::skip]
        let header_bytes = [
            0x4D, 0x44, 0x4D, 0x50,             // "MDMP"
            0x01, 0x00, 0x01, 0x00,             // version 1, impl version 1
            0x03, 0x00, 0x00, 0x00,             // 3 streams
            0x24, 0x00, 0x00, 0x00,             // directory at 0x24
            0x00, 0x00, 0x00, 0x00,             // checksum
            0x00, 0x00, 0x00, 0x00,             // reserved
            0x78, 0x56, 0x34, 0x12,             // timestamp
            0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // WITH_FULL_MEMORY
        ];

        let mut parser = Parser::new(&header_bytes);
        let header = Header::parse(&mut parser).unwrap();

        assert_eq!(header.signature, DUMP_SIGNATURE);
        assert_eq!(header.version, 1);
        assert_eq!(header.implementation_version, 1);
        assert_eq!(header.number_of_streams, 3);
        assert_eq!(header.stream_directory_rva, 0x24);
        assert_eq!(header.time_date_stamp, 0x12345678);
        assert!(header.flags.contains(DumpFlags::WITH_FULL_MEMORY));
    }

    #[test]
    fn bad_signature() {
        let header_bytes = [0u8; HEADER_SIZE];
        let mut parser = Parser::new(&header_bytes);

        let result = Header::parse(&mut parser);
        assert!(matches!(
            result,
            Err(crate::Error::BadSignature { found: 0 })
        ));
    }

    #[test]
    fn truncated() {
        let header_bytes = [0x4D, 0x44, 0x4D, 0x50, 0x01, 0x00];
        let mut parser = Parser::new(&header_bytes);

        assert!(matches!(
            Header::parse(&mut parser),
            Err(crate::Error::OutOfBounds)
        ));
    }

    #[test]
    fn round_trip() {
        let header = Header {
            signature: DUMP_SIGNATURE,
            version: 42,
            implementation_version: 7,
            number_of_streams: 13,
            stream_directory_rva: 0x1000,
            checksum: 0xdeadbeef,
            reserved: 0,
            time_date_stamp: 0x5f5e_0ff0,
            flags: DumpFlags::WITH_FULL_MEMORY
                | DumpFlags::WITH_HANDLE_DATA
                | DumpFlags::WITH_THREAD_INFO,
        };

        let bytes = header.to_bytes();
        let mut parser = Parser::new(&bytes);
        let reparsed = Header::parse(&mut parser).unwrap();

        assert_eq!(reparsed, header);
    }
}
