//! `MemoryListStream` and `Memory64ListStream` - the captured memory ranges.
//!
//! These two streams are the ground truth for where process memory landed in the
//! file. The 32-bit list stores a location descriptor per range; the 64-bit list
//! stores only sizes, with payloads packed back to back starting at a single base
//! RVA, so file offsets must be accumulated during parsing.

use crate::{
    file::parser::Parser,
    format::directory::LocationDescriptor,
    Result,
};

/// MINIDUMP_MEMORY_DESCRIPTOR - a captured range with an explicit file location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryDescriptor {
    /// Virtual address of the first captured byte
    pub start_of_memory_range: u64,
    /// Where the bytes live in the file
    pub memory: LocationDescriptor,
}

impl MemoryDescriptor {
    /// Decode one 16-byte descriptor.
    pub fn parse(parser: &mut Parser) -> Result<MemoryDescriptor> {
        Ok(MemoryDescriptor {
            start_of_memory_range: parser.read_le::<u64>()?,
            memory: LocationDescriptor::parse(parser)?,
        })
    }
}

/// MINIDUMP_MEMORY_LIST - ranges captured with 32-bit location descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryList {
    /// The captured ranges
    pub ranges: Vec<MemoryDescriptor>,
}

impl MemoryList {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<MemoryList> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let count = parser.read_le::<u32>()? as usize;
        let mut ranges = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            ranges.push(MemoryDescriptor::parse(&mut parser)?);
        }

        Ok(MemoryList { ranges })
    }
}

/// A captured range from the 64-bit list, with its accumulated file offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryDescriptor64 {
    /// Virtual address of the first captured byte
    pub start_of_memory_range: u64,
    /// Length of the range in bytes
    pub data_size: u64,
    /// File offset of the range payload, derived from the list base RVA
    pub file_offset: u64,
}

/// MINIDUMP_MEMORY64_LIST - ranges packed back to back after a single base RVA.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Memory64List {
    /// File offset where the packed payloads begin
    pub base_rva: u64,
    /// The captured ranges
    pub ranges: Vec<MemoryDescriptor64>,
}

impl Memory64List {
    /// Decode the stream at `location_rva`, accumulating per-range file offsets.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<Memory64List> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let count = parser.read_le::<u64>()?;
        let base_rva = parser.read_le::<u64>()?;

        let mut ranges = Vec::with_capacity(usize::try_from(count.min(4096)).unwrap_or(0));
        let mut file_offset = base_rva;
        for _ in 0..count {
            let start_of_memory_range = parser.read_le::<u64>()?;
            let data_size = parser.read_le::<u64>()?;

            ranges.push(MemoryDescriptor64 {
                start_of_memory_range,
                data_size,
                file_offset,
            });

            file_offset = file_offset.checked_add(data_size).ok_or_else(|| {
                malformed_error!(
                    "Memory64 range at {:#018x} overflows the file offset accumulator",
                    start_of_memory_range
                )
            })?;
        }

        Ok(Memory64List { base_rva, ranges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_list() {
        #[rustfmt::skip]
        let stream = [
            0x02, 0x00, 0x00, 0x00,                         // 2 ranges
            0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // start 0x1000
            0x00, 0x02, 0x00, 0x00,                         // size 0x200
            0x00, 0x40, 0x00, 0x00,                         // rva 0x4000
            0x00, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // start 0x3000
            0x00, 0x01, 0x00, 0x00,                         // size 0x100
            0x00, 0x42, 0x00, 0x00,                         // rva 0x4200
        ];

        let list = MemoryList::parse(&stream, 0).unwrap();
        assert_eq!(list.ranges.len(), 2);
        assert_eq!(list.ranges[0].start_of_memory_range, 0x1000);
        assert_eq!(list.ranges[0].memory.data_size, 0x200);
        assert_eq!(list.ranges[1].memory.rva, 0x4200);
    }

    #[test]
    fn memory64_offsets_accumulate() {
        #[rustfmt::skip]
        let stream = [
            0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 3 ranges
            0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // base rva 0x1000
            0x00, 0x00, 0x40, 0x00, 0x00, 0x00, 0x00, 0x00, // start 0x400000
            0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // size 0x1000
            0x00, 0x00, 0x50, 0x00, 0x00, 0x00, 0x00, 0x00, // start 0x500000
            0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // size 0x2000
            0x00, 0x00, 0x60, 0x00, 0x00, 0x00, 0x00, 0x00, // start 0x600000
            0x00, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // size 0x400
        ];

        let list = Memory64List::parse(&stream, 0).unwrap();
        assert_eq!(list.base_rva, 0x1000);
        assert_eq!(list.ranges[0].file_offset, 0x1000);
        assert_eq!(list.ranges[1].file_offset, 0x2000);
        assert_eq!(list.ranges[2].file_offset, 0x4000);
    }

    #[test]
    fn empty_lists() {
        let stream32 = [0x00, 0x00, 0x00, 0x00];
        assert!(MemoryList::parse(&stream32, 0).unwrap().ranges.is_empty());

        #[rustfmt::skip]
        let stream64 = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        assert!(Memory64List::parse(&stream64, 0).unwrap().ranges.is_empty());
    }
}
