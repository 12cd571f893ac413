//! The captured virtual address space.
//!
//! An [`AddressSpace`] flattens whichever memory list a dump carries into a
//! single ordered run of [`MemorySegment`]s, each mapping a virtual range to the
//! file offset where its bytes landed. It answers "is this address captured and
//! where" without touching the payload bytes.

use crate::format::streams::{Memory64List, MemoryList};

/// One captured virtual memory range and its location in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySegment {
    /// Virtual address of the first byte
    pub start_address: u64,
    /// Virtual address one past the last byte
    pub end_address: u64,
    /// Length in bytes
    pub size: u64,
    /// Offset of the payload in the file
    pub file_offset: u64,
}

impl MemorySegment {
    /// Build a segment from a start address, size, and file offset.
    #[must_use]
    pub fn new(start_address: u64, size: u64, file_offset: u64) -> MemorySegment {
        MemorySegment {
            start_address,
            end_address: start_address.saturating_add(size),
            size,
            file_offset,
        }
    }

    /// Whether `address` belongs to this segment. Both the start and the end
    /// address answer true, so a cursor parked exactly at the end still resolves
    /// to the segment it just consumed.
    #[must_use]
    pub fn inrange(&self, address: u64) -> bool {
        address >= self.start_address && address <= self.end_address
    }

    /// Bytes between `address` and the segment end, or `None` when the address
    /// is outside the segment.
    #[must_use]
    pub fn remaining(&self, address: u64) -> Option<u64> {
        self.inrange(address)
            .then(|| self.end_address - address)
    }
}

/// The set of captured segments for one dump, in directory order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressSpace {
    segments: Vec<MemorySegment>,
    pointer_size: u64,
}

impl AddressSpace {
    /// Build from a 32-bit memory list; each range carries its own file offset.
    #[must_use]
    pub fn from_memory_list(list: &MemoryList, pointer_size: u64) -> AddressSpace {
        let segments = list
            .ranges
            .iter()
            .map(|range| {
                MemorySegment::new(
                    range.start_of_memory_range,
                    u64::from(range.memory.data_size),
                    u64::from(range.memory.rva),
                )
            })
            .collect();

        AddressSpace {
            segments,
            pointer_size,
        }
    }

    /// Build from a 64-bit memory list; file offsets were accumulated at parse
    /// time.
    #[must_use]
    pub fn from_memory64_list(list: &Memory64List, pointer_size: u64) -> AddressSpace {
        let segments = list
            .ranges
            .iter()
            .map(|range| {
                MemorySegment::new(
                    range.start_of_memory_range,
                    range.data_size,
                    range.file_offset,
                )
            })
            .collect();

        AddressSpace {
            segments,
            pointer_size,
        }
    }

    /// Pointer width in bytes of the dumped process.
    #[must_use]
    pub fn pointer_size(&self) -> u64 {
        self.pointer_size
    }

    /// The first segment containing `address`, in list order.
    #[must_use]
    pub fn find_segment(&self, address: u64) -> Option<&MemorySegment> {
        self.segments.iter().find(|segment| segment.inrange(address))
    }

    /// All captured segments in list order.
    #[must_use]
    pub fn segments(&self) -> &[MemorySegment] {
        &self.segments
    }

    /// Total number of captured bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.segments.iter().map(|segment| segment.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::streams::memory_list::MemoryDescriptor64;

    fn space() -> AddressSpace {
        AddressSpace::from_memory64_list(
            &Memory64List {
                base_rva: 0x1000,
                ranges: vec![
                    MemoryDescriptor64 {
                        start_of_memory_range: 0x40_0000,
                        data_size: 0x1000,
                        file_offset: 0x1000,
                    },
                    MemoryDescriptor64 {
                        start_of_memory_range: 0x50_0000,
                        data_size: 0x2000,
                        file_offset: 0x2000,
                    },
                ],
            },
            8,
        )
    }

    #[test]
    fn inrange_includes_both_ends() {
        let segment = MemorySegment::new(0x1000, 0x1000, 0);
        assert!(segment.inrange(0x1000));
        assert!(segment.inrange(0x1800));
        assert!(segment.inrange(0x2000));
        assert!(!segment.inrange(0xfff));
        assert!(!segment.inrange(0x2001));
    }

    #[test]
    fn segment_lookup() {
        let space = space();
        assert_eq!(
            space.find_segment(0x40_0800).map(|s| s.file_offset),
            Some(0x1000)
        );
        assert_eq!(
            space.find_segment(0x50_1fff).map(|s| s.file_offset),
            Some(0x2000)
        );
        assert!(space.find_segment(0x60_0000).is_none());
        assert_eq!(space.total_size(), 0x3000);
    }

    #[test]
    fn remaining_bytes() {
        let segment = MemorySegment::new(0x1000, 0x100, 0);
        assert_eq!(segment.remaining(0x1000), Some(0x100));
        assert_eq!(segment.remaining(0x10f0), Some(0x10));
        assert_eq!(segment.remaining(0x1100), Some(0));
        assert_eq!(segment.remaining(0x2000), None);
    }
}
