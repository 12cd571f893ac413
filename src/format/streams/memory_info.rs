//! `MemoryInfoStream` - the virtual memory region map.
//!
//! Unlike the memory lists, this stream describes every region of the address
//! space including ones whose bytes were not captured, so it is the place to
//! answer protection and allocation questions.

use bitflags::bitflags;

use crate::{file::parser::Parser, Result};

const ENTRY_SIZE: u32 = 48;

bitflags! {
    /// PAGE_* protection constants.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MemoryProtection: u32 {
        /// PAGE_NOACCESS
        const NOACCESS = 0x0000_0001;
        /// PAGE_READONLY
        const READONLY = 0x0000_0002;
        /// PAGE_READWRITE
        const READWRITE = 0x0000_0004;
        /// PAGE_WRITECOPY
        const WRITECOPY = 0x0000_0008;
        /// PAGE_EXECUTE
        const EXECUTE = 0x0000_0010;
        /// PAGE_EXECUTE_READ
        const EXECUTE_READ = 0x0000_0020;
        /// PAGE_EXECUTE_READWRITE
        const EXECUTE_READWRITE = 0x0000_0040;
        /// PAGE_EXECUTE_WRITECOPY
        const EXECUTE_WRITECOPY = 0x0000_0080;
        /// PAGE_GUARD
        const GUARD = 0x0000_0100;
        /// PAGE_NOCACHE
        const NOCACHE = 0x0000_0200;
        /// PAGE_WRITECOMBINE
        const WRITECOMBINE = 0x0000_0400;
        /// PAGE_TARGETS_INVALID / PAGE_TARGETS_NO_UPDATE
        const TARGETS_INVALID = 0x4000_0000;
    }
}

/// MEM_* region state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryState {
    /// MEM_COMMIT
    Commit,
    /// MEM_RESERVE
    Reserve,
    /// MEM_FREE
    Free,
    /// Unrecognized state bits
    Other(u32),
}

impl MemoryState {
    fn from_raw(raw: u32) -> MemoryState {
        match raw {
            0x1000 => MemoryState::Commit,
            0x2000 => MemoryState::Reserve,
            0x1_0000 => MemoryState::Free,
            other => MemoryState::Other(other),
        }
    }
}

/// MEM_* region backing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    /// MEM_PRIVATE
    Private,
    /// MEM_MAPPED
    Mapped,
    /// MEM_IMAGE
    Image,
    /// Unrecognized type bits (zero for free regions)
    Other(u32),
}

impl MemoryType {
    fn from_raw(raw: u32) -> MemoryType {
        match raw {
            0x2_0000 => MemoryType::Private,
            0x4_0000 => MemoryType::Mapped,
            0x100_0000 => MemoryType::Image,
            other => MemoryType::Other(other),
        }
    }
}

/// MINIDUMP_MEMORY_INFO - one virtual memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    /// Region base address
    pub base_address: u64,
    /// Base of the allocation the region belongs to
    pub allocation_base: u64,
    /// Protection at allocation time
    pub allocation_protect: MemoryProtection,
    /// Region size in bytes
    pub region_size: u64,
    /// Commit state
    pub state: MemoryState,
    /// Current protection
    pub protect: MemoryProtection,
    /// Backing type
    pub memory_type: MemoryType,
}

impl MemoryInfo {
    /// Whether `address` falls inside this region. The end address is exclusive.
    #[must_use]
    pub fn contains(&self, address: u64) -> bool {
        address >= self.base_address
            && address < self.base_address.saturating_add(self.region_size)
    }
}

/// MINIDUMP_MEMORY_INFO_LIST - the region map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryInfoList {
    /// Regions in ascending address order as the producer emitted them
    pub regions: Vec<MemoryInfo>,
}

impl MemoryInfoList {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<MemoryInfoList> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let size_of_header = parser.read_le::<u32>()?;
        let size_of_entry = parser.read_le::<u32>()?;
        let number_of_entries = parser.read_le::<u64>()?;

        if size_of_entry < ENTRY_SIZE {
            return Err(malformed_error!(
                "Memory info entry size {} below the minimum layout",
                size_of_entry
            ));
        }

        let first_entry = (location_rva as usize)
            .checked_add(size_of_header as usize)
            .ok_or(crate::Error::OutOfBounds)?;

        let count = usize::try_from(number_of_entries).map_err(|_| crate::Error::OutOfBounds)?;
        let mut regions = Vec::with_capacity(count.min(4096));
        for index in 0..count {
            let offset = first_entry
                .checked_add(index * size_of_entry as usize)
                .ok_or(crate::Error::OutOfBounds)?;
            parser.seek(offset)?;

            let base_address = parser.read_le::<u64>()?;
            let allocation_base = parser.read_le::<u64>()?;
            let allocation_protect =
                MemoryProtection::from_bits_retain(parser.read_le::<u32>()?);
            let _alignment1 = parser.read_le::<u32>()?;
            let region_size = parser.read_le::<u64>()?;
            let state = MemoryState::from_raw(parser.read_le::<u32>()?);
            let protect = MemoryProtection::from_bits_retain(parser.read_le::<u32>()?);
            let memory_type = MemoryType::from_raw(parser.read_le::<u32>()?);
            let _alignment2 = parser.read_le::<u32>()?;

            regions.push(MemoryInfo {
                base_address,
                allocation_base,
                allocation_protect,
                region_size,
                state,
                protect,
                memory_type,
            });
        }

        Ok(MemoryInfoList { regions })
    }

    /// Find the region containing `address`.
    #[must_use]
    pub fn region_at(&self, address: u64) -> Option<&MemoryInfo> {
        self.regions.iter().find(|region| region.contains(address))
    }
}
