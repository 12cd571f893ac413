//! Stream directory entries and location descriptors.
//!
//! The directory is an array of fixed 12-byte entries immediately addressed by the
//! header. Each entry names a stream type and points at the stream's payload through
//! a [`LocationDescriptor`]. Producer-defined streams (numeric type above
//! `LastReservedStream`) classify as [`StreamType::User`]; their encodings are
//! producer-specific, so they are dropped from the decoded directory.

use strum::FromRepr;

use crate::{file::parser::Parser, Result};

/// Numeric value of the last stream type reserved for the format itself. Anything
/// above it is producer-defined.
pub const LAST_RESERVED_STREAM: u32 = 0xffff;

/// Size in bytes of a serialized directory entry.
pub const DIRECTORY_ENTRY_SIZE: usize = 12;

/// MINIDUMP_STREAM_TYPE - identifies what a directory entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr)]
#[repr(u32)]
pub enum KnownStreamType {
    /// Reserved, contains no data
    UnusedStream = 0,
    /// Reserved
    ReservedStream0 = 1,
    /// Reserved
    ReservedStream1 = 2,
    /// Running threads with stacks and contexts
    ThreadListStream = 3,
    /// Loaded modules
    ModuleListStream = 4,
    /// Captured memory ranges (32-bit descriptors)
    MemoryListStream = 5,
    /// Exception that caused the dump
    ExceptionStream = 6,
    /// Processor and operating system information
    SystemInfoStream = 7,
    /// Extended thread information
    ThreadExListStream = 8,
    /// Captured memory ranges (64-bit descriptors)
    Memory64ListStream = 9,
    /// ANSI comment
    CommentStreamA = 10,
    /// UTF-16 comment
    CommentStreamW = 11,
    /// Open handles
    HandleDataStream = 12,
    /// Function table entries
    FunctionTableStream = 13,
    /// Modules unloaded before capture
    UnloadedModuleListStream = 14,
    /// Miscellaneous process information
    MiscInfoStream = 15,
    /// Virtual memory region map
    MemoryInfoStream = 16,
    /// Per-thread state information
    ThreadInfoStream = 17,
    /// Handle operation trace
    HandleOperationListStream = 18,
    /// Security token data
    TokenStream = 19,
    /// JavaScript engine data
    JavaScriptDataStream = 20,
    /// System memory counters
    SystemMemoryInfoStream = 21,
    /// Process VM counters
    ProcessVmCountersStream = 22,
    /// Instruction-pointer memory capture
    IptTraceStream = 23,
    /// Thread names
    ThreadNamesStream = 24,
    /// Windows CE: reserved
    CeStreamNull = 25,
    /// Windows CE: system information
    CeStreamSystemInfo = 26,
    /// Windows CE: exception
    CeStreamException = 27,
    /// Windows CE: module list
    CeStreamModuleList = 28,
    /// Windows CE: process list
    CeStreamProcessList = 29,
    /// Windows CE: thread list
    CeStreamThreadList = 30,
    /// Windows CE: thread contexts
    CeStreamThreadContextList = 31,
    /// Windows CE: thread call stacks
    CeStreamThreadCallStackList = 32,
    /// Windows CE: virtual memory list
    CeStreamMemoryVirtualList = 33,
    /// Windows CE: physical memory list
    CeStreamMemoryPhysicalList = 34,
    /// Windows CE: bucket parameters
    CeStreamBucketParameters = 35,
    /// Windows CE: process module map
    CeStreamProcessModuleMap = 36,
    /// Windows CE: diagnosis list
    CeStreamDiagnosisList = 37,
}

/// A directory entry's stream type: either a decoded [`KnownStreamType`] or a raw
/// producer-defined value above [`LAST_RESERVED_STREAM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// A stream type defined by the format
    Known(KnownStreamType),
    /// A producer-defined stream type
    User(u32),
    /// A reserved value with no assigned meaning in this format revision
    Unknown(u32),
}

impl StreamType {
    /// Classify a raw stream type value.
    #[must_use]
    pub fn from_raw(raw: u32) -> StreamType {
        if raw > LAST_RESERVED_STREAM {
            return StreamType::User(raw);
        }

        match KnownStreamType::from_repr(raw) {
            Some(known) => StreamType::Known(known),
            None => StreamType::Unknown(raw),
        }
    }

    /// The raw numeric value of this stream type.
    #[must_use]
    pub fn raw(&self) -> u32 {
        match self {
            StreamType::Known(known) => *known as u32,
            StreamType::User(raw) | StreamType::Unknown(raw) => *raw,
        }
    }
}

/// MINIDUMP_LOCATION_DESCRIPTOR - a (size, file offset) pair locating stream payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationDescriptor {
    /// Payload size in bytes
    pub data_size: u32,
    /// Payload offset from the start of the file
    pub rva: u32,
}

impl LocationDescriptor {
    /// Decode an 8-byte location descriptor.
    pub fn parse(parser: &mut Parser) -> Result<LocationDescriptor> {
        Ok(LocationDescriptor {
            data_size: parser.read_le::<u32>()?,
            rva: parser.read_le::<u32>()?,
        })
    }
}

/// MINIDUMP_LOCATION_DESCRIPTOR64 - a location descriptor with a 64-bit offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationDescriptor64 {
    /// Payload size in bytes
    pub data_size: u64,
    /// Payload offset from the start of the file
    pub rva: u64,
}

impl LocationDescriptor64 {
    /// Decode a 16-byte location descriptor.
    pub fn parse(parser: &mut Parser) -> Result<LocationDescriptor64> {
        Ok(LocationDescriptor64 {
            data_size: parser.read_le::<u64>()?,
            rva: parser.read_le::<u64>()?,
        })
    }
}

/// MINIDUMP_DIRECTORY - one entry of the stream directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// What the entry points at
    pub stream_type: StreamType,
    /// Where the stream payload lives
    pub location: LocationDescriptor,
}

impl DirectoryEntry {
    /// Decode a 12-byte directory entry.
    pub fn parse(parser: &mut Parser) -> Result<DirectoryEntry> {
        let raw_type = parser.read_le::<u32>()?;

        Ok(DirectoryEntry {
            stream_type: StreamType::from_raw(raw_type),
            location: LocationDescriptor::parse(parser)?,
        })
    }
}
