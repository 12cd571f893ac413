//! `ThreadInfoStream` - extended per-thread state.

use crate::{file::parser::Parser, Result};

const ENTRY_SIZE: u32 = 64;

/// MINIDUMP_THREAD_INFO - timing and scheduling state for one thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadInfo {
    /// Operating system thread identifier
    pub thread_id: u32,
    /// MINIDUMP_THREAD_INFO_* capture flags
    pub dump_flags: u32,
    /// HRESULT of the thread capture
    pub dump_error: u32,
    /// Thread exit status, STILL_ACTIVE if running
    pub exit_status: u32,
    /// Creation time as FILETIME
    pub create_time: u64,
    /// Exit time as FILETIME, 0 if running
    pub exit_time: u64,
    /// Accumulated kernel-mode time as FILETIME units
    pub kernel_time: u64,
    /// Accumulated user-mode time as FILETIME units
    pub user_time: u64,
    /// Thread start routine address
    pub start_address: u64,
    /// Processor affinity mask
    pub affinity: u64,
}

/// MINIDUMP_THREAD_INFO_LIST - the extended thread state table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThreadInfoList {
    /// Entries in table order
    pub threads: Vec<ThreadInfo>,
}

impl ThreadInfoList {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<ThreadInfoList> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let size_of_header = parser.read_le::<u32>()?;
        let size_of_entry = parser.read_le::<u32>()?;
        let number_of_entries = parser.read_le::<u32>()?;

        if size_of_entry < ENTRY_SIZE {
            return Err(malformed_error!(
                "Thread info entry size {} below the minimum layout",
                size_of_entry
            ));
        }

        let first_entry = (location_rva as usize)
            .checked_add(size_of_header as usize)
            .ok_or(crate::Error::OutOfBounds)?;

        let mut threads = Vec::with_capacity((number_of_entries as usize).min(4096));
        for index in 0..number_of_entries as usize {
            let offset = first_entry
                .checked_add(index * size_of_entry as usize)
                .ok_or(crate::Error::OutOfBounds)?;
            parser.seek(offset)?;

            threads.push(ThreadInfo {
                thread_id: parser.read_le::<u32>()?,
                dump_flags: parser.read_le::<u32>()?,
                dump_error: parser.read_le::<u32>()?,
                exit_status: parser.read_le::<u32>()?,
                create_time: parser.read_le::<u64>()?,
                exit_time: parser.read_le::<u64>()?,
                kernel_time: parser.read_le::<u64>()?,
                user_time: parser.read_le::<u64>()?,
                start_address: parser.read_le::<u64>()?,
                affinity: parser.read_le::<u64>()?,
            });
        }

        Ok(ThreadInfoList { threads })
    }

    /// Find the entry for a given thread identifier.
    #[must_use]
    pub fn thread_by_id(&self, thread_id: u32) -> Option<&ThreadInfo> {
        self.threads.iter().find(|info| info.thread_id == thread_id)
    }
}
