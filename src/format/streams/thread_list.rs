//! `ThreadListStream` and `ThreadExListStream` - the threads running at capture time.
//!
//! Each record carries the thread environment block address, which is the entry
//! point for walking process structures in captured memory.

use crate::{
    file::parser::Parser,
    format::directory::LocationDescriptor,
    format::streams::memory_list::MemoryDescriptor,
    Result,
};

/// MINIDUMP_THREAD - one running thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thread {
    /// Operating system thread identifier
    pub thread_id: u32,
    /// Suspension count at capture time
    pub suspend_count: u32,
    /// Scheduling priority class
    pub priority_class: u32,
    /// Scheduling priority within the class
    pub priority: u32,
    /// Virtual address of the thread environment block
    pub teb: u64,
    /// The thread's stack capture
    pub stack: MemoryDescriptor,
    /// Where the register context lives in the file
    pub thread_context: LocationDescriptor,
}

impl Thread {
    /// Decode one 48-byte thread record.
    pub fn parse(parser: &mut Parser) -> Result<Thread> {
        Ok(Thread {
            thread_id: parser.read_le::<u32>()?,
            suspend_count: parser.read_le::<u32>()?,
            priority_class: parser.read_le::<u32>()?,
            priority: parser.read_le::<u32>()?,
            teb: parser.read_le::<u64>()?,
            stack: MemoryDescriptor::parse(parser)?,
            thread_context: LocationDescriptor::parse(parser)?,
        })
    }
}

/// MINIDUMP_THREAD_LIST - the standard thread list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThreadList {
    /// Threads in directory order
    pub threads: Vec<Thread>,
}

impl ThreadList {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<ThreadList> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let count = parser.read_le::<u32>()? as usize;
        let mut threads = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            threads.push(Thread::parse(&mut parser)?);
        }

        Ok(ThreadList { threads })
    }
}

/// MINIDUMP_THREAD_EX - a thread record with an Itanium-style backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadEx {
    /// The base thread record
    pub thread: Thread,
    /// Register backing store capture
    pub backing_store: MemoryDescriptor,
}

/// MINIDUMP_THREAD_EX_LIST - the extended thread list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThreadExList {
    /// Threads in directory order
    pub threads: Vec<ThreadEx>,
}

impl ThreadExList {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<ThreadExList> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let count = parser.read_le::<u32>()? as usize;
        let mut threads = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            threads.push(ThreadEx {
                thread: Thread::parse(&mut parser)?,
                backing_store: MemoryDescriptor::parse(&mut parser)?,
            });
        }

        Ok(ThreadExList { threads })
    }
}
