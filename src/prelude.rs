//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits from the
//! library, allowing users to quickly import everything needed for typical
//! dump analysis tasks with a single `use` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dumpscope::prelude::*;
//!
//! let dump = Minidump::from_file("crash.dmp".as_ref())?;
//! if let Some(info) = dump.system_info() {
//!     println!("{}", info.os_name().unwrap_or("unknown"));
//! }
//! # Ok::<(), dumpscope::Error>(())
//! ```

pub use crate::{
    format::{
        directory::{DirectoryEntry, KnownStreamType, LocationDescriptor, StreamType},
        header::{DumpFlags, Header},
        streams::{
            ExceptionInfo, ExceptionRecord, HandleDataStream, HandleDescriptor,
            Memory64List, MemoryInfo, MemoryInfoList, MemoryList, MiscInfo, Module,
            ModuleList, ProcessorArchitecture, SystemInfo, Thread, ThreadInfoList,
            ThreadList, UnloadedModuleList,
        },
        Minidump,
    },
    memory::{AddressSpace, MemoryReader, MemorySegment, Whence},
    process::Peb,
    Error, Result,
};
