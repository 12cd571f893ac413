//! Decoders for the individual minidump streams.
//!
//! Each stream module owns one `MINIDUMP_*` payload layout and exposes a typed
//! decoded form. Decoders take the whole file plus the directory entry's RVA so
//! that embedded RVAs (string references, packed memory payloads) can be chased
//! without re-plumbing the backing buffer.

pub mod comment;
pub mod exception;
pub mod handle_data;
pub mod memory_info;
pub mod memory_list;
pub mod misc_info;
pub mod module_list;
pub mod system_info;
pub mod thread_info;
pub mod thread_list;
pub mod unloaded_modules;

pub use comment::{parse_comment_a, parse_comment_w};
pub use exception::{ExceptionInfo, ExceptionRecord};
pub use handle_data::{HandleDataStream, HandleDescriptor, HandleObjectInfo};
pub use memory_info::{
    MemoryInfo, MemoryInfoList, MemoryProtection, MemoryState, MemoryType,
};
pub use memory_list::{Memory64List, MemoryDescriptor, MemoryDescriptor64, MemoryList};
pub use misc_info::{MiscInfo, MiscInfoFlags, ProcessorPowerInfo};
pub use module_list::{FixedFileInfo, Module, ModuleList};
pub use system_info::{CpuInfo, ProcessorArchitecture, SystemInfo};
pub use thread_info::{ThreadInfo, ThreadInfoList};
pub use thread_list::{Thread, ThreadExList, ThreadList};
pub use unloaded_modules::{UnloadedModule, UnloadedModuleList};
