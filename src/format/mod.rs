//! Minidump container parsing.
//!
//! [`Minidump`] is the entry point of the crate: it validates the header, walks
//! the stream directory, and decodes every stream it understands into typed
//! form. Decoded streams are owned, so the accessors hand out plain references
//! with no lifetime plumbing back to the file.
//!
//! # Key Components
//!
//! - [`header::Header`] - the fixed file header and its [`header::DumpFlags`]
//! - [`directory::DirectoryEntry`] - the stream directory
//! - [`streams`] - one decoder per understood stream
//! - [`Minidump`] - ties the above together over a [`crate::file::Backend`]
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use dumpscope::Minidump;
//!
//! let dump = Minidump::from_file("crash.dmp".as_ref())?;
//! if let Some(modules) = dump.modules() {
//!     for module in &modules.modules {
//!         println!("{:#018x} {}", module.base_of_image, module.name);
//!     }
//! }
//! # Ok::<(), dumpscope::Error>(())
//! ```

pub mod directory;
pub mod header;
pub mod streams;
pub mod strings;

use std::path::Path;

use log::debug;

use crate::{
    file::{Backend, Memory, Parser, Physical},
    memory::{AddressSpace, MemoryReader},
    Result,
};
use self::directory::{DirectoryEntry, KnownStreamType, StreamType};
use self::header::Header;
use self::streams::{
    parse_comment_a, parse_comment_w, ExceptionInfo, HandleDataStream, Memory64List,
    MemoryInfoList, MemoryList, MiscInfo, ModuleList, SystemInfo, ThreadExList,
    ThreadInfoList, ThreadList, UnloadedModuleList,
};

/// Typed slots for every stream the parser understands.
#[derive(Default)]
struct DecodedStreams {
    system_info: Option<SystemInfo>,
    thread_list: Option<ThreadList>,
    thread_ex_list: Option<ThreadExList>,
    module_list: Option<ModuleList>,
    memory_list: Option<MemoryList>,
    memory64_list: Option<Memory64List>,
    exception: Option<ExceptionInfo>,
    comment_a: Option<String>,
    comment_w: Option<String>,
    handle_data: Option<HandleDataStream>,
    unloaded_modules: Option<UnloadedModuleList>,
    misc_info: Option<MiscInfo>,
    memory_info_list: Option<MemoryInfoList>,
    thread_info_list: Option<ThreadInfoList>,
}

/// A fully parsed minidump file.
pub struct Minidump {
    backend: Box<dyn Backend>,
    header: Header,
    directory: Vec<DirectoryEntry>,
    system_info: Option<SystemInfo>,
    thread_list: Option<ThreadList>,
    thread_ex_list: Option<ThreadExList>,
    module_list: Option<ModuleList>,
    memory_list: Option<MemoryList>,
    memory64_list: Option<Memory64List>,
    exception: Option<ExceptionInfo>,
    comment_a: Option<String>,
    comment_w: Option<String>,
    handle_data: Option<HandleDataStream>,
    unloaded_modules: Option<UnloadedModuleList>,
    misc_info: Option<MiscInfo>,
    memory_info_list: Option<MemoryInfoList>,
    thread_info_list: Option<ThreadInfoList>,
    address_space: Option<AddressSpace>,
}

impl Minidump {
    /// Parse a minidump from a file on disk, memory-mapping it.
    pub fn from_file(path: &Path) -> Result<Minidump> {
        Minidump::from_backend(Box::new(Physical::new(path)?))
    }

    /// Parse a minidump already held in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Minidump> {
        Minidump::from_backend(Box::new(Memory::new(data)))
    }

    /// Parse a minidump from an arbitrary [`Backend`].
    pub fn from_backend(backend: Box<dyn Backend>) -> Result<Minidump> {
        let data = backend.data();

        let mut parser = Parser::new(data);
        let header = Header::parse(&mut parser)?;

        parser.seek(header.stream_directory_rva as usize)?;
        let mut directory = Vec::with_capacity(header.number_of_streams.min(4096) as usize);
        for _ in 0..header.number_of_streams {
            let entry = DirectoryEntry::parse(&mut parser)?;
            if let StreamType::User(raw) = entry.stream_type {
                // User-defined streams have producer-specific encodings and
                // are dropped from the decoded directory.
                debug!(
                    "dropping user-defined stream {raw:#010x} at {:#010x}",
                    entry.location.rva
                );
                continue;
            }
            directory.push(entry);
        }

        let mut streams = DecodedStreams::default();
        for entry in &directory {
            decode_stream(&mut streams, data, entry)?;
        }

        let address_space = build_address_space(&streams)?;

        Ok(Minidump {
            backend,
            header,
            directory,
            system_info: streams.system_info,
            thread_list: streams.thread_list,
            thread_ex_list: streams.thread_ex_list,
            module_list: streams.module_list,
            memory_list: streams.memory_list,
            memory64_list: streams.memory64_list,
            exception: streams.exception,
            comment_a: streams.comment_a,
            comment_w: streams.comment_w,
            handle_data: streams.handle_data,
            unloaded_modules: streams.unloaded_modules,
            misc_info: streams.misc_info,
            memory_info_list: streams.memory_info_list,
            thread_info_list: streams.thread_info_list,
            address_space,
        })
    }

    /// The file header.
    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The stream directory in file order.
    #[must_use]
    pub fn directory(&self) -> &[DirectoryEntry] {
        &self.directory
    }

    /// Whether the directory names a stream of this type.
    #[must_use]
    pub fn has_stream(&self, stream_type: StreamType) -> bool {
        self.directory
            .iter()
            .any(|entry| entry.stream_type == stream_type)
    }

    /// The raw payload bytes of a stream, undecoded. When the directory lists
    /// the type more than once, the last entry is returned.
    #[must_use]
    pub fn raw_stream(&self, stream_type: StreamType) -> Option<&[u8]> {
        let entry = self
            .directory
            .iter()
            .rev()
            .find(|entry| entry.stream_type == stream_type)?;
        payload(self.backend.data(), entry).ok()
    }

    /// Processor and OS description.
    #[must_use]
    pub fn system_info(&self) -> Option<&SystemInfo> {
        self.system_info.as_ref()
    }

    /// Running threads.
    #[must_use]
    pub fn threads(&self) -> Option<&ThreadList> {
        self.thread_list.as_ref()
    }

    /// Extended thread list with backing stores.
    #[must_use]
    pub fn threads_ex(&self) -> Option<&ThreadExList> {
        self.thread_ex_list.as_ref()
    }

    /// Loaded modules.
    #[must_use]
    pub fn modules(&self) -> Option<&ModuleList> {
        self.module_list.as_ref()
    }

    /// Captured memory ranges with 32-bit descriptors.
    #[must_use]
    pub fn memory_list(&self) -> Option<&MemoryList> {
        self.memory_list.as_ref()
    }

    /// Captured memory ranges with 64-bit descriptors.
    #[must_use]
    pub fn memory64_list(&self) -> Option<&Memory64List> {
        self.memory64_list.as_ref()
    }

    /// The exception that triggered the dump.
    #[must_use]
    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.exception.as_ref()
    }

    /// ANSI producer comment.
    #[must_use]
    pub fn comment_a(&self) -> Option<&str> {
        self.comment_a.as_deref()
    }

    /// UTF-16 producer comment.
    #[must_use]
    pub fn comment_w(&self) -> Option<&str> {
        self.comment_w.as_deref()
    }

    /// Open handle table.
    #[must_use]
    pub fn handles(&self) -> Option<&HandleDataStream> {
        self.handle_data.as_ref()
    }

    /// Modules unloaded before capture.
    #[must_use]
    pub fn unloaded_modules(&self) -> Option<&UnloadedModuleList> {
        self.unloaded_modules.as_ref()
    }

    /// Miscellaneous process information.
    #[must_use]
    pub fn misc_info(&self) -> Option<&MiscInfo> {
        self.misc_info.as_ref()
    }

    /// Virtual memory region map.
    #[must_use]
    pub fn memory_info(&self) -> Option<&MemoryInfoList> {
        self.memory_info_list.as_ref()
    }

    /// Extended per-thread state.
    #[must_use]
    pub fn thread_info(&self) -> Option<&ThreadInfoList> {
        self.thread_info_list.as_ref()
    }

    /// The captured address space, when the dump has both a memory list and
    /// system info.
    #[must_use]
    pub fn address_space(&self) -> Option<&AddressSpace> {
        self.address_space.as_ref()
    }

    /// A cursor over the captured process memory.
    ///
    /// # Errors
    /// Fails when the dump lacks a memory list or a system info stream, since
    /// neither the mapping nor the pointer width is known without them.
    pub fn reader(&self) -> Result<MemoryReader<'_>> {
        let space = self.address_space.as_ref().ok_or_else(|| {
            crate::Error::Error(
                "dump carries no usable memory list or system info stream".into(),
            )
        })?;
        Ok(MemoryReader::new(self.backend.data(), space))
    }

    /// Search a named module's mapped image for `pattern`, returning the
    /// virtual addresses of every match. The name matches either the full
    /// recorded path or its base name.
    ///
    /// # Errors
    /// Fails with [`crate::Error::ModuleNotFound`] when no loaded module
    /// matches `name`, or with the construction errors of [`Self::reader`].
    pub fn find_in_module(&self, name: &str, pattern: &[u8]) -> Result<Vec<u64>> {
        let module = self
            .modules()
            .and_then(|list| list.module_by_name(name))
            .ok_or_else(|| crate::Error::ModuleNotFound(name.to_string()))?;
        let mut reader = self.reader()?;
        reader.find_in_module(module, pattern)
    }
}

/// Decode one directory entry into its typed slot. A repeated stream type
/// overwrites the earlier decode, so the last directory entry wins.
fn decode_stream(streams: &mut DecodedStreams, data: &[u8], entry: &DirectoryEntry) -> Result<()> {
    let rva = entry.location.rva;
    let size = entry.location.data_size as usize;

    let known = match entry.stream_type {
        StreamType::Known(known) => known,
        StreamType::User(raw) | StreamType::Unknown(raw) => {
            debug!("skipping unrecognized stream type {raw} at {rva:#010x}");
            return Ok(());
        }
    };

    debug!("decoding {known:?} ({size} bytes at {rva:#010x})");
    match known {
        KnownStreamType::SystemInfoStream => {
            streams.system_info = Some(SystemInfo::parse(data, rva)?);
        }
        KnownStreamType::ThreadListStream => {
            streams.thread_list = Some(ThreadList::parse(data, rva)?);
        }
        KnownStreamType::ThreadExListStream => {
            streams.thread_ex_list = Some(ThreadExList::parse(data, rva)?);
        }
        KnownStreamType::ModuleListStream => {
            streams.module_list = Some(ModuleList::parse(data, rva)?);
        }
        KnownStreamType::MemoryListStream => {
            streams.memory_list = Some(MemoryList::parse(data, rva)?);
        }
        KnownStreamType::Memory64ListStream => {
            streams.memory64_list = Some(Memory64List::parse(data, rva)?);
        }
        KnownStreamType::ExceptionStream => {
            streams.exception = Some(ExceptionInfo::parse(data, rva)?);
        }
        KnownStreamType::CommentStreamA => {
            streams.comment_a = Some(parse_comment_a(payload(data, entry)?));
        }
        KnownStreamType::CommentStreamW => {
            streams.comment_w = Some(parse_comment_w(payload(data, entry)?));
        }
        KnownStreamType::HandleDataStream => {
            streams.handle_data = Some(HandleDataStream::parse(data, rva)?);
        }
        KnownStreamType::UnloadedModuleListStream => {
            streams.unloaded_modules = Some(UnloadedModuleList::parse(data, rva)?);
        }
        KnownStreamType::MiscInfoStream => {
            streams.misc_info = Some(MiscInfo::parse(data, rva)?);
        }
        KnownStreamType::MemoryInfoStream => {
            streams.memory_info_list = Some(MemoryInfoList::parse(data, rva)?);
        }
        KnownStreamType::ThreadInfoStream => {
            streams.thread_info_list = Some(ThreadInfoList::parse(data, rva)?);
        }
        other => {
            debug!("no decoder for {other:?}, keeping it raw");
        }
    }

    Ok(())
}

fn payload<'d>(data: &'d [u8], entry: &DirectoryEntry) -> Result<&'d [u8]> {
    let start = entry.location.rva as usize;
    let end = start
        .checked_add(entry.location.data_size as usize)
        .ok_or(crate::Error::OutOfBounds)?;
    data.get(start..end).ok_or(crate::Error::OutOfBounds)
}

/// Flatten whichever memory list is present into an address space. The 64-bit
/// list wins when both exist since full-memory dumps write both a stub 32-bit
/// list and the real packed ranges.
fn build_address_space(streams: &DecodedStreams) -> Result<Option<AddressSpace>> {
    let Some(system_info) = &streams.system_info else {
        return Ok(None);
    };
    let pointer_size = system_info.pointer_size()?;

    if let Some(list) = &streams.memory64_list {
        return Ok(Some(AddressSpace::from_memory64_list(list, pointer_size)));
    }
    if let Some(list) = &streams.memory_list {
        return Ok(Some(AddressSpace::from_memory_list(list, pointer_size)));
    }
    Ok(None)
}

impl std::fmt::Debug for Minidump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Minidump")
            .field("header", &self.header)
            .field("streams", &self.directory.len())
            .field(
                "architecture",
                &self
                    .system_info
                    .as_ref()
                    .map(|info| info.processor_architecture),
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{system_info_amd64, thread_list, DumpBuilder};

    #[test]
    fn full_parse() {
        let image = DumpBuilder::new()
            .stream(KnownStreamType::SystemInfoStream, system_info_amd64())
            .stream(
                KnownStreamType::ThreadListStream,
                thread_list(&[(0x1000, 0x7ff0_0000)]),
            )
            .stream(
                KnownStreamType::CommentStreamA,
                b"taken by unit test\0".to_vec(),
            )
            .memory(0x40_0000, vec![0xCC; 0x100])
            .build();

        let dump = Minidump::from_bytes(image).unwrap();
        assert_eq!(dump.header().number_of_streams, 4);
        assert!(dump
            .header()
            .flags
            .contains(header::DumpFlags::WITH_FULL_MEMORY));

        let info = dump.system_info().unwrap();
        assert_eq!(info.build_number, 19045);

        let threads = dump.threads().unwrap();
        assert_eq!(threads.threads[0].teb, 0x7ff0_0000);

        assert_eq!(dump.comment_a(), Some("taken by unit test"));

        let space = dump.address_space().unwrap();
        assert_eq!(space.total_size(), 0x100);
        assert_eq!(space.pointer_size(), 8);

        let mut reader = dump.reader().unwrap();
        reader.move_to(0x40_0000).unwrap();
        assert_eq!(reader.read_le::<u8>().unwrap(), 0xCC);
    }

    #[test]
    fn bad_signature_rejected() {
        assert!(matches!(
            Minidump::from_bytes(vec![0u8; 64]),
            Err(crate::Error::BadSignature { .. })
        ));
    }

    #[test]
    fn user_streams_are_dropped_from_the_directory() {
        let image = DumpBuilder::new()
            .raw_stream(0x0001_0001, vec![1, 2, 3, 4])
            .stream(KnownStreamType::SystemInfoStream, system_info_amd64())
            .build();

        let dump = Minidump::from_bytes(image).unwrap();
        assert_eq!(dump.header().number_of_streams, 2);
        assert_eq!(dump.directory().len(), 1);

        let user = StreamType::User(0x0001_0001);
        assert!(!dump.has_stream(user));
        assert_eq!(dump.raw_stream(user), None);
        assert!(dump.system_info().is_some());
    }

    #[test]
    fn duplicate_stream_last_entry_wins() {
        let image = DumpBuilder::new()
            .stream(KnownStreamType::CommentStreamA, b"first\0".to_vec())
            .stream(KnownStreamType::CommentStreamA, b"second\0".to_vec())
            .build();

        let dump = Minidump::from_bytes(image).unwrap();
        assert_eq!(dump.comment_a(), Some("second"));
        assert_eq!(
            dump.raw_stream(StreamType::Known(KnownStreamType::CommentStreamA)),
            Some(&b"second\0"[..])
        );
    }

    #[test]
    fn reader_requires_memory_and_system_info() {
        let image = DumpBuilder::new()
            .stream(KnownStreamType::CommentStreamA, b"no memory here\0".to_vec())
            .build();

        let dump = Minidump::from_bytes(image).unwrap();
        assert!(dump.address_space().is_none());
        assert!(dump.reader().is_err());
    }
}
