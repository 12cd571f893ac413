//! Shared factories for building synthetic minidump images in tests.

use crate::format::directory::KnownStreamType;

/// Encode text as raw UTF-16LE bytes, without a length prefix.
pub fn utf16(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// Encode a MINIDUMP_STRING: u32 byte length followed by UTF-16LE text.
pub fn minidump_string(text: &str) -> Vec<u8> {
    let payload = utf16(text);
    let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
    bytes.extend_from_slice(&payload);
    bytes
}

/// A 48-byte SystemInfo payload describing a Windows 10 x64 workstation.
pub fn system_info_amd64() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&9u16.to_le_bytes()); // Amd64
    payload.extend_from_slice(&6u16.to_le_bytes()); // level
    payload.extend_from_slice(&0u16.to_le_bytes()); // revision
    payload.push(4); // processors
    payload.push(1); // workstation
    payload.extend_from_slice(&10u32.to_le_bytes()); // major
    payload.extend_from_slice(&0u32.to_le_bytes()); // minor
    payload.extend_from_slice(&19045u32.to_le_bytes()); // build
    payload.extend_from_slice(&2u32.to_le_bytes()); // VER_PLATFORM_WIN32_NT
    payload.extend_from_slice(&0u32.to_le_bytes()); // no CSD string
    payload.extend_from_slice(&0u16.to_le_bytes()); // suite mask
    payload.extend_from_slice(&0u16.to_le_bytes()); // reserved
    payload.extend_from_slice(&[0u8; 16]); // processor features
    payload
}

/// A ThreadList payload from (thread_id, teb) pairs. Stack and context
/// descriptors are zeroed.
pub fn thread_list(threads: &[(u32, u64)]) -> Vec<u8> {
    let mut payload = (threads.len() as u32).to_le_bytes().to_vec();
    for (thread_id, teb) in threads {
        payload.extend_from_slice(&thread_id.to_le_bytes());
        payload.extend_from_slice(&[0u8; 12]); // suspend count, priorities
        payload.extend_from_slice(&teb.to_le_bytes());
        payload.extend_from_slice(&[0u8; 24]); // stack + context descriptors
    }
    payload
}

/// Assembles a complete minidump image: header, stream directory, stream
/// payloads, and packed 64-bit memory ranges.
#[derive(Default)]
pub struct DumpBuilder {
    streams: Vec<(u32, Vec<u8>)>,
    segments: Vec<(u64, Vec<u8>)>,
}

impl DumpBuilder {
    pub fn new() -> DumpBuilder {
        DumpBuilder::default()
    }

    /// Add a stream with a known type.
    pub fn stream(mut self, stream_type: KnownStreamType, payload: Vec<u8>) -> DumpBuilder {
        self.streams.push((stream_type as u32, payload));
        self
    }

    /// Add a stream with a raw type value.
    pub fn raw_stream(mut self, stream_type: u32, payload: Vec<u8>) -> DumpBuilder {
        self.streams.push((stream_type, payload));
        self
    }

    /// Add a captured memory segment; emitted through a Memory64ListStream.
    pub fn memory(mut self, start: u64, bytes: Vec<u8>) -> DumpBuilder {
        self.segments.push((start, bytes));
        self
    }

    /// Lay the image out and return its bytes.
    pub fn build(self) -> Vec<u8> {
        let has_memory = !self.segments.is_empty();
        let stream_count = self.streams.len() + usize::from(has_memory);

        let directory_rva = 36u32;
        let mut payload_rva = directory_rva + 12 * stream_count as u32;

        // First pass places every ordinary stream payload.
        let mut entries = Vec::new();
        let mut payloads = Vec::new();
        for (stream_type, payload) in &self.streams {
            entries.push((*stream_type, payload.len() as u32, payload_rva));
            payload_rva += payload.len() as u32;
            payloads.push(payload.clone());
        }

        // The memory64 stream descriptor table sits with the other payloads;
        // the packed range bytes follow everything else.
        if has_memory {
            let table_size = 16 + 16 * self.segments.len() as u32;
            let base_rva = u64::from(payload_rva + table_size);

            let mut table = (self.segments.len() as u64).to_le_bytes().to_vec();
            table.extend_from_slice(&base_rva.to_le_bytes());
            for (start, bytes) in &self.segments {
                table.extend_from_slice(&start.to_le_bytes());
                table.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
            }

            entries.push((
                KnownStreamType::Memory64ListStream as u32,
                table.len() as u32,
                payload_rva,
            ));
            payloads.push(table);
        }

        let mut image = Vec::new();
        image.extend_from_slice(&0x504d_444du32.to_le_bytes()); // "MDMP"
        image.extend_from_slice(&1u16.to_le_bytes()); // version
        image.extend_from_slice(&1u16.to_le_bytes()); // impl version
        image.extend_from_slice(&(stream_count as u32).to_le_bytes());
        image.extend_from_slice(&directory_rva.to_le_bytes());
        image.extend_from_slice(&[0u8; 8]); // checksum + reserved
        image.extend_from_slice(&0x6543_2100u32.to_le_bytes()); // timestamp
        let flags: u64 = if has_memory { 0x2 } else { 0 }; // WITH_FULL_MEMORY
        image.extend_from_slice(&flags.to_le_bytes());

        for (stream_type, size, rva) in &entries {
            image.extend_from_slice(&stream_type.to_le_bytes());
            image.extend_from_slice(&size.to_le_bytes());
            image.extend_from_slice(&rva.to_le_bytes());
        }
        for payload in payloads {
            image.extend_from_slice(&payload);
        }
        for (_, bytes) in self.segments {
            image.extend_from_slice(&bytes);
        }

        image
    }
}
