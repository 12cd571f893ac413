//! End-to-end tests over a synthetic full-memory dump built byte by byte.

use dumpscope::prelude::*;

const TEB: u64 = 0x7ff8_0000_1000;
const PEB: u64 = 0x7ff8_0000_2000;
const PARAMS: u64 = 0x7ff8_0000_3000;
const STRINGS: u64 = 0x7ff8_0000_4000;
const IMAGE_BASE: u64 = 0x7ff6_1000_0000;

const IMAGE_PATH: &str = "C:\\x.exe";
const COMMAND_LINE: &str = "C:\\x.exe --flag";

fn utf16(text: &str) -> Vec<u8> {
    text.encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect()
}

fn minidump_string(text: &str) -> Vec<u8> {
    let payload = utf16(text);
    let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
    bytes.extend_from_slice(&payload);
    bytes
}

fn write_u64(block: &mut [u8], offset: usize, value: u64) {
    block[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

fn unicode_string(block: &mut [u8], offset: usize, buffer: u64, text: &str) {
    let length = (text.encode_utf16().count() * 2) as u16;
    block[offset..offset + 2].copy_from_slice(&length.to_le_bytes());
    block[offset + 2..offset + 4].copy_from_slice(&length.to_le_bytes());
    write_u64(block, offset + 8, buffer);
}

struct Fixture {
    streams: Vec<(u32, Vec<u8>)>,
    segments: Vec<(u64, Vec<u8>)>,
}

impl Fixture {
    fn build(self) -> Vec<u8> {
        let stream_count = self.streams.len() + 1; // plus the memory64 list
        let mut payload_rva = 36 + 12 * stream_count as u32;

        let mut entries = Vec::new();
        let mut payloads = Vec::new();
        for (stream_type, payload) in &self.streams {
            entries.push((*stream_type, payload.len() as u32, payload_rva));
            payload_rva += payload.len() as u32;
            payloads.push(payload.clone());
        }

        let table_size = 16 + 16 * self.segments.len() as u32;
        let base_rva = u64::from(payload_rva + table_size);
        let mut table = (self.segments.len() as u64).to_le_bytes().to_vec();
        table.extend_from_slice(&base_rva.to_le_bytes());
        for (start, bytes) in &self.segments {
            table.extend_from_slice(&start.to_le_bytes());
            table.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
        }
        entries.push((9u32, table.len() as u32, payload_rva)); // Memory64ListStream
        payloads.push(table);

        let mut image = Vec::new();
        image.extend_from_slice(&0x504d_444du32.to_le_bytes());
        image.extend_from_slice(&1u16.to_le_bytes());
        image.extend_from_slice(&1u16.to_le_bytes());
        image.extend_from_slice(&(stream_count as u32).to_le_bytes());
        image.extend_from_slice(&36u32.to_le_bytes());
        image.extend_from_slice(&[0u8; 8]);
        image.extend_from_slice(&0x6543_2100u32.to_le_bytes());
        image.extend_from_slice(&0x2u64.to_le_bytes()); // WITH_FULL_MEMORY

        for (stream_type, size, rva) in entries {
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

fn system_info_stream() -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&9u16.to_le_bytes()); // Amd64
    payload.extend_from_slice(&6u16.to_le_bytes());
    payload.extend_from_slice(&0u16.to_le_bytes());
    payload.push(8);
    payload.push(1); // workstation
    payload.extend_from_slice(&10u32.to_le_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&19045u32.to_le_bytes());
    payload.extend_from_slice(&2u32.to_le_bytes());
    payload.extend_from_slice(&0u32.to_le_bytes());
    payload.extend_from_slice(&[0u8; 4]); // suite mask + reserved
    payload.extend_from_slice(&[0u8; 16]); // processor features
    payload
}

fn thread_list_stream() -> Vec<u8> {
    let mut payload = 1u32.to_le_bytes().to_vec();
    payload.extend_from_slice(&0x1234u32.to_le_bytes());
    payload.extend_from_slice(&[0u8; 12]);
    payload.extend_from_slice(&TEB.to_le_bytes());
    payload.extend_from_slice(&[0u8; 24]);
    payload
}

fn module_list_stream() -> Vec<u8> {
    // One module; the name string is appended right after the 108-byte record.
    let mut payload = 1u32.to_le_bytes().to_vec();
    payload.extend_from_slice(&IMAGE_BASE.to_le_bytes());
    payload.extend_from_slice(&0x0002_0000u32.to_le_bytes()); // image size
    payload.extend_from_slice(&[0u8; 8]); // checksum + timestamp
    payload.extend_from_slice(&0u32.to_le_bytes()); // name rva, patched below
    payload.extend_from_slice(&[0u8; 52]); // version info
    payload.extend_from_slice(&[0u8; 32]); // cv + misc + reserved
    payload.extend_from_slice(&minidump_string(IMAGE_PATH));
    payload
}

/// Assemble the dump, fixing up the module name RVA once the stream layout is
/// known: the string sits 112 bytes into the module list payload, which is the
/// second stream after the 36-byte header and four directory entries.
fn build_dump(params_pointer: u64) -> Minidump {
    let mut teb = vec![0u8; 0x100];
    write_u64(&mut teb, 0x60, PEB);

    let mut peb = vec![0u8; 0x100];
    write_u64(&mut peb, 0x10, IMAGE_BASE);
    write_u64(&mut peb, 0x20, params_pointer);

    let mut strings = vec![0u8; 0x200];
    strings[..IMAGE_PATH.len() * 2].copy_from_slice(&utf16(IMAGE_PATH));
    strings[0x100..0x100 + COMMAND_LINE.len() * 2].copy_from_slice(&utf16(COMMAND_LINE));

    let mut params = vec![0u8; 0x200];
    unicode_string(&mut params, 0x60, STRINGS, IMAGE_PATH);
    unicode_string(&mut params, 0x70, STRINGS + 0x100, COMMAND_LINE);

    let system_info = system_info_stream();
    let threads = thread_list_stream();
    let mut modules = module_list_stream();

    // Directory: system info, threads, modules, memory64.
    let header_and_directory = 36 + 12 * 4;
    let module_stream_rva = header_and_directory + system_info.len() + threads.len();
    let name_rva = (module_stream_rva + 4 + 108) as u32;
    // Name RVA sits after the 4-byte module count plus the record's base,
    // size, checksum, and timestamp fields.
    modules[24..28].copy_from_slice(&name_rva.to_le_bytes());

    let image = Fixture {
        streams: vec![(7, system_info), (3, threads), (4, modules)],
        segments: vec![(TEB, teb), (PEB, peb), (PARAMS, params), (STRINGS, strings)],
    }
    .build();

    Minidump::from_bytes(image).unwrap()
}

#[test]
fn streams_decode() {
    let dump = build_dump(PARAMS);

    let info = dump.system_info().unwrap();
    assert_eq!(info.processor_architecture, ProcessorArchitecture::Amd64);
    assert_eq!(info.os_name(), Some("Windows 10"));

    let threads = dump.threads().unwrap();
    assert_eq!(threads.threads.len(), 1);
    assert_eq!(threads.threads[0].teb, TEB);

    let modules = dump.modules().unwrap();
    assert_eq!(modules.modules[0].name, IMAGE_PATH);
    assert!(modules.module_at(IMAGE_BASE + 0x100).is_some());
    assert!(modules.module_by_name("x.exe").is_some());
}

#[test]
fn memory_reader_walks_captured_segments() {
    let dump = build_dump(PARAMS);
    let mut reader = dump.reader().unwrap();

    // The TEB segment holds the PEB pointer at +0x60.
    assert_eq!(reader.deref_ptr(TEB + 0x60).unwrap(), PEB);

    // Reads confine themselves to one segment even though the next segment is
    // adjacent in the file.
    reader.move_to(TEB + 0xf8).unwrap();
    assert!(reader.read(8).is_ok());
    assert!(reader.read(1).is_err());

    assert!(matches!(
        reader.move_to(0x1000),
        Err(Error::AddressNotMapped(0x1000))
    ));
}

#[test]
fn peb_chain_recovers_command_line() {
    let dump = build_dump(PARAMS);
    let peb = Peb::walk(&dump, 0).unwrap();

    assert_eq!(peb.address, PEB);
    assert_eq!(peb.image_base_address, Some(IMAGE_BASE));
    assert_eq!(peb.image_path.as_deref(), Some(IMAGE_PATH));
    assert_eq!(peb.command_line.as_deref(), Some(COMMAND_LINE));
}

#[test]
fn corrupted_parameters_pointer_yields_partial_peb() {
    let dump = build_dump(0xdead_beef_0000);
    let peb = Peb::walk(&dump, 0).unwrap();

    assert_eq!(peb.image_base_address, Some(IMAGE_BASE));
    assert!(peb.command_line.is_none());
    assert!(peb.image_path.is_none());
}

#[test]
fn pattern_search_across_the_space() {
    let dump = build_dump(PARAMS);
    let mut reader = dump.reader().unwrap();

    let needle = utf16("--flag");
    let hits = reader.find_all_global(&needle).unwrap();
    assert_eq!(hits, vec![STRINGS + 0x100 + 2 * ("C:\\x.exe ".len() as u64)]);
}
