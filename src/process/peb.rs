//! Process environment block recovery.
//!
//! Full-memory dumps capture the PEB and the RTL_USER_PROCESS_PARAMETERS block
//! it points at, which together hold the image path, command line, working
//! directory, and environment of the dumped process. The walk starts from a
//! thread's TEB address, follows the PEB pointer stored there, and reads each
//! field independently so that one torn pointer does not take the rest of the
//! results down with it.

use crate::{
    format::strings::decode_utf16le,
    format::Minidump,
    memory::MemoryReader,
    Result,
};

/// Structure offsets that differ between the 32-bit and 64-bit PEB layouts.
struct PebOffsets {
    /// PEB pointer within the TEB
    peb_in_teb: u64,
    /// BeingDebugged byte within the PEB
    being_debugged: u64,
    /// ImageBaseAddress within the PEB
    image_base_address: u64,
    /// ProcessParameters pointer within the PEB
    process_parameters: u64,
    /// CurrentDirectory within the parameters block
    current_directory: u64,
    /// DllPath within the parameters block
    dll_path: u64,
    /// ImagePathName within the parameters block
    image_path: u64,
    /// CommandLine within the parameters block
    command_line: u64,
    /// WindowTitle within the parameters block
    window_title: u64,
    /// StandardInput within the parameters block
    standard_input: u64,
    /// StandardOutput within the parameters block
    standard_output: u64,
    /// StandardError within the parameters block
    standard_error: u64,
    /// Environment pointer within the parameters block
    environment: u64,
    /// Buffer pointer within a UNICODE_STRING
    unicode_buffer: u64,
}

const OFFSETS_X86: PebOffsets = PebOffsets {
    peb_in_teb: 0x30,
    being_debugged: 0x02,
    image_base_address: 0x08,
    process_parameters: 0x10,
    current_directory: 0x24,
    dll_path: 0x30,
    image_path: 0x38,
    command_line: 0x40,
    window_title: 0x70,
    standard_input: 0x18,
    standard_output: 0x1c,
    standard_error: 0x20,
    environment: 0x48,
    unicode_buffer: 0x04,
};

const OFFSETS_X64: PebOffsets = PebOffsets {
    peb_in_teb: 0x60,
    being_debugged: 0x02,
    image_base_address: 0x10,
    process_parameters: 0x20,
    current_directory: 0x38,
    dll_path: 0x50,
    image_path: 0x60,
    command_line: 0x70,
    window_title: 0xb0,
    standard_input: 0x20,
    standard_output: 0x28,
    standard_error: 0x30,
    environment: 0x80,
    unicode_buffer: 0x08,
};

/// Recovered process environment block fields.
///
/// Every field except the PEB address itself is optional: a dump that did not
/// capture the page a field lives on yields `None` for that field and keeps the
/// rest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Peb {
    /// Virtual address of the PEB
    pub address: u64,
    /// BeingDebugged flag
    pub being_debugged: Option<bool>,
    /// Image base of the main executable
    pub image_base_address: Option<u64>,
    /// Address of the RTL_USER_PROCESS_PARAMETERS block
    pub process_parameters: Option<u64>,
    /// Full path of the executable image
    pub image_path: Option<String>,
    /// Command line the process was started with
    pub command_line: Option<String>,
    /// Window title, often a copy of the image path
    pub window_title: Option<String>,
    /// DLL search path
    pub dll_path: Option<String>,
    /// Working directory at capture time
    pub current_directory: Option<String>,
    /// Standard input handle value
    pub standard_input: Option<u64>,
    /// Standard output handle value
    pub standard_output: Option<u64>,
    /// Standard error handle value
    pub standard_error: Option<u64>,
    /// Environment variables as `(name, value)` pairs
    pub environment_variables: Option<Vec<(String, String)>>,
}

impl Peb {
    /// Walk the PEB of the process through the TEB of the thread at
    /// `thread_index` in the dump's thread list.
    ///
    /// # Errors
    /// Fails when the thread index is out of range, the dump has no usable
    /// memory capture, or the TEB page itself was not captured. Missing
    /// downstream pages degrade individual fields to `None` instead.
    pub fn walk(dump: &Minidump, thread_index: usize) -> Result<Peb> {
        let threads = dump
            .threads()
            .ok_or(crate::Error::ThreadNotFound(thread_index))?;
        let thread = threads
            .threads
            .get(thread_index)
            .ok_or(crate::Error::ThreadNotFound(thread_index))?;

        let mut reader = dump.reader()?;
        let offsets = match reader.space().pointer_size() {
            8 => &OFFSETS_X64,
            _ => &OFFSETS_X86,
        };

        let address = reader.deref_ptr(thread.teb + offsets.peb_in_teb)?;

        let mut peb = Peb {
            address,
            ..Peb::default()
        };

        peb.being_debugged = read_byte(&mut reader, address + offsets.being_debugged)
            .map(|flag| flag != 0);
        peb.image_base_address =
            try_deref(&mut reader, address + offsets.image_base_address);
        peb.process_parameters =
            try_deref(&mut reader, address + offsets.process_parameters);

        if let Some(parameters) = peb.process_parameters {
            peb.image_path =
                read_unicode_string(&mut reader, parameters + offsets.image_path, offsets);
            peb.command_line =
                read_unicode_string(&mut reader, parameters + offsets.command_line, offsets);
            peb.window_title =
                read_unicode_string(&mut reader, parameters + offsets.window_title, offsets);
            peb.dll_path =
                read_unicode_string(&mut reader, parameters + offsets.dll_path, offsets);
            peb.current_directory = read_unicode_string(
                &mut reader,
                parameters + offsets.current_directory,
                offsets,
            );
            peb.standard_input =
                try_deref(&mut reader, parameters + offsets.standard_input);
            peb.standard_output =
                try_deref(&mut reader, parameters + offsets.standard_output);
            peb.standard_error =
                try_deref(&mut reader, parameters + offsets.standard_error);

            if let Some(environment) =
                try_deref(&mut reader, parameters + offsets.environment)
            {
                peb.environment_variables = read_environment(&mut reader, environment);
            }
        }

        Ok(peb)
    }
}

fn read_byte(reader: &mut MemoryReader, address: u64) -> Option<u8> {
    reader.move_to(address).ok()?;
    reader.read_le::<u8>().ok()
}

fn try_deref(reader: &mut MemoryReader, address: u64) -> Option<u64> {
    reader.deref_ptr(address).ok()
}

/// Read a UNICODE_STRING structure and the buffer it points at. The buffer
/// pointer sits after the two length fields, padded to pointer alignment on
/// 64-bit layouts.
fn read_unicode_string(
    reader: &mut MemoryReader,
    address: u64,
    offsets: &PebOffsets,
) -> Option<String> {
    reader.move_to(address).ok()?;
    let length = reader.read_le::<u16>().ok()?;
    let _maximum_length = reader.read_le::<u16>().ok()?;

    let buffer = reader
        .deref_ptr(address + offsets.unicode_buffer)
        .ok()?;
    if buffer == 0 {
        return None;
    }

    reader.move_to(buffer).ok()?;
    let raw = reader.read(u64::from(length)).ok()?;
    Some(decode_utf16le(raw))
}

/// Decode the environment block: UTF-16 `NAME=value` records packed back to
/// back, terminated by an empty record. Each record is split on its first `=`.
fn read_environment(
    reader: &mut MemoryReader,
    address: u64,
) -> Option<Vec<(String, String)>> {
    reader.move_to(address).ok()?;
    let block = reader.read_rest().ok()??;

    let mut variables = Vec::new();
    let mut current = Vec::new();
    for pair in block.chunks_exact(2) {
        let unit = u16::from_le_bytes([pair[0], pair[1]]);
        if unit == 0 {
            if current.is_empty() {
                break;
            }
            let record = String::from_utf16_lossy(&current);
            match record.split_once('=') {
                Some((name, value)) => {
                    variables.push((name.to_string(), value.to_string()));
                }
                None => variables.push((record, String::new())),
            }
            current.clear();
        } else {
            current.push(unit);
        }
    }

    Some(variables)
}
