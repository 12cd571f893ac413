//! `HandleDataStream` - open kernel handles at capture time.
//!
//! The stream header declares its own descriptor size, which selects between the
//! v1 (32-byte) and v2 (40-byte) record layouts. Oversized descriptors from newer
//! producers are tolerated by skipping the surplus bytes.

use crate::{
    file::parser::Parser,
    format::strings::read_string_at,
    Result,
};

const DESCRIPTOR_SIZE_V1: u32 = 32;
const DESCRIPTOR_SIZE_V2: u32 = 40;

/// Extra information attached to a v2 handle descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleObjectInfo {
    /// MINIDUMP_HANDLE_OBJECT_INFORMATION_TYPE value
    pub info_type: u32,
    /// Raw payload bytes
    pub data: Vec<u8>,
}

/// MINIDUMP_HANDLE_DESCRIPTOR - one open handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleDescriptor {
    /// The handle value
    pub handle: u64,
    /// Kernel object type ("File", "Mutant", ...), if named
    pub type_name: Option<String>,
    /// Object name, if named
    pub object_name: Option<String>,
    /// Handle attributes
    pub attributes: u32,
    /// ACCESS_MASK granted at open time
    pub granted_access: u32,
    /// Handle reference count
    pub handle_count: u32,
    /// Kernel object pointer count
    pub pointer_count: u32,
    /// v2 extra information chain, empty for v1 records
    pub object_infos: Vec<HandleObjectInfo>,
}

/// MINIDUMP_HANDLE_DATA_STREAM - the handle table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandleDataStream {
    /// Handles in table order
    pub handles: Vec<HandleDescriptor>,
}

impl HandleDataStream {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<HandleDataStream> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let size_of_header = parser.read_le::<u32>()?;
        let size_of_descriptor = parser.read_le::<u32>()?;
        let number_of_descriptors = parser.read_le::<u32>()?;
        let _reserved = parser.read_le::<u32>()?;

        if size_of_descriptor < DESCRIPTOR_SIZE_V1 {
            return Err(malformed_error!(
                "Handle descriptor size {} below the minimum layout",
                size_of_descriptor
            ));
        }

        // Tolerate headers larger than the four fields we know.
        let first_descriptor = (location_rva as usize)
            .checked_add(size_of_header as usize)
            .ok_or(crate::Error::OutOfBounds)?;

        let mut handles = Vec::with_capacity((number_of_descriptors as usize).min(4096));
        for index in 0..number_of_descriptors as usize {
            let offset = first_descriptor
                .checked_add(index * size_of_descriptor as usize)
                .ok_or(crate::Error::OutOfBounds)?;
            parser.seek(offset)?;

            let handle = parser.read_le::<u64>()?;
            let type_name_rva = parser.read_le::<u32>()?;
            let object_name_rva = parser.read_le::<u32>()?;
            let attributes = parser.read_le::<u32>()?;
            let granted_access = parser.read_le::<u32>()?;
            let handle_count = parser.read_le::<u32>()?;
            let pointer_count = parser.read_le::<u32>()?;

            let object_infos = if size_of_descriptor >= DESCRIPTOR_SIZE_V2 {
                let object_info_rva = parser.read_le::<u32>()?;
                walk_object_infos(data, object_info_rva)?
            } else {
                Vec::new()
            };

            handles.push(HandleDescriptor {
                handle,
                type_name: read_optional_string(data, type_name_rva)?,
                object_name: read_optional_string(data, object_name_rva)?,
                attributes,
                granted_access,
                handle_count,
                pointer_count,
                object_infos,
            });
        }

        Ok(HandleDataStream { handles })
    }
}

fn read_optional_string(data: &[u8], rva: u32) -> Result<Option<String>> {
    if rva == 0 {
        return Ok(None);
    }
    read_string_at(data, rva).map(Some)
}

/// Follow a MINIDUMP_HANDLE_OBJECT_INFORMATION chain. Chains are short in
/// practice; the visit cap guards against self-referencing RVAs.
fn walk_object_infos(data: &[u8], first_rva: u32) -> Result<Vec<HandleObjectInfo>> {
    const MAX_CHAIN: usize = 64;

    let mut infos = Vec::new();
    let mut rva = first_rva;
    let mut visited = Vec::new();

    while rva != 0 {
        if visited.contains(&rva) || visited.len() >= MAX_CHAIN {
            return Err(malformed_error!(
                "Handle object information chain cycles at {:#010x}",
                rva
            ));
        }
        visited.push(rva);

        let mut parser = Parser::new(data);
        parser.seek(rva as usize)?;

        let next_info_rva = parser.read_le::<u32>()?;
        let info_type = parser.read_le::<u32>()?;
        let size_of_info = parser.read_le::<u32>()? as usize;

        infos.push(HandleObjectInfo {
            info_type,
            data: parser.bytes(size_of_info)?.to_vec(),
        });

        rva = next_info_rva;
    }

    Ok(infos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use widestring::U16String;

    fn encode_string(text: &str) -> Vec<u8> {
        let units = U16String::from_str(text);
        let mut bytes = ((units.len() * 2) as u32).to_le_bytes().to_vec();
        for unit in units.as_slice() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    fn build_v1(entries: &[(u64, &str, &str)]) -> Vec<u8> {
        let mut strings = Vec::new();
        let strings_base = 16 + entries.len() * 32;

        let mut stream = Vec::new();
        stream.extend_from_slice(&16u32.to_le_bytes()); // header size
        stream.extend_from_slice(&32u32.to_le_bytes()); // descriptor size
        stream.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        stream.extend_from_slice(&[0u8; 4]);

        for (handle, type_name, object_name) in entries {
            let type_rva = (strings_base + strings.len()) as u32;
            strings.extend_from_slice(&encode_string(type_name));
            let object_rva = (strings_base + strings.len()) as u32;
            strings.extend_from_slice(&encode_string(object_name));

            stream.extend_from_slice(&handle.to_le_bytes());
            stream.extend_from_slice(&type_rva.to_le_bytes());
            stream.extend_from_slice(&object_rva.to_le_bytes());
            stream.extend_from_slice(&[0u8; 16]); // attributes .. pointer_count
        }

        stream.extend_from_slice(&strings);
        stream
    }

    #[test]
    fn v1_descriptors() {
        let stream = build_v1(&[(0x4, "File", "\\Device\\HarddiskVolume3\\log.txt")]);
        let parsed = HandleDataStream::parse(&stream, 0).unwrap();

        assert_eq!(parsed.handles.len(), 1);
        assert_eq!(parsed.handles[0].handle, 0x4);
        assert_eq!(parsed.handles[0].type_name.as_deref(), Some("File"));
        assert_eq!(
            parsed.handles[0].object_name.as_deref(),
            Some("\\Device\\HarddiskVolume3\\log.txt")
        );
        assert!(parsed.handles[0].object_infos.is_empty());
    }

    #[test]
    fn anonymous_handle() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&16u32.to_le_bytes());
        stream.extend_from_slice(&32u32.to_le_bytes());
        stream.extend_from_slice(&1u32.to_le_bytes());
        stream.extend_from_slice(&[0u8; 4]);
        stream.extend_from_slice(&0x8u64.to_le_bytes());
        stream.extend_from_slice(&[0u8; 24]); // no names

        let parsed = HandleDataStream::parse(&stream, 0).unwrap();
        assert!(parsed.handles[0].type_name.is_none());
        assert!(parsed.handles[0].object_name.is_none());
    }

    #[test]
    fn undersized_descriptor_rejected() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&16u32.to_le_bytes());
        stream.extend_from_slice(&8u32.to_le_bytes());
        stream.extend_from_slice(&0u32.to_le_bytes());
        stream.extend_from_slice(&[0u8; 4]);

        assert!(HandleDataStream::parse(&stream, 0).is_err());
    }

    #[test]
    fn object_info_cycle_detected() {
        // One v2 descriptor whose object info chain points at itself.
        let mut stream = Vec::new();
        stream.extend_from_slice(&16u32.to_le_bytes());
        stream.extend_from_slice(&40u32.to_le_bytes());
        stream.extend_from_slice(&1u32.to_le_bytes());
        stream.extend_from_slice(&[0u8; 4]);

        let info_rva = (16 + 40) as u32;
        stream.extend_from_slice(&0x10u64.to_le_bytes());
        stream.extend_from_slice(&[0u8; 24]); // names + attributes .. pointer_count
        stream.extend_from_slice(&info_rva.to_le_bytes());
        stream.extend_from_slice(&[0u8; 4]); // reserved

        stream.extend_from_slice(&info_rva.to_le_bytes()); // next -> self
        stream.extend_from_slice(&3u32.to_le_bytes());
        stream.extend_from_slice(&0u32.to_le_bytes());

        assert!(HandleDataStream::parse(&stream, 0).is_err());
    }
}
