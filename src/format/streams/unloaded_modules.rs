//! `UnloadedModuleListStream` - modules unloaded before the dump was taken.

use crate::{
    file::parser::Parser,
    format::strings::read_string_at,
    Result,
};

const ENTRY_SIZE: u32 = 24;

/// MINIDUMP_UNLOADED_MODULE - one formerly loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnloadedModule {
    /// Address the image was mapped at
    pub base_of_image: u64,
    /// Size of the mapped image in bytes
    pub size_of_image: u32,
    /// PE header checksum
    pub checksum: u32,
    /// PE header timestamp
    pub time_date_stamp: u32,
    /// Module path recorded at unload time
    pub name: String,
}

/// MINIDUMP_UNLOADED_MODULE_LIST - the unload history.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnloadedModuleList {
    /// Modules, most recently unloaded first
    pub modules: Vec<UnloadedModule>,
}

impl UnloadedModuleList {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<UnloadedModuleList> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let size_of_header = parser.read_le::<u32>()?;
        let size_of_entry = parser.read_le::<u32>()?;
        let number_of_entries = parser.read_le::<u32>()?;

        if size_of_entry < ENTRY_SIZE {
            return Err(malformed_error!(
                "Unloaded module entry size {} below the minimum layout",
                size_of_entry
            ));
        }

        let first_entry = (location_rva as usize)
            .checked_add(size_of_header as usize)
            .ok_or(crate::Error::OutOfBounds)?;

        let mut modules = Vec::with_capacity((number_of_entries as usize).min(4096));
        for index in 0..number_of_entries as usize {
            let offset = first_entry
                .checked_add(index * size_of_entry as usize)
                .ok_or(crate::Error::OutOfBounds)?;
            parser.seek(offset)?;

            let base_of_image = parser.read_le::<u64>()?;
            let size_of_image = parser.read_le::<u32>()?;
            let checksum = parser.read_le::<u32>()?;
            let time_date_stamp = parser.read_le::<u32>()?;
            let name_rva = parser.read_le::<u32>()?;

            modules.push(UnloadedModule {
                base_of_image,
                size_of_image,
                checksum,
                time_date_stamp,
                name: read_string_at(data, name_rva)?,
            });
        }

        Ok(UnloadedModuleList { modules })
    }
}
