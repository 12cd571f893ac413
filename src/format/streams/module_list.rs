//! `ModuleListStream` - the loaded modules and their version records.

use crate::{
    file::parser::Parser,
    format::directory::LocationDescriptor,
    format::strings::read_string_at,
    Result,
};

/// VS_FIXEDFILEINFO - the binary version record embedded in each module entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedFileInfo {
    /// Structure signature, 0xFEEF04BD when populated
    pub signature: u32,
    /// Structure version
    pub struct_version: u32,
    /// File version, high 32 bits
    pub file_version_ms: u32,
    /// File version, low 32 bits
    pub file_version_ls: u32,
    /// Product version, high 32 bits
    pub product_version_ms: u32,
    /// Product version, low 32 bits
    pub product_version_ls: u32,
    /// Mask of valid file_flags bits
    pub file_flags_mask: u32,
    /// VS_FF_* flags
    pub file_flags: u32,
    /// Target operating system
    pub file_os: u32,
    /// File type (application, DLL, driver, ...)
    pub file_type: u32,
    /// File subtype
    pub file_subtype: u32,
    /// Build date, high 32 bits
    pub file_date_ms: u32,
    /// Build date, low 32 bits
    pub file_date_ls: u32,
}

impl FixedFileInfo {
    /// Decode the 52-byte version record.
    pub fn parse(parser: &mut Parser) -> Result<FixedFileInfo> {
        Ok(FixedFileInfo {
            signature: parser.read_le::<u32>()?,
            struct_version: parser.read_le::<u32>()?,
            file_version_ms: parser.read_le::<u32>()?,
            file_version_ls: parser.read_le::<u32>()?,
            product_version_ms: parser.read_le::<u32>()?,
            product_version_ls: parser.read_le::<u32>()?,
            file_flags_mask: parser.read_le::<u32>()?,
            file_flags: parser.read_le::<u32>()?,
            file_os: parser.read_le::<u32>()?,
            file_type: parser.read_le::<u32>()?,
            file_subtype: parser.read_le::<u32>()?,
            file_date_ms: parser.read_le::<u32>()?,
            file_date_ls: parser.read_le::<u32>()?,
        })
    }

    /// The four-part file version (major, minor, build, revision).
    #[must_use]
    pub fn file_version(&self) -> (u16, u16, u16, u16) {
        (
            (self.file_version_ms >> 16) as u16,
            self.file_version_ms as u16,
            (self.file_version_ls >> 16) as u16,
            self.file_version_ls as u16,
        )
    }
}

/// MINIDUMP_MODULE - one loaded module with its resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Load address of the module image
    pub base_of_image: u64,
    /// Size of the mapped image in bytes
    pub size_of_image: u32,
    /// PE header checksum
    pub checksum: u32,
    /// PE header timestamp
    pub time_date_stamp: u32,
    /// Full path of the module on the dumped machine
    pub name: String,
    /// Embedded version record
    pub version_info: FixedFileInfo,
    /// CodeView debug record location
    pub cv_record: LocationDescriptor,
    /// Miscellaneous debug record location
    pub misc_record: LocationDescriptor,
}

impl Module {
    /// First address past the mapped image.
    #[must_use]
    pub fn end_address(&self) -> u64 {
        self.base_of_image
            .saturating_add(u64::from(self.size_of_image))
    }

    /// Whether `address` falls inside the mapped image. The end address is
    /// exclusive.
    #[must_use]
    pub fn contains(&self, address: u64) -> bool {
        address >= self.base_of_image && address < self.end_address()
    }

    /// The file name portion of the module path.
    #[must_use]
    pub fn base_name(&self) -> &str {
        self.name
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or(&self.name)
    }
}

/// MINIDUMP_MODULE_LIST - the loaded module list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleList {
    /// Modules in directory order
    pub modules: Vec<Module>,
}

impl ModuleList {
    /// Decode the stream at `location_rva`, chasing each module's name RVA.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<ModuleList> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let count = parser.read_le::<u32>()? as usize;
        let mut modules = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let base_of_image = parser.read_le::<u64>()?;
            let size_of_image = parser.read_le::<u32>()?;
            let checksum = parser.read_le::<u32>()?;
            let time_date_stamp = parser.read_le::<u32>()?;
            let module_name_rva = parser.read_le::<u32>()?;
            let version_info = FixedFileInfo::parse(&mut parser)?;
            let cv_record = LocationDescriptor::parse(&mut parser)?;
            let misc_record = LocationDescriptor::parse(&mut parser)?;
            let _reserved0 = parser.read_le::<u64>()?;
            let _reserved1 = parser.read_le::<u64>()?;

            modules.push(Module {
                base_of_image,
                size_of_image,
                checksum,
                time_date_stamp,
                name: read_string_at(data, module_name_rva)?,
                version_info,
                cv_record,
                misc_record,
            });
        }

        Ok(ModuleList { modules })
    }

    /// Find the module whose mapped image contains `address`.
    #[must_use]
    pub fn module_at(&self, address: u64) -> Option<&Module> {
        self.modules.iter().find(|module| module.contains(address))
    }

    /// Find a module by exact path or by file name.
    #[must_use]
    pub fn module_by_name(&self, name: &str) -> Option<&Module> {
        self.modules
            .iter()
            .find(|module| module.name == name || module.base_name() == name)
    }
}
