//! `SystemInfoStream` - processor and operating system description.
//!
//! This stream drives pointer-width decisions for everything that walks captured
//! memory, so most consumers parse it before touching any other stream.

use strum::FromRepr;

use crate::{
    file::parser::Parser,
    format::strings::read_string_at,
    Result,
};

/// PROCESSOR_ARCHITECTURE_* values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
#[repr(u16)]
pub enum ProcessorArchitecture {
    /// x86 (32-bit)
    Intel = 0,
    /// MIPS
    Mips = 1,
    /// Alpha
    Alpha = 2,
    /// PowerPC
    Ppc = 3,
    /// SHx
    Shx = 4,
    /// ARM (32-bit)
    Arm = 5,
    /// Itanium
    Ia64 = 6,
    /// Alpha64
    Alpha64 = 7,
    /// MSIL
    Msil = 8,
    /// x64
    Amd64 = 9,
    /// WOW64
    Ia32OnWin64 = 10,
    /// ARM64
    Arm64 = 12,
    /// Unknown
    Unknown = 0xffff,
}

impl ProcessorArchitecture {
    /// Pointer width in bytes for this architecture.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedArchitecture`] for architectures the
    /// memory walkers do not model.
    pub fn pointer_size(&self) -> Result<u64> {
        match self {
            ProcessorArchitecture::Amd64 | ProcessorArchitecture::Arm64 => Ok(8),
            ProcessorArchitecture::Intel | ProcessorArchitecture::Arm => Ok(4),
            other => Err(crate::Error::UnsupportedArchitecture(*other as u16)),
        }
    }
}

/// CPU information, layout depends on the architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuInfo {
    /// x86 layout with CPUID-derived fields
    X86 {
        /// Raw CPUID vendor string registers
        vendor_id: [u32; 3],
        /// CPUID 1 EAX
        version_information: u32,
        /// CPUID 1 EDX
        feature_information: u32,
        /// CPUID 0x80000001 features, AMD only
        amd_extended_cpu_features: u32,
    },
    /// All other architectures
    Other {
        /// PF_* feature bits
        processor_features: [u64; 2],
    },
}

impl CpuInfo {
    /// The CPUID vendor string ("GenuineIntel", "AuthenticAMD", ...) if this is an
    /// x86 record.
    #[must_use]
    pub fn vendor(&self) -> Option<String> {
        match self {
            CpuInfo::X86 { vendor_id, .. } => {
                let mut raw = Vec::with_capacity(12);
                for register in vendor_id {
                    raw.extend_from_slice(&register.to_le_bytes());
                }
                Some(String::from_utf8_lossy(&raw).into_owned())
            }
            CpuInfo::Other { .. } => None,
        }
    }
}

/// MINIDUMP_SYSTEM_INFO - processor and OS version description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// The processor family
    pub processor_architecture: ProcessorArchitecture,
    /// Architecture-dependent processor level
    pub processor_level: u16,
    /// Architecture-dependent processor revision
    pub processor_revision: u16,
    /// Number of logical processors
    pub number_of_processors: u8,
    /// VER_NT_* product type
    pub product_type: u8,
    /// OS major version
    pub major_version: u32,
    /// OS minor version
    pub minor_version: u32,
    /// OS build number
    pub build_number: u32,
    /// VER_PLATFORM_* platform identifier
    pub platform_id: u32,
    /// Service pack string, if present in the dump
    pub csd_version: Option<String>,
    /// VER_SUITE_* mask
    pub suite_mask: u16,
    /// Architecture-dependent CPU detail
    pub cpu: CpuInfo,
}

impl SystemInfo {
    /// Decode the system info stream. `data` is the whole file so the service pack
    /// string RVA can be chased.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<SystemInfo> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let raw_architecture = parser.read_le::<u16>()?;
        let processor_architecture = ProcessorArchitecture::from_repr(raw_architecture)
            .unwrap_or(ProcessorArchitecture::Unknown);

        let processor_level = parser.read_le::<u16>()?;
        let processor_revision = parser.read_le::<u16>()?;
        let number_of_processors = parser.read_le::<u8>()?;
        let product_type = parser.read_le::<u8>()?;
        let major_version = parser.read_le::<u32>()?;
        let minor_version = parser.read_le::<u32>()?;
        let build_number = parser.read_le::<u32>()?;
        let platform_id = parser.read_le::<u32>()?;
        let csd_version_rva = parser.read_le::<u32>()?;
        let suite_mask = parser.read_le::<u16>()?;
        let _reserved2 = parser.read_le::<u16>()?;

        let cpu = if processor_architecture == ProcessorArchitecture::Intel {
            CpuInfo::X86 {
                vendor_id: [
                    parser.read_le::<u32>()?,
                    parser.read_le::<u32>()?,
                    parser.read_le::<u32>()?,
                ],
                version_information: parser.read_le::<u32>()?,
                feature_information: parser.read_le::<u32>()?,
                amd_extended_cpu_features: parser.read_le::<u32>()?,
            }
        } else {
            CpuInfo::Other {
                processor_features: [parser.read_le::<u64>()?, parser.read_le::<u64>()?],
            }
        };

        let csd_version = if csd_version_rva != 0 {
            Some(read_string_at(data, csd_version_rva)?)
        } else {
            None
        };

        Ok(SystemInfo {
            processor_architecture,
            processor_level,
            processor_revision,
            number_of_processors,
            product_type,
            major_version,
            minor_version,
            build_number,
            platform_id,
            csd_version,
            suite_mask,
            cpu,
        })
    }

    /// Pointer width in bytes for the dumped process.
    pub fn pointer_size(&self) -> Result<u64> {
        self.processor_architecture.pointer_size()
    }

    /// A best-effort human-readable OS name derived from version and product
    /// type. Combinations outside the lookup table yield `None` rather than
    /// a guess.
    #[must_use]
    pub fn os_name(&self) -> Option<&'static str> {
        let workstation = self.product_type == 1;
        match (self.major_version, self.minor_version) {
            (10, 0) if workstation => Some("Windows 10"),
            (10, 0) => Some("Windows Server 2016+"),
            (6, 3) if workstation => Some("Windows 8.1"),
            (6, 3) => Some("Windows Server 2012 R2"),
            (6, 2) if workstation => Some("Windows 8"),
            (6, 2) => Some("Windows Server 2012"),
            (6, 1) if workstation => Some("Windows 7"),
            (6, 1) => Some("Windows Server 2008 R2"),
            (6, 0) if workstation => Some("Windows Vista"),
            (6, 0) => Some("Windows Server 2008"),
            (5, 2) => Some("Windows Server 2003"),
            (5, 1) => Some("Windows XP"),
            (5, 0) => Some("Windows 2000"),
            _ => None,
        }
    }
}
