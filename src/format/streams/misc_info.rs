//! `MiscInfoStream` - process identity, timing, and power information.
//!
//! The structure is versioned by its leading size field; each revision appends
//! fields. Fields are surfaced only when both the validity flag is set and the
//! declared size actually covers them.

use bitflags::bitflags;

use crate::{file::parser::Parser, Result};

bitflags! {
    /// MISC1_*/MISC3_* validity flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MiscInfoFlags: u32 {
        /// process_id is valid
        const PROCESS_ID = 0x0000_0001;
        /// Process times are valid
        const PROCESS_TIMES = 0x0000_0002;
        /// Processor power information is valid
        const PROCESSOR_POWER_INFO = 0x0000_0004;
    }
}

/// Processor speed and idle-state fields appended by MISC_INFO_2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorPowerInfo {
    /// Maximum processor frequency in MHz
    pub processor_max_mhz: u32,
    /// Frequency at capture time in MHz
    pub processor_current_mhz: u32,
    /// Throttle limit in MHz
    pub processor_mhz_limit: u32,
    /// Deepest supported idle state
    pub processor_max_idle_state: u32,
    /// Idle state at capture time
    pub processor_current_idle_state: u32,
}

/// MINIDUMP_MISC_INFO - miscellaneous process information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiscInfo {
    /// Declared structure size, selects the revision
    pub size_of_info: u32,
    /// Which fields the producer filled in
    pub flags: MiscInfoFlags,
    /// Process identifier, when PROCESS_ID is set
    pub process_id: Option<u32>,
    /// Process creation time as time_t, when PROCESS_TIMES is set
    pub process_create_time: Option<u32>,
    /// Accumulated user-mode CPU seconds, when PROCESS_TIMES is set
    pub process_user_time: Option<u32>,
    /// Accumulated kernel-mode CPU seconds, when PROCESS_TIMES is set
    pub process_kernel_time: Option<u32>,
    /// Processor power fields, when the revision carries them
    pub processor_power_info: Option<ProcessorPowerInfo>,
}

const BASE_SIZE: u32 = 24;
const WITH_POWER_INFO_SIZE: u32 = 44;

impl MiscInfo {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<MiscInfo> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let size_of_info = parser.read_le::<u32>()?;
        if size_of_info < BASE_SIZE {
            return Err(malformed_error!(
                "Misc info size {} below the base layout",
                size_of_info
            ));
        }

        let flags = MiscInfoFlags::from_bits_retain(parser.read_le::<u32>()?);
        let raw_process_id = parser.read_le::<u32>()?;
        let raw_create_time = parser.read_le::<u32>()?;
        let raw_user_time = parser.read_le::<u32>()?;
        let raw_kernel_time = parser.read_le::<u32>()?;

        let process_id = flags
            .contains(MiscInfoFlags::PROCESS_ID)
            .then_some(raw_process_id);
        let times_valid = flags.contains(MiscInfoFlags::PROCESS_TIMES);

        let processor_power_info = if size_of_info >= WITH_POWER_INFO_SIZE
            && flags.contains(MiscInfoFlags::PROCESSOR_POWER_INFO)
        {
            Some(ProcessorPowerInfo {
                processor_max_mhz: parser.read_le::<u32>()?,
                processor_current_mhz: parser.read_le::<u32>()?,
                processor_mhz_limit: parser.read_le::<u32>()?,
                processor_max_idle_state: parser.read_le::<u32>()?,
                processor_current_idle_state: parser.read_le::<u32>()?,
            })
        } else {
            None
        };

        Ok(MiscInfo {
            size_of_info,
            flags,
            process_id,
            process_create_time: times_valid.then_some(raw_create_time),
            process_user_time: times_valid.then_some(raw_user_time),
            process_kernel_time: times_valid.then_some(raw_kernel_time),
            processor_power_info,
        })
    }
}
