//! `ExceptionStream` - the exception that triggered the dump.

use crate::{
    file::parser::Parser,
    format::directory::LocationDescriptor,
    Result,
};

/// Maximum number of exception information slots defined by the format.
pub const EXCEPTION_MAXIMUM_PARAMETERS: usize = 15;

/// MINIDUMP_EXCEPTION - the faulting exception record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRecord {
    /// NTSTATUS exception code
    pub exception_code: u32,
    /// EXCEPTION_NONCONTINUABLE and friends
    pub exception_flags: u32,
    /// Virtual address of a chained exception record, 0 if none
    pub exception_record: u64,
    /// Faulting instruction address
    pub exception_address: u64,
    /// Code-specific parameters, at most [`EXCEPTION_MAXIMUM_PARAMETERS`]
    pub exception_information: Vec<u64>,
}

impl ExceptionRecord {
    /// Well-known name for the exception code, if it is one of the common ones.
    #[must_use]
    pub fn code_name(&self) -> Option<&'static str> {
        match self.exception_code {
            0x8000_0003 => Some("EXCEPTION_BREAKPOINT"),
            0x8000_0004 => Some("EXCEPTION_SINGLE_STEP"),
            0xc000_0005 => Some("EXCEPTION_ACCESS_VIOLATION"),
            0xc000_0006 => Some("EXCEPTION_IN_PAGE_ERROR"),
            0xc000_0008 => Some("EXCEPTION_INVALID_HANDLE"),
            0xc000_0017 => Some("STATUS_NO_MEMORY"),
            0xc000_001d => Some("EXCEPTION_ILLEGAL_INSTRUCTION"),
            0xc000_0025 => Some("EXCEPTION_NONCONTINUABLE_EXCEPTION"),
            0xc000_008c => Some("EXCEPTION_ARRAY_BOUNDS_EXCEEDED"),
            0xc000_008e => Some("EXCEPTION_FLT_DIVIDE_BY_ZERO"),
            0xc000_0094 => Some("EXCEPTION_INT_DIVIDE_BY_ZERO"),
            0xc000_0096 => Some("EXCEPTION_PRIV_INSTRUCTION"),
            0xc000_00fd => Some("EXCEPTION_STACK_OVERFLOW"),
            0xc000_0135 => Some("STATUS_DLL_NOT_FOUND"),
            0xc000_0374 => Some("STATUS_HEAP_CORRUPTION"),
            0xc000_0409 => Some("STATUS_STACK_BUFFER_OVERRUN"),
            _ => None,
        }
    }
}

/// MINIDUMP_EXCEPTION_STREAM - the exception with its owning thread and context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    /// Thread that raised the exception
    pub thread_id: u32,
    /// The exception record
    pub exception_record: ExceptionRecord,
    /// Register context of the faulting thread
    pub thread_context: LocationDescriptor,
}

impl ExceptionInfo {
    /// Decode the stream at `location_rva`.
    pub fn parse(data: &[u8], location_rva: u32) -> Result<ExceptionInfo> {
        let mut parser = Parser::new(data);
        parser.seek(location_rva as usize)?;

        let thread_id = parser.read_le::<u32>()?;
        let _alignment = parser.read_le::<u32>()?;

        let exception_code = parser.read_le::<u32>()?;
        let exception_flags = parser.read_le::<u32>()?;
        let exception_record = parser.read_le::<u64>()?;
        let exception_address = parser.read_le::<u64>()?;
        let number_parameters = parser.read_le::<u32>()? as usize;
        let _alignment = parser.read_le::<u32>()?;

        // The on-disk array is always 15 slots; only the declared count is kept.
        let mut exception_information =
            Vec::with_capacity(number_parameters.min(EXCEPTION_MAXIMUM_PARAMETERS));
        for _ in 0..EXCEPTION_MAXIMUM_PARAMETERS {
            let value = parser.read_le::<u64>()?;
            if exception_information.len() < number_parameters {
                exception_information.push(value);
            }
        }

        let thread_context = LocationDescriptor::parse(&mut parser)?;

        Ok(ExceptionInfo {
            thread_id,
            exception_record: ExceptionRecord {
                exception_code,
                exception_flags,
                exception_record,
                exception_address,
                exception_information,
            },
            thread_context,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_stream(code: u32, parameters: &[u64]) -> Vec<u8> {
        let mut stream = Vec::new();
        stream.extend_from_slice(&0x1234u32.to_le_bytes()); // thread id
        stream.extend_from_slice(&[0u8; 4]); // alignment
        stream.extend_from_slice(&code.to_le_bytes());
        stream.extend_from_slice(&1u32.to_le_bytes()); // noncontinuable
        stream.extend_from_slice(&0u64.to_le_bytes()); // chained record
        stream.extend_from_slice(&0x7ff6_1000_2000u64.to_le_bytes());
        stream.extend_from_slice(&(parameters.len() as u32).to_le_bytes());
        stream.extend_from_slice(&[0u8; 4]); // alignment
        for slot in 0..EXCEPTION_MAXIMUM_PARAMETERS {
            let value = parameters.get(slot).copied().unwrap_or(0);
            stream.extend_from_slice(&value.to_le_bytes());
        }
        stream.extend_from_slice(&0x4d0u32.to_le_bytes()); // context size
        stream.extend_from_slice(&0x9000u32.to_le_bytes()); // context rva
        stream
    }

    #[test]
    fn access_violation() {
        let stream = build_stream(0xc000_0005, &[1, 0xdead_beef]);
        let info = ExceptionInfo::parse(&stream, 0).unwrap();

        assert_eq!(info.thread_id, 0x1234);
        assert_eq!(info.exception_record.exception_code, 0xc000_0005);
        assert_eq!(
            info.exception_record.code_name(),
            Some("EXCEPTION_ACCESS_VIOLATION")
        );
        assert_eq!(info.exception_record.exception_address, 0x7ff6_1000_2000);
        assert_eq!(info.exception_record.exception_information, vec![1, 0xdead_beef]);
        assert_eq!(info.thread_context.rva, 0x9000);
    }

    #[test]
    fn unknown_code_survives() {
        let stream = build_stream(0xe006_d736, &[]);
        let info = ExceptionInfo::parse(&stream, 0).unwrap();

        assert_eq!(info.exception_record.exception_code, 0xe006_d736);
        assert!(info.exception_record.code_name().is_none());
        assert!(info.exception_record.exception_information.is_empty());
    }
}
