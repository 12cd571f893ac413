use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Format Errors
/// Fatal to parsing the affected stream or file; surfaced to the caller and never retried.
/// - [`Error::BadSignature`] - The file does not start with the minidump magic
/// - [`Error::Malformed`] - Corrupted or truncated record structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond the backing buffer
///
/// ## Memory Reader Errors
/// Recoverable per-call; a caller may skip the offending pointer and continue.
/// - [`Error::AddressNotMapped`] - Virtual address outside every captured segment
/// - [`Error::SegmentBoundary`] - A seek or read would cross a segment edge
/// - [`Error::UnsupportedArchitecture`] - Pointer width cannot be derived; fatal at
///   reader construction
///
/// ## Lookup Errors
/// - [`Error::ThreadNotFound`] - Thread index outside the decoded thread list
/// - [`Error::ModuleNotFound`] - No loaded module matches the given name
///
/// # Examples
///
/// ```rust,no_run
/// use dumpscope::{Error, Minidump};
/// use std::path::Path;
///
/// match Minidump::from_file(Path::new("crash.dmp")) {
///     Ok(dump) => println!("{} streams", dump.directory().len()),
///     Err(Error::BadSignature { found }) => {
///         eprintln!("not a minidump (signature {found:#010x})");
///     }
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("malformed dump: {message} ({file}:{line})");
///     }
///     Err(e) => eprintln!("error: {e}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file does not carry the expected `MDMP` signature.
    ///
    /// The minidump magic is the byte sequence `4D 44 4D 50` (`b"MDMP"`), read as a
    /// little-endian `u32` of `0x504d_444d`. Anything else means the input is not a
    /// minidump and parsing stops immediately.
    #[error("Invalid minidump signature {found:#010x} (expected 0x504d444d)")]
    BadSignature {
        /// The signature value actually found in the file
        found: u32,
    },

    /// The dump is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected
    /// for debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This is a safety check preventing buffer overruns when a record claims more
    /// data than the file actually holds.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during file operations
    /// such as reading from disk, permission issues, or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// A virtual address is not present in any captured memory segment.
    ///
    /// Crash dumps routinely omit paged-out regions; callers walking pointer chains
    /// should treat this as "that memory was not captured" and continue.
    #[error("Address {0:#018x} is not in the captured memory space")]
    AddressNotMapped(u64),

    /// A seek or read would cross the current segment's boundary.
    ///
    /// The reader never silently reads into an adjacent segment's bytes; crossing
    /// into a different segment requires an explicit `move_to`.
    #[error(
        "Operation at {position:#018x} would cross the segment boundary (target {target:#018x})"
    )]
    SegmentBoundary {
        /// The cursor position when the violation was detected
        position: u64,
        /// The address the operation would have reached
        target: u64,
    },

    /// The dump's processor architecture has no known pointer width.
    ///
    /// Raised at reader construction; carries the raw `PROCESSOR_ARCHITECTURE` value.
    #[error("Unsupported processor architecture {0:#06x}")]
    UnsupportedArchitecture(u16),

    /// The requested thread index is outside the decoded thread list.
    #[error("Thread index {0} not present in the dump")]
    ThreadNotFound(usize),

    /// No loaded module matches the given name.
    #[error("Module not found - {0}")]
    ModuleNotFound(String),

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
