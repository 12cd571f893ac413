//! Dump file abstraction and low-level byte access.
//!
//! This module abstracts over the source of minidump bytes (files on disk, in-memory
//! buffers) and provides the primitives every stream decoder is built on. All record
//! decoding in this crate is written once against the [`crate::file::Backend`] trait;
//! the backends differ only in how the bytes are produced, never in decoding logic.
//!
//! # Key Components
//!
//! - [`crate::file::Backend`] - Trait for dump data sources
//! - [`crate::file::physical::Physical`] - Memory-mapped file backend
//! - [`crate::file::memory::Memory`] - In-memory buffer backend
//! - [`crate::file::parser::Parser`] - Cursor-based record parser
//! - [`crate::file::io`] - Bounds-checked little-endian primitives
//!
//! # Thread Safety
//!
//! Backends are `Send + Sync`; the parsed dump is immutable after construction, so any
//! number of consumers may read it concurrently.

pub mod io;
pub mod parser;

mod memory;
mod physical;

pub use memory::Memory;
pub use parser::Parser;
pub use physical::Physical;

/// Backend trait for dump data sources.
///
/// This trait abstracts over the source of minidump data, allowing for both in-memory
/// and on-disk representations. It is the polymorphic I/O boundary of the crate: the
/// header, directory, and stream decoders operate purely on byte slices obtained here,
/// so adding another data source never duplicates record-decoding logic.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> crate::Result<&[u8]>;

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the backend holds no data.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
