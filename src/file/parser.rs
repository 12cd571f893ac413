//! Low-level byte stream parser for minidump record decoding.
//!
//! This module provides the [`crate::file::parser::Parser`] type, a cursor-based binary
//! data parser used by every stream decoder. It offers bounds-checked sequential access
//! to a byte slice: all record fields in the minidump container are fixed-width
//! little-endian values read in documented order, so the parser's surface is small.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser::read_le`] - Read primitive types (little-endian)
//! - [`crate::file::parser::Parser::bytes`] - Take a raw byte run
//! - [`crate::file::parser::Parser::seek`] / [`crate::file::parser::Parser::advance_by`] -
//!   Navigation
//!
//! # Usage Examples
//!
//! ```rust
//! use dumpscope::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04];
//! let mut parser = Parser::new(&data);
//!
//! let value = parser.read_le::<u16>()?;
//! assert_eq!(value, 0x0201);
//! # Ok::<(), dumpscope::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, DumpIO},
    Error::OutOfBounds,
    Result,
};

/// A cursor-based parser for fixed-layout minidump records.
///
/// `Parser` maintains a position within a byte slice and provides bounds-checked,
/// strongly typed reads. Malformed or truncated records surface as
/// [`crate::Error::OutOfBounds`] instead of panics.
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`crate::file::parser::Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the position is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by `step` would exceed the
    /// data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if self.position + step > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position += step;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read a value of type `T` in little-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_le<T: DumpIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Peek at a value of type `T` in little-endian format without advancing.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn peek_le<T: DumpIO>(&self) -> Result<T> {
        let mut temp_position = self.position;
        read_le_at::<T>(self.data, &mut temp_position)
    }

    /// Take the next `len` raw bytes and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let Some(end) = self.position.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if end > self.data.len() {
            return Err(OutOfBounds);
        }

        let slice = &self.data[self.position..end];
        self.position = end;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let mut parser = Parser::new(&data);

        let first = parser.read_le::<u32>().unwrap();
        assert_eq!(first, 0x04030201);
        assert_eq!(parser.pos(), 4);

        let second = parser.read_le::<u16>().unwrap();
        assert_eq!(second, 0x0605);
        assert!(parser.has_more_data());
    }

    #[test]
    fn seek_and_bytes() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05];
        let mut parser = Parser::new(&data);

        parser.seek(2).unwrap();
        assert_eq!(parser.bytes(3).unwrap(), &[0x03, 0x04, 0x05]);
        assert!(!parser.has_more_data());

        assert!(parser.bytes(1).is_err());
        assert!(parser.seek(6).is_err());
    }

    #[test]
    fn peek_does_not_advance() {
        let data = [0x0A, 0x0B];
        let parser = Parser::new(&data);

        assert_eq!(parser.peek_le::<u16>().unwrap(), 0x0B0A);
        assert_eq!(parser.pos(), 0);
    }

    #[test]
    fn truncated_read() {
        let data = [0x01, 0x02];
        let mut parser = Parser::new(&data);

        assert!(matches!(parser.read_le::<u32>(), Err(OutOfBounds)));
        assert_eq!(parser.pos(), 0);
    }
}
