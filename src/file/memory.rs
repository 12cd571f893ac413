//! In-memory buffer backend.
//!
//! Wraps an owned `Vec<u8>` holding a complete dump image. Used when the dump arrives
//! over a socket, from an archive, or from a caller that already has the bytes; also
//! the natural adapter for cooperative runtimes that preload the file themselves.

use super::Backend;
use crate::{Error::OutOfBounds, Result};

/// Owned in-memory dump image.
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Wrap an owned byte buffer.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if offset_end > self.data.len() {
            return Err(OutOfBounds);
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
