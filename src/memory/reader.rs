//! Buffered reading of captured process memory.
//!
//! [`MemoryReader`] is a cursor over an [`AddressSpace`]: position it at a
//! virtual address with [`MemoryReader::move_to`] and consume bytes with the
//! `read_*` family. Whole segments are materialized into an unbounded cache on
//! first touch, so repeated walks over the same structures never re-slice the
//! file. Reads never cross a segment boundary; a dump does not promise adjacent
//! segments are contiguous in the process they came from.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use dumpscope::Minidump;
//!
//! let dump = Minidump::from_file("crash.dmp".as_ref())?;
//! let mut reader = dump.reader()?;
//!
//! reader.move_to(0x7ffe_0000)?;
//! let tick_count = reader.read_le::<u32>()?;
//! println!("KUSER_SHARED_DATA tick count low: {tick_count}");
//! # Ok::<(), dumpscope::Error>(())
//! ```

use crate::{
    file::io::{read_le, DumpIO},
    memory::space::{AddressSpace, MemorySegment},
    Result,
};

/// Reference point for [`MemoryReader::seek`]. All variants are relative to the
/// segment the cursor currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Offset from the start of the current segment
    SegmentStart,
    /// Offset from the current position
    Current,
    /// Offset from the end of the current segment, usually negative
    SegmentEnd,
}

struct BufferedSegment {
    segment: MemorySegment,
    data: Vec<u8>,
}

/// A seekable cursor over captured process memory.
pub struct MemoryReader<'a> {
    file: &'a [u8],
    space: &'a AddressSpace,
    cache: Vec<BufferedSegment>,
    current: Option<usize>,
    position: u64,
}

impl<'a> MemoryReader<'a> {
    /// Create a reader over `space`, backed by the raw dump bytes.
    #[must_use]
    pub fn new(file: &'a [u8], space: &'a AddressSpace) -> MemoryReader<'a> {
        MemoryReader {
            file,
            space,
            cache: Vec::new(),
            current: None,
            position: 0,
        }
    }

    /// The address space this reader walks.
    #[must_use]
    pub fn space(&self) -> &AddressSpace {
        self.space
    }

    /// Current virtual address of the cursor.
    #[must_use]
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Position the cursor at `address`, buffering its segment on first touch.
    ///
    /// # Errors
    /// Returns [`crate::Error::AddressNotMapped`] when no captured segment
    /// contains the address.
    pub fn move_to(&mut self, address: u64) -> Result<()> {
        // The cache is checked before the segment list so a segment stays
        // pinned to the copy that was first materialized for it.
        if let Some(index) = self
            .cache
            .iter()
            .position(|buffered| buffered.segment.inrange(address))
        {
            self.current = Some(index);
            self.position = address;
            return Ok(());
        }

        let segment = *self
            .space
            .find_segment(address)
            .ok_or(crate::Error::AddressNotMapped(address))?;

        let index = self.buffer_segment(segment)?;
        self.current = Some(index);
        self.position = address;
        Ok(())
    }

    /// Move the cursor relative to the current segment. The target must stay
    /// inside the segment.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<()> {
        let index = self.current_index()?;
        let segment = self.cache[index].segment;

        let base = match whence {
            Whence::SegmentStart => segment.start_address,
            Whence::Current => self.position,
            Whence::SegmentEnd => segment.end_address,
        };

        let target = base
            .checked_add_signed(offset)
            .ok_or(crate::Error::SegmentBoundary {
                position: self.position,
                target: base.wrapping_add_signed(offset),
            })?;

        if !segment.inrange(target) {
            return Err(crate::Error::SegmentBoundary {
                position: self.position,
                target,
            });
        }

        self.position = target;
        Ok(())
    }

    /// Advance the cursor to the next multiple of `alignment`, staying within
    /// the current segment. When `alignment` is `None` the pointer width of
    /// the dump's architecture is used.
    pub fn align(&mut self, alignment: Option<u64>) -> Result<()> {
        let alignment = match alignment {
            Some(value) => value,
            None => self.space.pointer_size(),
        };
        if alignment == 0 || self.position % alignment == 0 {
            return Ok(());
        }

        let padding = alignment - self.position % alignment;
        let delta =
            i64::try_from(padding).map_err(|_| crate::Error::SegmentBoundary {
                position: self.position,
                target: self.position.wrapping_add(padding),
            })?;
        self.seek(delta, Whence::Current)
    }

    /// Read `length` bytes and advance the cursor.
    ///
    /// # Errors
    /// Returns [`crate::Error::SegmentBoundary`] when the read would run past
    /// the end of the current segment.
    pub fn read(&mut self, length: u64) -> Result<&[u8]> {
        let (index, range) = self.span(length)?;
        self.position += length;
        Ok(&self.cache[index].data[range])
    }

    /// Read `length` bytes without moving the cursor.
    pub fn peek(&mut self, length: u64) -> Result<&[u8]> {
        let (index, range) = self.span(length)?;
        Ok(&self.cache[index].data[range])
    }

    /// Read everything between the cursor and the end of the current segment.
    /// Returns `None` when the cursor already sits at the segment end.
    pub fn read_rest(&mut self) -> Result<Option<&[u8]>> {
        let index = self.current_index()?;
        let remaining = self.cache[index].segment.end_address - self.position;
        if remaining == 0 {
            return Ok(None);
        }
        self.read(remaining).map(Some)
    }

    /// Read a little-endian primitive and advance the cursor.
    pub fn read_le<T: DumpIO>(&mut self) -> Result<T> {
        let raw = self.read(std::mem::size_of::<T::Bytes>() as u64)?;
        read_le::<T>(raw)
    }

    /// Read a pointer-sized unsigned integer, widened to `u64`.
    pub fn read_uint(&mut self) -> Result<u64> {
        match self.space.pointer_size() {
            8 => self.read_le::<u64>(),
            4 => self.read_le::<u32>().map(u64::from),
            other => Err(crate::Error::UnsupportedArchitecture(other as u16)),
        }
    }

    /// Read a pointer-sized signed integer, widened to `i64`.
    pub fn read_int(&mut self) -> Result<i64> {
        match self.space.pointer_size() {
            8 => self.read_le::<i64>(),
            4 => self.read_le::<i32>().map(i64::from),
            other => Err(crate::Error::UnsupportedArchitecture(other as u16)),
        }
    }

    /// Read a pointer value at the cursor.
    pub fn read_ptr(&mut self) -> Result<u64> {
        self.read_uint()
    }

    /// Move to `address` and read the pointer stored there.
    pub fn deref_ptr(&mut self, address: u64) -> Result<u64> {
        self.move_to(address)?;
        self.read_ptr()
    }

    /// Find the next occurrence of `pattern` in the current segment, searching
    /// forward from the cursor. The cursor does not move. Returns the virtual
    /// address of the match.
    pub fn find(&mut self, pattern: &[u8]) -> Result<Option<u64>> {
        let index = self.current_index()?;
        let buffered = &self.cache[index];
        let start = (self.position - buffered.segment.start_address) as usize;

        Ok(find_from(&buffered.data, start, pattern)
            .map(|offset| buffered.segment.start_address + offset as u64))
    }

    /// Find every occurrence of `pattern` in the current segment.
    pub fn find_all(&mut self, pattern: &[u8]) -> Result<Vec<u64>> {
        let index = self.current_index()?;
        let buffered = &self.cache[index];

        Ok(find_all_in(&buffered.data, pattern)
            .into_iter()
            .map(|offset| buffered.segment.start_address + offset as u64)
            .collect())
    }

    /// Find every occurrence of `pattern` across all captured segments. The
    /// cursor does not move, but every touched segment is buffered.
    pub fn find_all_global(&mut self, pattern: &[u8]) -> Result<Vec<u64>> {
        let mut matches = Vec::new();
        for segment in self.space.segments().to_vec() {
            let index = self.buffer_segment(segment)?;
            let buffered = &self.cache[index];
            matches.extend(
                find_all_in(&buffered.data, pattern)
                    .into_iter()
                    .map(|offset| buffered.segment.start_address + offset as u64),
            );
        }
        Ok(matches)
    }

    /// Find every occurrence of `pattern` inside the half-open address range
    /// `[range_start, range_end)`.
    pub fn find_in_range(
        &mut self,
        range_start: u64,
        range_end: u64,
        pattern: &[u8],
    ) -> Result<Vec<u64>> {
        let matches = self.find_all_global(pattern)?;
        Ok(matches
            .into_iter()
            .filter(|address| *address >= range_start && *address < range_end)
            .collect())
    }

    /// Find every occurrence of `pattern` inside a module's mapped image.
    pub fn find_in_module(
        &mut self,
        module: &crate::format::streams::Module,
        pattern: &[u8],
    ) -> Result<Vec<u64>> {
        self.find_in_range(module.base_of_image, module.end_address(), pattern)
    }

    fn current_index(&self) -> Result<usize> {
        self.current
            .ok_or(crate::Error::AddressNotMapped(self.position))
    }

    /// Resolve a read of `length` bytes at the cursor into a cache slot and a
    /// byte range within it.
    fn span(&self, length: u64) -> Result<(usize, std::ops::Range<usize>)> {
        let index = self.current_index()?;
        let segment = self.cache[index].segment;

        let target = self
            .position
            .checked_add(length)
            .ok_or(crate::Error::SegmentBoundary {
                position: self.position,
                target: self.position.wrapping_add(length),
            })?;
        if target > segment.end_address {
            return Err(crate::Error::SegmentBoundary {
                position: self.position,
                target,
            });
        }

        let offset = (self.position - segment.start_address) as usize;
        Ok((index, offset..offset + length as usize))
    }

    /// Materialize a segment's bytes into the cache, or return the existing
    /// slot.
    fn buffer_segment(&mut self, segment: MemorySegment) -> Result<usize> {
        if let Some(index) = self
            .cache
            .iter()
            .position(|buffered| buffered.segment == segment)
        {
            return Ok(index);
        }

        let start = usize::try_from(segment.file_offset)
            .map_err(|_| crate::Error::OutOfBounds)?;
        let length = usize::try_from(segment.size).map_err(|_| crate::Error::OutOfBounds)?;
        let end = start.checked_add(length).ok_or(crate::Error::OutOfBounds)?;
        if end > self.file.len() {
            return Err(crate::Error::OutOfBounds);
        }

        self.cache.push(BufferedSegment {
            segment,
            data: self.file[start..end].to_vec(),
        });
        Ok(self.cache.len() - 1)
    }
}

fn find_from(haystack: &[u8], start: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || start >= haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| start + offset)
}

fn find_all_in(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    let mut matches = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = find_from(haystack, cursor, needle) {
        matches.push(offset);
        cursor = offset + 1;
    }
    matches
}
