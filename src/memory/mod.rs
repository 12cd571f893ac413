//! The captured address space model and the buffered memory reader.

pub mod reader;
pub mod space;

pub use reader::{MemoryReader, Whence};
pub use space::{AddressSpace, MemorySegment};
