// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dumpscope
//!
//! A cross-platform library for parsing Windows minidump files and walking the
//! process memory captured inside them. Built in pure Rust, `dumpscope` decodes
//! the stream directory, models the captured virtual address space, and recovers
//! process state such as the command line and environment straight from memory,
//! without requiring Windows or any debugging engine.
//!
//! ## Features
//!
//! - **📦 Efficient memory access** - Memory-mapped file access with whole-segment buffering on first touch
//! - **🔍 Complete stream decoding** - Threads, modules, memory lists, exception, handles, and more
//! - **🧭 Virtual address space model** - Resolve any captured address to its bytes in the file
//! - **🚶 Process state recovery** - Walk TEB → PEB → process parameters to the command line and environment
//! - **🔧 Cross-platform** - Works on Windows, Linux, macOS, and any Rust-supported platform
//! - **🛡️ Memory safe** - Built in Rust with comprehensive error handling
//!
//! ## Quick Start
//!
//! Add `dumpscope` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! dumpscope = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust,no_run
//! use dumpscope::prelude::*;
//!
//! // Load and inspect a crash dump
//! let dump = Minidump::from_file("crash.dmp".as_ref())?;
//! println!("Streams: {}", dump.directory().len());
//! # Ok::<(), dumpscope::Error>(())
//! ```
//!
//! ### Basic Usage
//!
//! ```rust,no_run
//! use dumpscope::Minidump;
//! use std::path::Path;
//!
//! // Load and parse a minidump
//! let dump = Minidump::from_file(Path::new("crash.dmp"))?;
//!
//! // Inspect the environment it was taken on
//! if let Some(info) = dump.system_info() {
//!     let os = info.os_name().unwrap_or("unknown");
//!     println!("{os} build {}", info.build_number);
//! }
//!
//! // Enumerate loaded modules
//! if let Some(modules) = dump.modules() {
//!     for module in &modules.modules {
//!         println!("{:#018x} {}", module.base_of_image, module.name);
//!     }
//! }
//! # Ok::<(), dumpscope::Error>(())
//! ```
//!
//! ### Reading Captured Memory
//!
//! ```rust,no_run
//! use dumpscope::Minidump;
//!
//! let dump = Minidump::from_file("crash.dmp".as_ref())?;
//! let mut reader = dump.reader()?;
//!
//! // Follow a pointer chain through the captured address space
//! let list_head = reader.deref_ptr(0x7ffd_0000_1000)?;
//! reader.move_to(list_head)?;
//! let flink = reader.read_ptr()?;
//! println!("next entry at {flink:#018x}");
//! # Ok::<(), dumpscope::Error>(())
//! ```
//!
//! ### Process State Recovery
//!
//! ```rust,no_run
//! use dumpscope::{Minidump, Peb};
//!
//! let dump = Minidump::from_file("crash.dmp".as_ref())?;
//! let peb = Peb::walk(&dump, 0)?;
//!
//! if let Some(command_line) = &peb.command_line {
//!     println!("started as: {command_line}");
//! }
//! # Ok::<(), dumpscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `dumpscope` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`format`] - Header, stream directory, and per-stream decoders
//! - [`memory`] - The captured address space model and the buffered [`MemoryReader`]
//! - [`process`] - Recovery of process structures from captured memory
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with detailed error information:
//!
//! ```rust,no_run
//! use dumpscope::{Error, Minidump};
//!
//! match Minidump::from_file(std::path::Path::new("crash.dmp")) {
//!     Ok(dump) => println!("parsed {} streams", dump.directory().len()),
//!     Err(Error::BadSignature { found }) => println!("not a minidump: {found:#010x}"),
//!     Err(Error::Malformed { message, .. }) => println!("malformed dump: {}", message),
//!     Err(e) => println!("other error: {}", e),
//! }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test
//! ```
#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the dumpscope library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust,no_run
/// use dumpscope::prelude::*;
///
/// let dump = Minidump::from_file("crash.dmp".as_ref())?;
/// let mut reader = dump.reader()?;
/// # Ok::<(), dumpscope::Error>(())
/// ```
pub mod prelude;

/// Minidump container parsing: header, directory, and stream decoders.
///
/// This module implements the minidump file format as produced by
/// `MiniDumpWriteDump` and compatible tools. It provides:
///
/// - **Header and directory**: [`format::header::Header`], [`format::directory::DirectoryEntry`]
/// - **Stream decoders**: one typed decoder per understood stream in [`format::streams`]
/// - **String decoding**: `MINIDUMP_STRING` handling in [`format::strings`]
///
/// # Key Types
///
/// - [`Minidump`] - Main entry point for parsing and stream access
/// - [`format::streams::SystemInfo`] - Processor and OS description
/// - [`format::streams::ModuleList`] - Loaded modules with version records
/// - [`format::streams::ExceptionInfo`] - The faulting exception
///
/// # Examples
///
/// ```rust,no_run
/// use dumpscope::Minidump;
/// use std::path::Path;
///
/// let dump = Minidump::from_file(Path::new("crash.dmp"))?;
///
/// if let Some(exception) = dump.exception() {
///     println!(
///         "thread {} raised {:#010x} at {:#018x}",
///         exception.thread_id,
///         exception.exception_record.exception_code,
///         exception.exception_record.exception_address,
///     );
/// }
/// # Ok::<(), dumpscope::Error>(())
/// ```
pub mod format;

/// The captured virtual address space and the buffered memory reader.
///
/// # Key Types
///
/// - [`memory::AddressSpace`] - Maps virtual addresses to file locations
/// - [`MemoryReader`] - A seekable cursor over captured memory
/// - [`memory::Whence`] - Segment-relative seek origins
pub mod memory;

/// Recovery of process structures from captured memory.
///
/// # Key Types
///
/// - [`Peb`] - The process environment block with command line, paths, and environment
pub mod process;

/// `dumpscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
///
/// # Examples
///
/// ```rust,no_run
/// use dumpscope::{Result, Minidump};
///
/// fn load_dump(path: &str) -> Result<Minidump> {
///     Minidump::from_file(std::path::Path::new(path))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `dumpscope` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for file parsing, stream decoding, and memory reading.
pub use error::Error;

/// Main entry point for working with minidump files.
///
/// See [`format::Minidump`] for parsing and stream access.
///
/// # Example
///
/// ```rust,no_run
/// use dumpscope::Minidump;
/// let dump = Minidump::from_file(std::path::Path::new("crash.dmp"))?;
/// println!("{} streams", dump.directory().len());
/// # Ok::<(), dumpscope::Error>(())
/// ```
pub use format::Minidump;

/// Buffered cursor over the captured process memory.
///
/// Obtained from [`Minidump::reader`]; see [`memory::reader`] for the full API.
pub use memory::MemoryReader;

/// The recovered process environment block.
pub use process::Peb;

/// Header flags describing what the dump producer captured.
pub use format::header::DumpFlags;

/// Low-level binary parser for little-endian data.
pub use file::Parser;
