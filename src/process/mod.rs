//! Recovery of process state from captured memory.

pub mod peb;

pub use peb::Peb;
