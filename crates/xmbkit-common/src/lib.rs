//! Common plumbing for the xmbkit crates.
//!
//! This crate provides the low-level pieces the codec is built on:
//!
//! - [`ByteCursor`] - positional reads of fixed-width integers and
//!   NUL-terminated strings at arbitrary offsets within a buffer
//! - [`ByteWriter`] - the inverse: endian-aware appends into a growable
//!   buffer, with alignment padding helpers
//! - [`Endian`] - the byte order applied to every multi-byte value

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::{ByteCursor, Endian};
pub use writer::ByteWriter;
