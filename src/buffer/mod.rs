//! Low-level byte order and safe reading/writing utilities for NRBF streams.
//!
//! This module is the foundational layer for all binary data access in the crate.
//! It provides bounds-checked, little-endian primitive access over byte buffers,
//! plus the two variable-length forms NRBF builds everything else on: the
//! 7-bit-segment length prefix and the length-prefixed UTF-8 string.
//!
//! # Key Components
//!
//! - [`crate::buffer::io::NrbfIO`] - trait unifying little-endian conversion for all
//!   primitive types the wire format carries
//! - [`crate::buffer::parser::Parser`] - cursor-based reader over an input slice
//! - [`crate::buffer::writer::Writer`] - growable output buffer for encoding
//!
//! # Error Handling
//!
//! Every read validates that the requested length does not exceed the remaining
//! buffer before touching the data; violations fail with
//! [`crate::Error::TruncatedStream`]. Invalid UTF-8 and over-long length prefixes
//! fail with [`crate::Error::MalformedStream`].

pub(crate) mod io;
pub(crate) mod parser;
pub(crate) mod writer;

pub use parser::Parser;
pub use writer::Writer;
