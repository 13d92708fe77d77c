//! Growable output buffer for encoding NRBF record streams.
//!
//! [`Writer`] is the encode-side counterpart of [`crate::Parser`]: an appending
//! byte buffer with strongly typed little-endian writes and the NRBF
//! variable-length string form. Sizes are never pre-declared; the buffer grows
//! incrementally as records are emitted.

use crate::{buffer::io::NrbfIO, Result};

/// An appending byte buffer with typed little-endian write operations.
///
/// # Examples
///
/// ```rust
/// use nrbf::Writer;
///
/// let mut writer = Writer::new();
/// writer.write_le::<u8>(0x06);
/// writer.write_le::<i32>(1);
/// writer.write_length_prefixed_string("hi")?;
/// assert_eq!(writer.into_bytes(), vec![0x06, 0x01, 0x00, 0x00, 0x00, 0x02, b'h', b'i']);
/// # Ok::<(), nrbf::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Create a new, empty [`Writer`].
    #[must_use]
    pub fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a value of type `T` in little-endian format.
    pub fn write_le<T: NrbfIO>(&mut self, value: T) {
        self.buf.extend_from_slice(value.to_le_bytes().as_ref());
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Append a 7-bit encoded unsigned integer.
    ///
    /// The inverse of [`crate::Parser::read_7bit_encoded_int`]: low 7 bits per
    /// byte, high bit as continuation flag, least-significant segment first.
    pub fn write_7bit_encoded_int(&mut self, mut value: u32) {
        loop {
            let mut byte = (value & 0x7F) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.write_le::<u8>(byte);
            if value == 0 {
                break;
            }
        }
    }

    /// Append an NRBF `LengthPrefixedString`: 7-bit encoded byte length, then
    /// the UTF-8 bytes.
    ///
    /// # Errors
    /// Returns [`crate::Error::Encode`] if the string is longer than `u32::MAX`
    /// bytes and therefore not representable in the length prefix.
    pub fn write_length_prefixed_string(&mut self, value: &str) -> Result<()> {
        let length = u32::try_from(value.len()).map_err(|_| {
            crate::Error::Encode(format!(
                "string of {} bytes exceeds the maximum encodable length",
                value.len()
            ))
        })?;
        self.write_7bit_encoded_int(length);
        self.write_bytes(value.as_bytes());
        Ok(())
    }

    /// Consume the writer and return the written bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Borrow the written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}
