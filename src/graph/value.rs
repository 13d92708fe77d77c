//! Inline primitive values and their wire forms.
//!
//! NRBF inlines primitive member values with no per-value tag; the declared
//! member type alone determines the width and interpretation of the bytes.
//! [`PrimitiveValue`] pairs each kind with its decoded payload and owns the
//! read/write logic for all of them.
//!
//! Temporal and decimal kinds are kept inert rather than interpreted:
//! `DateTime` keeps the raw `ToBinary` bits (ticks plus kind), `TimeSpan`
//! keeps ticks, `Decimal` keeps the string form the stream carried. Consumers
//! that need calendar math can convert without this crate taking a position
//! on time zones.

use crate::{buffer::parser::Parser, buffer::writer::Writer, records::PrimitiveType, Error, Result};

/// A decoded primitive value, tagged by its [`PrimitiveType`] kind.
#[derive(Clone, PartialEq, Debug)]
pub enum PrimitiveValue {
    /// Boolean, one byte on the wire, zero is false
    Boolean(bool),
    /// Unsigned 8-bit integer
    Byte(u8),
    /// Signed 8-bit integer
    SByte(i8),
    /// UTF-16 code unit, stored as the character it encodes
    Char(char),
    /// Signed 16-bit integer
    Int16(i16),
    /// Unsigned 16-bit integer
    UInt16(u16),
    /// Signed 32-bit integer
    Int32(i32),
    /// Unsigned 32-bit integer
    UInt32(u32),
    /// Signed 64-bit integer
    Int64(i64),
    /// Unsigned 64-bit integer
    UInt64(u64),
    /// IEEE-754 binary32
    Single(f32),
    /// IEEE-754 binary64
    Double(f64),
    /// Decimal in its length-prefixed string form, kept verbatim
    Decimal(String),
    /// Duration in 100ns ticks
    TimeSpan(i64),
    /// Raw `DateTime.ToBinary` value: ticks in bits 0-61, kind in bits 62-63
    DateTime(i64),
    /// Inline length-prefixed string value (distinct from a referenced string object)
    String(String),
    /// Zero-width null value
    Null,
}

impl PrimitiveValue {
    /// The wire kind of this value.
    #[must_use]
    pub fn kind(&self) -> PrimitiveType {
        match self {
            PrimitiveValue::Boolean(_) => PrimitiveType::Boolean,
            PrimitiveValue::Byte(_) => PrimitiveType::Byte,
            PrimitiveValue::SByte(_) => PrimitiveType::SByte,
            PrimitiveValue::Char(_) => PrimitiveType::Char,
            PrimitiveValue::Int16(_) => PrimitiveType::Int16,
            PrimitiveValue::UInt16(_) => PrimitiveType::UInt16,
            PrimitiveValue::Int32(_) => PrimitiveType::Int32,
            PrimitiveValue::UInt32(_) => PrimitiveType::UInt32,
            PrimitiveValue::Int64(_) => PrimitiveType::Int64,
            PrimitiveValue::UInt64(_) => PrimitiveType::UInt64,
            PrimitiveValue::Single(_) => PrimitiveType::Single,
            PrimitiveValue::Double(_) => PrimitiveType::Double,
            PrimitiveValue::Decimal(_) => PrimitiveType::Decimal,
            PrimitiveValue::TimeSpan(_) => PrimitiveType::TimeSpan,
            PrimitiveValue::DateTime(_) => PrimitiveType::DateTime,
            PrimitiveValue::String(_) => PrimitiveType::String,
            PrimitiveValue::Null => PrimitiveType::Null,
        }
    }

    /// Reads one untagged value of the given kind from the stream.
    ///
    /// # Errors
    /// Returns [`crate::Error::TruncatedStream`] if the value's width exceeds the
    /// remaining bytes and [`crate::Error::MalformedStream`] for payloads that are
    /// invalid for their kind (unpaired surrogate `Char`, unknown `DateTime` kind
    /// bits, invalid UTF-8 in `Decimal`/`String`).
    pub fn read(parser: &mut Parser<'_>, kind: PrimitiveType) -> Result<Self> {
        let value = match kind {
            PrimitiveType::Boolean => PrimitiveValue::Boolean(parser.read_le::<u8>()? != 0),
            PrimitiveType::Byte => PrimitiveValue::Byte(parser.read_le::<u8>()?),
            PrimitiveType::SByte => PrimitiveValue::SByte(parser.read_le::<i8>()?),
            PrimitiveType::Char => {
                let code_unit = parser.read_le::<u16>()?;
                let c = char::from_u32(u32::from(code_unit)).ok_or_else(|| {
                    malformed_error!("Char value 0x{:04X} is an unpaired surrogate", code_unit)
                })?;
                PrimitiveValue::Char(c)
            }
            PrimitiveType::Int16 => PrimitiveValue::Int16(parser.read_le::<i16>()?),
            PrimitiveType::UInt16 => PrimitiveValue::UInt16(parser.read_le::<u16>()?),
            PrimitiveType::Int32 => PrimitiveValue::Int32(parser.read_le::<i32>()?),
            PrimitiveType::UInt32 => PrimitiveValue::UInt32(parser.read_le::<u32>()?),
            PrimitiveType::Int64 => PrimitiveValue::Int64(parser.read_le::<i64>()?),
            PrimitiveType::UInt64 => PrimitiveValue::UInt64(parser.read_le::<u64>()?),
            PrimitiveType::Single => PrimitiveValue::Single(parser.read_le::<f32>()?),
            PrimitiveType::Double => PrimitiveValue::Double(parser.read_le::<f64>()?),
            PrimitiveType::Decimal => {
                PrimitiveValue::Decimal(parser.read_length_prefixed_string()?)
            }
            PrimitiveType::TimeSpan => PrimitiveValue::TimeSpan(parser.read_le::<i64>()?),
            PrimitiveType::DateTime => {
                let raw = parser.read_le::<u64>()?;
                // Kind lives in the top two bits: 0 unspecified, 1 UTC, 2 local.
                if raw >> 62 == 3 {
                    return Err(malformed_error!("unknown DateTime kind: 3"));
                }
                #[allow(clippy::cast_possible_wrap)]
                let raw_bits = raw as i64;
                PrimitiveValue::DateTime(raw_bits)
            }
            PrimitiveType::String => PrimitiveValue::String(parser.read_length_prefixed_string()?),
            PrimitiveType::Null => PrimitiveValue::Null,
        };
        Ok(value)
    }

    /// Writes this value in its untagged wire form.
    ///
    /// # Errors
    /// Returns [`crate::Error::Encode`] for values with no wire representation
    /// (a `Char` outside the Basic Multilingual Plane).
    pub fn write(&self, writer: &mut Writer) -> Result<()> {
        match self {
            PrimitiveValue::Boolean(v) => writer.write_le::<u8>(u8::from(*v)),
            PrimitiveValue::Byte(v) => writer.write_le::<u8>(*v),
            PrimitiveValue::SByte(v) => writer.write_le::<i8>(*v),
            PrimitiveValue::Char(c) => {
                let code_point = u32::from(*c);
                let code_unit = u16::try_from(code_point).map_err(|_| {
                    Error::Encode(format!(
                        "Char U+{:04X} is outside the Basic Multilingual Plane",
                        code_point
                    ))
                })?;
                writer.write_le::<u16>(code_unit);
            }
            PrimitiveValue::Int16(v) => writer.write_le::<i16>(*v),
            PrimitiveValue::UInt16(v) => writer.write_le::<u16>(*v),
            PrimitiveValue::Int32(v) => writer.write_le::<i32>(*v),
            PrimitiveValue::UInt32(v) => writer.write_le::<u32>(*v),
            PrimitiveValue::Int64(v) => writer.write_le::<i64>(*v),
            PrimitiveValue::UInt64(v) => writer.write_le::<u64>(*v),
            PrimitiveValue::Single(v) => writer.write_le::<f32>(*v),
            PrimitiveValue::Double(v) => writer.write_le::<f64>(*v),
            PrimitiveValue::Decimal(v) => writer.write_length_prefixed_string(v)?,
            PrimitiveValue::TimeSpan(v) => writer.write_le::<i64>(*v),
            #[allow(clippy::cast_sign_loss)]
            PrimitiveValue::DateTime(v) => writer.write_le::<u64>(*v as u64),
            PrimitiveValue::String(v) => writer.write_length_prefixed_string(v)?,
            PrimitiveValue::Null => {}
        }
        Ok(())
    }
}
