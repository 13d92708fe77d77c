//! Closed byte-valued enumerations of the NRBF wire format.
//!
//! Every enum here is a closed set: a byte outside the defined values is a
//! fatal [`crate::Error::MalformedStream`] at the decode site, never silently
//! skipped or clamped. The numeric values are fixed by MS-NRBF and must match
//! bit-for-bit for interoperability.

use strum::{EnumCount, EnumIter};

/// Record tag byte, the leading byte of every record in the stream.
///
/// `MethodCall` and `MethodReturn` belong to the MS-NRTP remoting envelope;
/// they are recognized here so that streams containing them fail with the
/// precise [`crate::Error::UnsupportedRecordType`] instead of being
/// misreported as malformed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
pub enum RecordType {
    /// Stream header carrying root id and format version (0x00)
    SerializedStreamHeader = 0x00,
    /// Class instance reusing a previously defined class descriptor (0x01)
    ClassWithId = 0x01,
    /// System class with member names but no member types (0x02)
    SystemClassWithMembers = 0x02,
    /// Library-qualified class with member names but no member types (0x03)
    ClassWithMembers = 0x03,
    /// System class with member names and member types (0x04)
    SystemClassWithMembersAndTypes = 0x04,
    /// Library-qualified class with member names and member types (0x05)
    ClassWithMembersAndTypes = 0x05,
    /// Id-bearing string object (0x06)
    BinaryObjectString = 0x06,
    /// General array form: multi-dimensional, jagged, offset lower bounds (0x07)
    BinaryArray = 0x07,
    /// Inline primitive value in member position (0x08)
    MemberPrimitiveTyped = 0x08,
    /// Reference to another object id (0x09)
    MemberReference = 0x09,
    /// Single null value (0x0A)
    ObjectNull = 0x0A,
    /// Stream terminator (0x0B)
    MessageEnd = 0x0B,
    /// Library id to assembly name mapping (0x0C)
    BinaryLibrary = 0x0C,
    /// Run of up to 255 consecutive null values (0x0D)
    ObjectNullMultiple256 = 0x0D,
    /// Run of consecutive null values with a 32-bit count (0x0E)
    ObjectNullMultiple = 0x0E,
    /// Single-dimensional array of untagged primitive values (0x0F)
    ArraySinglePrimitive = 0x0F,
    /// Single-dimensional array of object slots (0x10)
    ArraySingleObject = 0x10,
    /// Single-dimensional array of string slots (0x11)
    ArraySingleString = 0x11,
    /// Remoting method call envelope, out of scope (0x15)
    MethodCall = 0x15,
    /// Remoting method return envelope, out of scope (0x16)
    MethodReturn = 0x16,
}

impl RecordType {
    /// Decode a record tag byte. Returns `None` for bytes outside the defined set.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(RecordType::SerializedStreamHeader),
            0x01 => Some(RecordType::ClassWithId),
            0x02 => Some(RecordType::SystemClassWithMembers),
            0x03 => Some(RecordType::ClassWithMembers),
            0x04 => Some(RecordType::SystemClassWithMembersAndTypes),
            0x05 => Some(RecordType::ClassWithMembersAndTypes),
            0x06 => Some(RecordType::BinaryObjectString),
            0x07 => Some(RecordType::BinaryArray),
            0x08 => Some(RecordType::MemberPrimitiveTyped),
            0x09 => Some(RecordType::MemberReference),
            0x0A => Some(RecordType::ObjectNull),
            0x0B => Some(RecordType::MessageEnd),
            0x0C => Some(RecordType::BinaryLibrary),
            0x0D => Some(RecordType::ObjectNullMultiple256),
            0x0E => Some(RecordType::ObjectNullMultiple),
            0x0F => Some(RecordType::ArraySinglePrimitive),
            0x10 => Some(RecordType::ArraySingleObject),
            0x11 => Some(RecordType::ArraySingleString),
            0x15 => Some(RecordType::MethodCall),
            0x16 => Some(RecordType::MethodReturn),
            _ => None,
        }
    }

    /// The wire tag byte for this record type.
    #[must_use]
    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// Value category of a class member or array element.
///
/// Determines how the corresponding value is encoded: `Primitive` values are
/// inlined with no tag, every other category consumes a record in the stream
/// (a reference, a null record or an inline id-bearing record).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
pub enum BinaryType {
    /// Untagged inline primitive value (0)
    Primitive = 0,
    /// String object slot (1)
    String = 1,
    /// Arbitrary object slot (2)
    Object = 2,
    /// Slot typed by a system class name (3)
    SystemClass = 3,
    /// Slot typed by a library-qualified class (4)
    Class = 4,
    /// Slot holding an object array (5)
    ObjectArray = 5,
    /// Slot holding a string array (6)
    StringArray = 6,
    /// Slot holding a primitive array (7)
    PrimitiveArray = 7,
}

impl BinaryType {
    /// Decode a binary type byte. Returns `None` for bytes outside the defined set.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(BinaryType::Primitive),
            1 => Some(BinaryType::String),
            2 => Some(BinaryType::Object),
            3 => Some(BinaryType::SystemClass),
            4 => Some(BinaryType::Class),
            5 => Some(BinaryType::ObjectArray),
            6 => Some(BinaryType::StringArray),
            7 => Some(BinaryType::PrimitiveArray),
            _ => None,
        }
    }

    /// The wire byte for this binary type.
    #[must_use]
    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// Kind of an inline primitive value.
///
/// The numbering has a hole at 4 (reserved by MS-NRBF) and includes the two
/// pseudo-kinds `Null` and `String` that only appear in typed-member and
/// primitive-array contexts.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
pub enum PrimitiveType {
    /// Single byte, zero is false (1)
    Boolean = 1,
    /// Unsigned 8-bit integer (2)
    Byte = 2,
    /// UTF-16 code unit (3)
    Char = 3,
    /// Decimal carried as its string form (5)
    Decimal = 5,
    /// IEEE-754 binary64 (6)
    Double = 6,
    /// Signed 16-bit integer (7)
    Int16 = 7,
    /// Signed 32-bit integer (8)
    Int32 = 8,
    /// Signed 64-bit integer (9)
    Int64 = 9,
    /// Signed 8-bit integer (10)
    SByte = 10,
    /// IEEE-754 binary32 (11)
    Single = 11,
    /// Duration in 100ns ticks (12)
    TimeSpan = 12,
    /// Point in time, raw `DateTime.ToBinary` bits (13)
    DateTime = 13,
    /// Unsigned 16-bit integer (14)
    UInt16 = 14,
    /// Unsigned 32-bit integer (15)
    UInt32 = 15,
    /// Unsigned 64-bit integer (16)
    UInt64 = 16,
    /// Zero-width null pseudo-kind (17)
    Null = 17,
    /// Length-prefixed string pseudo-kind (18)
    String = 18,
}

impl PrimitiveType {
    /// Decode a primitive type byte. Returns `None` for bytes outside the defined set.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(PrimitiveType::Boolean),
            2 => Some(PrimitiveType::Byte),
            3 => Some(PrimitiveType::Char),
            5 => Some(PrimitiveType::Decimal),
            6 => Some(PrimitiveType::Double),
            7 => Some(PrimitiveType::Int16),
            8 => Some(PrimitiveType::Int32),
            9 => Some(PrimitiveType::Int64),
            10 => Some(PrimitiveType::SByte),
            11 => Some(PrimitiveType::Single),
            12 => Some(PrimitiveType::TimeSpan),
            13 => Some(PrimitiveType::DateTime),
            14 => Some(PrimitiveType::UInt16),
            15 => Some(PrimitiveType::UInt32),
            16 => Some(PrimitiveType::UInt64),
            17 => Some(PrimitiveType::Null),
            18 => Some(PrimitiveType::String),
            _ => None,
        }
    }

    /// The wire byte for this primitive type.
    #[must_use]
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Encoded width in bytes for fixed-width kinds.
    ///
    /// Returns `None` for `Decimal` and `String`, which are length-prefixed.
    #[must_use]
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            PrimitiveType::Boolean | PrimitiveType::Byte | PrimitiveType::SByte => Some(1),
            PrimitiveType::Char | PrimitiveType::Int16 | PrimitiveType::UInt16 => Some(2),
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Single => Some(4),
            PrimitiveType::Int64
            | PrimitiveType::UInt64
            | PrimitiveType::Double
            | PrimitiveType::TimeSpan
            | PrimitiveType::DateTime => Some(8),
            PrimitiveType::Null => Some(0),
            PrimitiveType::Decimal | PrimitiveType::String => None,
        }
    }
}

/// Shape of a `BinaryArray` record.
///
/// The `*Offset` variants carry one lower bound per dimension in addition to
/// the extents.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
pub enum BinaryArrayType {
    /// Single-dimensional, zero lower bound (0)
    Single = 0,
    /// Array of arrays (1)
    Jagged = 1,
    /// Multi-dimensional, row-major (2)
    Rectangular = 2,
    /// Single-dimensional with explicit lower bound (3)
    SingleOffset = 3,
    /// Jagged with explicit lower bounds (4)
    JaggedOffset = 4,
    /// Multi-dimensional with explicit lower bounds (5)
    RectangularOffset = 5,
}

impl BinaryArrayType {
    /// Decode an array shape byte. Returns `None` for bytes outside the defined set.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(BinaryArrayType::Single),
            1 => Some(BinaryArrayType::Jagged),
            2 => Some(BinaryArrayType::Rectangular),
            3 => Some(BinaryArrayType::SingleOffset),
            4 => Some(BinaryArrayType::JaggedOffset),
            5 => Some(BinaryArrayType::RectangularOffset),
            _ => None,
        }
    }

    /// The wire byte for this array shape.
    #[must_use]
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Whether this shape carries explicit per-dimension lower bounds.
    #[must_use]
    pub fn has_lower_bounds(self) -> bool {
        matches!(
            self,
            BinaryArrayType::SingleOffset
                | BinaryArrayType::JaggedOffset
                | BinaryArrayType::RectangularOffset
        )
    }
}
