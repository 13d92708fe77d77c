//! Wire-level record definitions and the per-record codec.
//!
//! Every unit of an NRBF stream is a record: a one-byte tag followed by a
//! tag-specific body. [`Record`] is the closed tagged union over all record
//! kinds; [`decode_record`] and [`encode_record`] are the structural inverses
//! converting between records and bytes.
//!
//! # Boundaries
//!
//! A `Record` covers exactly the self-delimited part of a wire record. For
//! class and array records that is the header metadata (ids, names, type
//! tags, extents); the member/element *values* that follow are driven by type
//! context and consumed by [`crate::decoder`], which is also where id
//! bookkeeping lives. This keeps the codec a pure byte transformation.
//!
//! # Trust model
//!
//! [`decode_record`] validates every embedded enum byte against its defined
//! value set and every count against its sign and range before use; the first
//! invalid field aborts with [`crate::Error::MalformedStream`]. The recognized
//! but out-of-scope remoting envelope tags fail with
//! [`crate::Error::UnsupportedRecordType`]. On the encode side an out-of-range
//! field is a reported caller error, never silently clamped.

pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod enums;
pub(crate) mod typeinfo;

pub use decode::decode_record;
pub use encode::encode_record;
pub use enums::{BinaryArrayType, BinaryType, PrimitiveType, RecordType};
pub use typeinfo::{
    AdditionalTypeInfo, ClassInfo, ClassTypeInfo, MemberDescriptor, MemberTypeInfo, TypeDescriptor,
};

use crate::graph::{LibraryId, ObjectId, PrimitiveValue};

/// Object id and element count of a single-dimensional array record.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ArrayInfo {
    /// Object id the array record defines
    pub object_id: ObjectId,
    /// Number of elements
    pub length: u32,
}

/// Header of the general `BinaryArray` record form.
#[derive(Clone, PartialEq, Debug)]
pub struct ArrayHeader {
    /// Object id the array record defines
    pub object_id: ObjectId,
    /// Array shape
    pub array_type: BinaryArrayType,
    /// Extent of each dimension
    pub extents: Vec<u32>,
    /// Lower bound of each dimension; empty unless the shape is an offset variant
    pub lower_bounds: Vec<i32>,
    /// Value category of the elements
    pub element_type: BinaryType,
    /// Additional element type detail
    pub element_info: AdditionalTypeInfo,
}

impl ArrayHeader {
    /// Total number of element slots (product of the extents).
    #[must_use]
    pub fn slot_count(&self) -> u64 {
        self.extents.iter().map(|e| u64::from(*e)).product()
    }
}

/// One NRBF record: a closed tagged union over all wire record kinds.
///
/// Unknown tags are rejected at decode time; the set can therefore be matched
/// exhaustively without a catch-all arm.
#[derive(Clone, PartialEq, Debug)]
pub enum Record {
    /// Stream header: root object id, header id and format version (must be 1.0)
    SerializedStreamHeader {
        /// Id of the root object of the graph
        root_id: ObjectId,
        /// Header id, conventionally -1
        header_id: i32,
        /// Major format version, must be 1
        major_version: i32,
        /// Minor format version, must be 0
        minor_version: i32,
    },
    /// Class instance reusing the descriptor cached at `metadata_id`
    ClassWithId {
        /// Object id this instance defines
        object_id: ObjectId,
        /// Object id of the class record that introduced the descriptor
        metadata_id: ObjectId,
    },
    /// System class with member names only
    SystemClassWithMembers {
        /// Class metadata
        class_info: ClassInfo,
    },
    /// Library-qualified class with member names only
    ClassWithMembers {
        /// Class metadata
        class_info: ClassInfo,
        /// Owning library
        library_id: LibraryId,
    },
    /// System class with member names and types
    SystemClassWithMembersAndTypes {
        /// Class metadata
        class_info: ClassInfo,
        /// Per-member type tags
        member_types: MemberTypeInfo,
    },
    /// Library-qualified class with member names and types
    ClassWithMembersAndTypes {
        /// Class metadata
        class_info: ClassInfo,
        /// Per-member type tags
        member_types: MemberTypeInfo,
        /// Owning library
        library_id: LibraryId,
    },
    /// Id-bearing string object
    BinaryObjectString {
        /// Object id the string defines
        object_id: ObjectId,
        /// String value
        value: String,
    },
    /// General array header; elements follow in row-major order
    BinaryArray(ArrayHeader),
    /// Inline primitive value in member position
    MemberPrimitiveTyped {
        /// The value, carrying its own kind
        value: PrimitiveValue,
    },
    /// Reference to another object id, possibly not yet defined
    MemberReference {
        /// Target object id
        id_ref: ObjectId,
    },
    /// Single null value
    ObjectNull,
    /// Stream terminator
    MessageEnd,
    /// Library id to assembly-qualified name mapping
    BinaryLibrary {
        /// Library id
        library_id: LibraryId,
        /// Assembly-qualified name
        name: String,
    },
    /// Run of up to 255 consecutive nulls
    ObjectNullMultiple256 {
        /// Number of null slots this record covers
        count: u8,
    },
    /// Run of consecutive nulls with a 32-bit count
    ObjectNullMultiple {
        /// Number of null slots this record covers
        count: u32,
    },
    /// Single-dimensional primitive array; raw values follow
    ArraySinglePrimitive {
        /// Object id and length
        array_info: ArrayInfo,
        /// Element kind
        primitive_type: PrimitiveType,
    },
    /// Single-dimensional object array; element records follow
    ArraySingleObject {
        /// Object id and length
        array_info: ArrayInfo,
    },
    /// Single-dimensional string array; element records follow
    ArraySingleString {
        /// Object id and length
        array_info: ArrayInfo,
    },
}

impl Record {
    /// The wire tag of this record.
    #[must_use]
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::SerializedStreamHeader { .. } => RecordType::SerializedStreamHeader,
            Record::ClassWithId { .. } => RecordType::ClassWithId,
            Record::SystemClassWithMembers { .. } => RecordType::SystemClassWithMembers,
            Record::ClassWithMembers { .. } => RecordType::ClassWithMembers,
            Record::SystemClassWithMembersAndTypes { .. } => {
                RecordType::SystemClassWithMembersAndTypes
            }
            Record::ClassWithMembersAndTypes { .. } => RecordType::ClassWithMembersAndTypes,
            Record::BinaryObjectString { .. } => RecordType::BinaryObjectString,
            Record::BinaryArray(_) => RecordType::BinaryArray,
            Record::MemberPrimitiveTyped { .. } => RecordType::MemberPrimitiveTyped,
            Record::MemberReference { .. } => RecordType::MemberReference,
            Record::ObjectNull => RecordType::ObjectNull,
            Record::MessageEnd => RecordType::MessageEnd,
            Record::BinaryLibrary { .. } => RecordType::BinaryLibrary,
            Record::ObjectNullMultiple256 { .. } => RecordType::ObjectNullMultiple256,
            Record::ObjectNullMultiple { .. } => RecordType::ObjectNullMultiple,
            Record::ArraySinglePrimitive { .. } => RecordType::ArraySinglePrimitive,
            Record::ArraySingleObject { .. } => RecordType::ArraySingleObject,
            Record::ArraySingleString { .. } => RecordType::ArraySingleString,
        }
    }
}
