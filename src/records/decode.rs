//! Per-record decoding, dispatched on the leading tag byte.
//!
//! Partial trust is never extended past the first invalid field: an unknown
//! tag, an undefined enum byte or a negative count aborts immediately, before
//! any allocation proportional to a declared length is made.

use crate::{
    buffer::parser::Parser,
    graph::{LibraryId, ObjectId, PrimitiveValue},
    Error, Result,
};

use super::{
    enums::{BinaryArrayType, BinaryType, PrimitiveType, RecordType},
    typeinfo::{AdditionalTypeInfo, ClassInfo, ClassTypeInfo, MemberTypeInfo},
    ArrayHeader, ArrayInfo, Record,
};

/// .NET caps array rank at 32; anything higher cannot come from a real stream.
const MAX_ARRAY_RANK: i32 = 32;

/// Decodes the record starting at the cursor position.
///
/// Consumes exactly the self-delimited part of the record: the tag byte and
/// the record body up to, but excluding, any member/element values that
/// follow class and array headers (those are driven by type context in
/// [`crate::decoder`]). The bytes consumed are observable as the cursor
/// advance.
///
/// # Errors
/// - [`crate::Error::MalformedStream`] for an unknown tag, an undefined enum
///   byte or an out-of-range count
/// - [`crate::Error::TruncatedStream`] if the body exceeds the remaining bytes
/// - [`crate::Error::UnsupportedRecordType`] for the recognized remoting
///   envelope tags `MethodCall` and `MethodReturn`
pub fn decode_record(parser: &mut Parser<'_>) -> Result<Record> {
    let tag = parser.read_le::<u8>()?;
    let Some(record_type) = RecordType::from_byte(tag) else {
        return Err(malformed_error!("unknown record tag 0x{:02X}", tag));
    };

    let record = match record_type {
        RecordType::SerializedStreamHeader => Record::SerializedStreamHeader {
            root_id: ObjectId::new(parser.read_le::<i32>()?),
            header_id: parser.read_le::<i32>()?,
            major_version: parser.read_le::<i32>()?,
            minor_version: parser.read_le::<i32>()?,
        },
        RecordType::ClassWithId => Record::ClassWithId {
            object_id: ObjectId::new(parser.read_le::<i32>()?),
            metadata_id: ObjectId::new(parser.read_le::<i32>()?),
        },
        RecordType::SystemClassWithMembers => Record::SystemClassWithMembers {
            class_info: read_class_info(parser)?,
        },
        RecordType::ClassWithMembers => {
            let class_info = read_class_info(parser)?;
            let library_id = LibraryId::new(parser.read_le::<i32>()?);
            Record::ClassWithMembers {
                class_info,
                library_id,
            }
        }
        RecordType::SystemClassWithMembersAndTypes => {
            let class_info = read_class_info(parser)?;
            let member_types = read_member_type_info(parser, class_info.member_names.len())?;
            Record::SystemClassWithMembersAndTypes {
                class_info,
                member_types,
            }
        }
        RecordType::ClassWithMembersAndTypes => {
            let class_info = read_class_info(parser)?;
            let member_types = read_member_type_info(parser, class_info.member_names.len())?;
            let library_id = LibraryId::new(parser.read_le::<i32>()?);
            Record::ClassWithMembersAndTypes {
                class_info,
                member_types,
                library_id,
            }
        }
        RecordType::BinaryObjectString => Record::BinaryObjectString {
            object_id: ObjectId::new(parser.read_le::<i32>()?),
            value: parser.read_length_prefixed_string()?,
        },
        RecordType::BinaryArray => Record::BinaryArray(read_array_header(parser)?),
        RecordType::MemberPrimitiveTyped => {
            let kind_byte = parser.read_le::<u8>()?;
            let kind = PrimitiveType::from_byte(kind_byte)
                .ok_or_else(|| malformed_error!("unknown primitive type: {}", kind_byte))?;
            Record::MemberPrimitiveTyped {
                value: PrimitiveValue::read(parser, kind)?,
            }
        }
        RecordType::MemberReference => {
            let id_ref = ObjectId::new(parser.read_le::<i32>()?);
            if id_ref.is_null() {
                return Err(malformed_error!("member reference to the null id 0"));
            }
            Record::MemberReference { id_ref }
        }
        RecordType::ObjectNull => Record::ObjectNull,
        RecordType::MessageEnd => Record::MessageEnd,
        RecordType::BinaryLibrary => Record::BinaryLibrary {
            library_id: LibraryId::new(parser.read_le::<i32>()?),
            name: parser.read_length_prefixed_string()?,
        },
        RecordType::ObjectNullMultiple256 => {
            let count = parser.read_le::<u8>()?;
            if count == 0 {
                return Err(malformed_error!("null run count must be positive"));
            }
            Record::ObjectNullMultiple256 { count }
        }
        RecordType::ObjectNullMultiple => {
            let count = parser.read_le::<i32>()?;
            if count <= 0 {
                return Err(malformed_error!(
                    "null run count must be positive, got {}",
                    count
                ));
            }
            Record::ObjectNullMultiple {
                count: count as u32,
            }
        }
        RecordType::ArraySinglePrimitive => {
            let array_info = read_array_info(parser)?;
            let kind_byte = parser.read_le::<u8>()?;
            let primitive_type = PrimitiveType::from_byte(kind_byte)
                .ok_or_else(|| malformed_error!("unknown primitive type: {}", kind_byte))?;
            Record::ArraySinglePrimitive {
                array_info,
                primitive_type,
            }
        }
        RecordType::ArraySingleObject => Record::ArraySingleObject {
            array_info: read_array_info(parser)?,
        },
        RecordType::ArraySingleString => Record::ArraySingleString {
            array_info: read_array_info(parser)?,
        },
        RecordType::MethodCall | RecordType::MethodReturn => {
            return Err(Error::UnsupportedRecordType(tag));
        }
    };

    Ok(record)
}

/// Reads object id, class name and the member name list of a class record.
fn read_class_info(parser: &mut Parser<'_>) -> Result<ClassInfo> {
    let object_id = ObjectId::new(parser.read_le::<i32>()?);
    let name = parser.read_length_prefixed_string()?;

    let member_count = parser.read_le::<i32>()?;
    if member_count < 0 {
        return Err(malformed_error!(
            "member count must be non-negative, got {}",
            member_count
        ));
    }

    // Each member name costs at least its one-byte length prefix, so the count
    // cannot honestly exceed the remaining input.
    let count = member_count as usize;
    parser.ensure_remaining(count)?;

    let mut member_names = Vec::with_capacity(count);
    for _ in 0..count {
        member_names.push(parser.read_length_prefixed_string()?);
    }

    Ok(ClassInfo {
        object_id,
        name,
        member_names,
    })
}

/// Reads the per-member type tags: all `BinaryType` bytes first, then each
/// member's additional info in order.
fn read_member_type_info(parser: &mut Parser<'_>, member_count: usize) -> Result<MemberTypeInfo> {
    parser.ensure_remaining(member_count)?;

    let mut binary_types = Vec::with_capacity(member_count);
    for _ in 0..member_count {
        let byte = parser.read_le::<u8>()?;
        let binary_type = BinaryType::from_byte(byte)
            .ok_or_else(|| malformed_error!("unknown binary type: {}", byte))?;
        binary_types.push(binary_type);
    }

    let mut entries = Vec::with_capacity(member_count);
    for binary_type in binary_types {
        let info = read_additional_type_info(parser, binary_type)?;
        entries.push((binary_type, info));
    }

    Ok(MemberTypeInfo { entries })
}

/// Reads the additional detail a [`BinaryType`] tag carries.
pub(crate) fn read_additional_type_info(
    parser: &mut Parser<'_>,
    binary_type: BinaryType,
) -> Result<AdditionalTypeInfo> {
    let info = match binary_type {
        BinaryType::Primitive | BinaryType::PrimitiveArray => {
            let byte = parser.read_le::<u8>()?;
            let kind = PrimitiveType::from_byte(byte)
                .ok_or_else(|| malformed_error!("unknown primitive type: {}", byte))?;
            AdditionalTypeInfo::Primitive(kind)
        }
        BinaryType::SystemClass => {
            AdditionalTypeInfo::SystemClass(parser.read_length_prefixed_string()?)
        }
        BinaryType::Class => AdditionalTypeInfo::Class(ClassTypeInfo {
            name: parser.read_length_prefixed_string()?,
            library_id: LibraryId::new(parser.read_le::<i32>()?),
        }),
        BinaryType::String
        | BinaryType::Object
        | BinaryType::ObjectArray
        | BinaryType::StringArray => AdditionalTypeInfo::None,
    };
    Ok(info)
}

/// Reads the object id and length of a single-dimensional array record.
fn read_array_info(parser: &mut Parser<'_>) -> Result<ArrayInfo> {
    let object_id = ObjectId::new(parser.read_le::<i32>()?);
    let length = parser.read_le::<i32>()?;
    if length < 0 {
        return Err(malformed_error!(
            "array length must be non-negative, got {}",
            length
        ));
    }
    Ok(ArrayInfo {
        object_id,
        length: length as u32,
    })
}

/// Reads the header of the general `BinaryArray` form.
fn read_array_header(parser: &mut Parser<'_>) -> Result<ArrayHeader> {
    let object_id = ObjectId::new(parser.read_le::<i32>()?);

    let type_byte = parser.read_le::<u8>()?;
    let array_type = BinaryArrayType::from_byte(type_byte)
        .ok_or_else(|| malformed_error!("unknown binary array type: {}", type_byte))?;

    let rank = parser.read_le::<i32>()?;
    if rank < 1 {
        return Err(malformed_error!("array rank must be positive, got {}", rank));
    }
    if rank > MAX_ARRAY_RANK {
        return Err(malformed_error!(
            "array rank {} exceeds the maximum of {}",
            rank,
            MAX_ARRAY_RANK
        ));
    }
    let rank = rank as usize;

    let mut extents = Vec::with_capacity(rank);
    for _ in 0..rank {
        let extent = parser.read_le::<i32>()?;
        if extent < 0 {
            return Err(malformed_error!(
                "array extent must be non-negative, got {}",
                extent
            ));
        }
        extents.push(extent as u32);
    }

    let mut lower_bounds = Vec::new();
    if array_type.has_lower_bounds() {
        lower_bounds.reserve(rank);
        for _ in 0..rank {
            lower_bounds.push(parser.read_le::<i32>()?);
        }
    }

    let element_byte = parser.read_le::<u8>()?;
    let element_type = BinaryType::from_byte(element_byte)
        .ok_or_else(|| malformed_error!("unknown binary type: {}", element_byte))?;
    let element_info = read_additional_type_info(parser, element_type)?;

    Ok(ArrayHeader {
        object_id,
        array_type,
        extents,
        lower_bounds,
        element_type,
        element_info,
    })
}
