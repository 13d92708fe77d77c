//! Per-record encoding, the structural inverse of [`super::decode`].
//!
//! Field values a caller could get wrong (counts past `i32::MAX`, mismatched
//! type-info arity, lower bounds on a non-offset shape) are reported as
//! [`crate::Error::Encode`] rather than silently clamped.

use crate::{buffer::writer::Writer, Error, Result};

use super::{
    enums::BinaryType,
    typeinfo::{AdditionalTypeInfo, ClassInfo, MemberTypeInfo},
    ArrayHeader, ArrayInfo, Record,
};

/// Encodes one record, appending its tag byte and body to the writer.
///
/// # Errors
/// Returns [`crate::Error::Encode`] for out-of-range caller fields.
pub fn encode_record(record: &Record, writer: &mut Writer) -> Result<()> {
    writer.write_le::<u8>(record.record_type().byte());

    match record {
        Record::SerializedStreamHeader {
            root_id,
            header_id,
            major_version,
            minor_version,
        } => {
            writer.write_le::<i32>(root_id.value());
            writer.write_le::<i32>(*header_id);
            writer.write_le::<i32>(*major_version);
            writer.write_le::<i32>(*minor_version);
        }
        Record::ClassWithId {
            object_id,
            metadata_id,
        } => {
            writer.write_le::<i32>(object_id.value());
            writer.write_le::<i32>(metadata_id.value());
        }
        Record::SystemClassWithMembers { class_info } => {
            write_class_info(writer, class_info)?;
        }
        Record::ClassWithMembers {
            class_info,
            library_id,
        } => {
            write_class_info(writer, class_info)?;
            writer.write_le::<i32>(library_id.value());
        }
        Record::SystemClassWithMembersAndTypes {
            class_info,
            member_types,
        } => {
            write_class_info(writer, class_info)?;
            write_member_type_info(writer, class_info, member_types)?;
        }
        Record::ClassWithMembersAndTypes {
            class_info,
            member_types,
            library_id,
        } => {
            write_class_info(writer, class_info)?;
            write_member_type_info(writer, class_info, member_types)?;
            writer.write_le::<i32>(library_id.value());
        }
        Record::BinaryObjectString { object_id, value } => {
            writer.write_le::<i32>(object_id.value());
            writer.write_length_prefixed_string(value)?;
        }
        Record::BinaryArray(header) => {
            write_array_header(writer, header)?;
        }
        Record::MemberPrimitiveTyped { value } => {
            writer.write_le::<u8>(value.kind().byte());
            value.write(writer)?;
        }
        Record::MemberReference { id_ref } => {
            if id_ref.is_null() {
                return Err(Error::Encode(
                    "member reference to the null id 0".to_string(),
                ));
            }
            writer.write_le::<i32>(id_ref.value());
        }
        Record::ObjectNull | Record::MessageEnd => {}
        Record::BinaryLibrary { library_id, name } => {
            writer.write_le::<i32>(library_id.value());
            writer.write_length_prefixed_string(name)?;
        }
        Record::ObjectNullMultiple256 { count } => {
            if *count == 0 {
                return Err(Error::Encode("null run count must be positive".to_string()));
            }
            writer.write_le::<u8>(*count);
        }
        Record::ObjectNullMultiple { count } => {
            let count = wire_i32(*count as usize, "null run count")?;
            if count == 0 {
                return Err(Error::Encode("null run count must be positive".to_string()));
            }
            writer.write_le::<i32>(count);
        }
        Record::ArraySinglePrimitive {
            array_info,
            primitive_type,
        } => {
            write_array_info(writer, array_info)?;
            writer.write_le::<u8>(primitive_type.byte());
        }
        Record::ArraySingleObject { array_info } | Record::ArraySingleString { array_info } => {
            write_array_info(writer, array_info)?;
        }
    }

    Ok(())
}

fn wire_i32(value: usize, what: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| Error::Encode(format!("{} {} exceeds the i32 wire range", what, value)))
}

fn write_class_info(writer: &mut Writer, class_info: &ClassInfo) -> Result<()> {
    writer.write_le::<i32>(class_info.object_id.value());
    writer.write_length_prefixed_string(&class_info.name)?;
    writer.write_le::<i32>(wire_i32(class_info.member_names.len(), "member count")?);
    for name in &class_info.member_names {
        writer.write_length_prefixed_string(name)?;
    }
    Ok(())
}

fn write_member_type_info(
    writer: &mut Writer,
    class_info: &ClassInfo,
    member_types: &MemberTypeInfo,
) -> Result<()> {
    if member_types.entries.len() != class_info.member_names.len() {
        return Err(Error::Encode(format!(
            "class '{}' declares {} members but carries {} member type entries",
            class_info.name,
            class_info.member_names.len(),
            member_types.entries.len()
        )));
    }
    for (binary_type, _) in &member_types.entries {
        writer.write_le::<u8>(binary_type.byte());
    }
    for (binary_type, info) in &member_types.entries {
        write_additional_type_info(writer, *binary_type, info)?;
    }
    Ok(())
}

pub(crate) fn write_additional_type_info(
    writer: &mut Writer,
    binary_type: BinaryType,
    info: &AdditionalTypeInfo,
) -> Result<()> {
    match (binary_type, info) {
        (
            BinaryType::Primitive | BinaryType::PrimitiveArray,
            AdditionalTypeInfo::Primitive(kind),
        ) => {
            writer.write_le::<u8>(kind.byte());
        }
        (BinaryType::SystemClass, AdditionalTypeInfo::SystemClass(name)) => {
            writer.write_length_prefixed_string(name)?;
        }
        (BinaryType::Class, AdditionalTypeInfo::Class(class_type)) => {
            writer.write_length_prefixed_string(&class_type.name)?;
            writer.write_le::<i32>(class_type.library_id.value());
        }
        (
            BinaryType::String
            | BinaryType::Object
            | BinaryType::ObjectArray
            | BinaryType::StringArray,
            AdditionalTypeInfo::None,
        ) => {}
        (binary_type, _) => {
            return Err(Error::Encode(format!(
                "additional type info does not match binary type {:?}",
                binary_type
            )));
        }
    }
    Ok(())
}

fn write_array_info(writer: &mut Writer, array_info: &ArrayInfo) -> Result<()> {
    writer.write_le::<i32>(array_info.object_id.value());
    writer.write_le::<i32>(wire_i32(array_info.length as usize, "array length")?);
    Ok(())
}

fn write_array_header(writer: &mut Writer, header: &ArrayHeader) -> Result<()> {
    let rank = header.extents.len();
    if rank == 0 || rank > 32 {
        return Err(Error::Encode(format!(
            "array rank {} is outside the valid range 1..=32",
            rank
        )));
    }
    if header.array_type.has_lower_bounds() {
        if header.lower_bounds.len() != rank {
            return Err(Error::Encode(format!(
                "offset array declares {} dimension(s) but {} lower bound(s)",
                rank,
                header.lower_bounds.len()
            )));
        }
    } else if !header.lower_bounds.is_empty() {
        return Err(Error::Encode(
            "lower bounds are only valid on the offset array shapes".to_string(),
        ));
    }

    writer.write_le::<i32>(header.object_id.value());
    writer.write_le::<u8>(header.array_type.byte());
    writer.write_le::<i32>(wire_i32(rank, "array rank")?);
    for extent in &header.extents {
        writer.write_le::<i32>(wire_i32(*extent as usize, "array extent")?);
    }
    for lower_bound in &header.lower_bounds {
        writer.write_le::<i32>(*lower_bound);
    }
    writer.write_le::<u8>(header.element_type.byte());
    write_additional_type_info(writer, header.element_type, &header.element_info)
}
