//! Class metadata structures carried inside class records.
//!
//! A class record introduces a class in two wire pieces: `ClassInfo` (object
//! id, class name, ordered member names) and, for the `...AndTypes` variants,
//! `MemberTypeInfo` (one [`BinaryType`] per member plus its additional detail).
//! The decoder fuses the two into a [`TypeDescriptor`], the unit that is
//! cached per object id and reused by `ClassWithId` records.

use crate::graph::{LibraryId, ObjectId};
use crate::records::enums::{BinaryType, PrimitiveType};

/// Object id, class name and ordered member names of one class record.
#[derive(Clone, PartialEq, Debug)]
pub struct ClassInfo {
    /// Object id the record defines
    pub object_id: ObjectId,
    /// Class name as declared in the stream
    pub name: String,
    /// Member names in declaration order
    pub member_names: Vec<String>,
}

/// A library-qualified class name, the additional info of [`BinaryType::Class`].
#[derive(Clone, PartialEq, Debug)]
pub struct ClassTypeInfo {
    /// Class name
    pub name: String,
    /// Library the class lives in
    pub library_id: LibraryId,
}

/// Additional type detail accompanying a [`BinaryType`] tag.
#[derive(Clone, PartialEq, Debug)]
pub enum AdditionalTypeInfo {
    /// No additional detail (`String`, `Object`, `ObjectArray`, `StringArray`)
    None,
    /// Primitive kind (`Primitive`, `PrimitiveArray`)
    Primitive(PrimitiveType),
    /// System class name (`SystemClass`)
    SystemClass(String),
    /// Library-qualified class (`Class`)
    Class(ClassTypeInfo),
}

/// Per-member type tags of one `...AndTypes` class record, in member order.
#[derive(Clone, PartialEq, Debug)]
pub struct MemberTypeInfo {
    /// One `(BinaryType, additional info)` pair per member
    pub entries: Vec<(BinaryType, AdditionalTypeInfo)>,
}

/// Name and value category of one class member.
#[derive(Clone, PartialEq, Debug)]
pub struct MemberDescriptor {
    /// Member name
    pub name: String,
    /// Value category, determines how the member value is decoded
    pub binary_type: BinaryType,
    /// Additional type detail
    pub info: AdditionalTypeInfo,
}

/// The cached per-class metadata: name, owning library and ordered members.
///
/// Registered under the object id of the class record that introduced it and
/// immutable for the remainder of the stream; `ClassWithId` records decode
/// their values against it.
#[derive(Clone, PartialEq, Debug)]
pub struct TypeDescriptor {
    /// Class name
    pub name: String,
    /// Owning library, `None` for system classes
    pub library: Option<LibraryId>,
    /// Ordered member descriptors
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// Builds a descriptor from the two wire pieces of an `...AndTypes` record.
    ///
    /// The decoder guarantees that `member_types` carries exactly one entry per
    /// member name.
    #[must_use]
    pub fn typed(
        class_info: ClassInfo,
        member_types: MemberTypeInfo,
        library: Option<LibraryId>,
    ) -> Self {
        debug_assert_eq!(class_info.member_names.len(), member_types.entries.len());
        let members = class_info
            .member_names
            .into_iter()
            .zip(member_types.entries)
            .map(|(name, (binary_type, info))| MemberDescriptor {
                name,
                binary_type,
                info,
            })
            .collect();
        TypeDescriptor {
            name: class_info.name,
            library,
            members,
        }
    }

    /// Builds a descriptor for a class record without per-member type tags.
    ///
    /// With no type knowledge in the stream, members decode as `Object`-typed
    /// id-referenced values: each member value is the next record (a reference,
    /// a null or an inline object).
    #[must_use]
    pub fn untyped(class_info: ClassInfo, library: Option<LibraryId>) -> Self {
        let members = class_info
            .member_names
            .into_iter()
            .map(|name| MemberDescriptor {
                name,
                binary_type: BinaryType::Object,
                info: AdditionalTypeInfo::None,
            })
            .collect();
        TypeDescriptor {
            name: class_info.name,
            library,
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_descriptor_pairs_names_with_types() {
        let class_info = ClassInfo {
            object_id: ObjectId::new(1),
            name: "Point".to_string(),
            member_names: vec!["x".to_string(), "y".to_string()],
        };
        let member_types = MemberTypeInfo {
            entries: vec![
                (
                    BinaryType::Primitive,
                    AdditionalTypeInfo::Primitive(PrimitiveType::Int32),
                ),
                (
                    BinaryType::Primitive,
                    AdditionalTypeInfo::Primitive(PrimitiveType::Int32),
                ),
            ],
        };
        let descriptor =
            TypeDescriptor::typed(class_info, member_types, Some(LibraryId::new(2)));

        assert_eq!(descriptor.name, "Point");
        assert_eq!(descriptor.library, Some(LibraryId::new(2)));
        assert_eq!(descriptor.members.len(), 2);
        assert_eq!(descriptor.members[0].name, "x");
        assert_eq!(descriptor.members[1].binary_type, BinaryType::Primitive);
    }

    #[test]
    fn untyped_descriptor_defaults_to_object_members() {
        let class_info = ClassInfo {
            object_id: ObjectId::new(1),
            name: "Opaque".to_string(),
            member_names: vec!["inner".to_string()],
        };
        let descriptor = TypeDescriptor::untyped(class_info, None);

        assert_eq!(descriptor.members[0].binary_type, BinaryType::Object);
        assert_eq!(descriptor.members[0].info, AdditionalTypeInfo::None);
    }
}
