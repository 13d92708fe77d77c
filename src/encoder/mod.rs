//! Stream encoding: deterministic id assignment and record emission.
//!
//! The encoder walks the graph from the root, assigning fresh wire ids in
//! first-seen order; graph ids are never written out, so `decode(encode(g))`
//! is equal to `g` modulo id renumbering.
//!
//! Emission is flat, the way `BinaryFormatter` writes streams: a member or
//! element slot referencing a not-yet-written object emits a
//! `MemberReference` and queues the object for top-level emission, except for
//! strings, which are inlined as `BinaryObjectString` at their first
//! occurrence. A slot referencing an object already written (or currently
//! being written, for cycles) always emits a `MemberReference`. Deep graphs
//! therefore never recurse.
//!
//! `BinaryLibrary` records are written before the first class record that
//! needs them; the first instance of each class writes the full descriptor
//! record and registers its member layout, later instances reuse it through
//! `ClassWithId`. Consecutive null array slots collapse into
//! `ObjectNullMultiple256`/`ObjectNullMultiple` runs.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::buffer::writer::Writer;
use crate::graph::{ArrayInstance, ClassInstance, Graph, LibraryId, Node, NodeRef, ObjectId};
use crate::records::{
    encode_record, AdditionalTypeInfo, ArrayHeader, ArrayInfo, BinaryArrayType, BinaryType,
    ClassInfo, MemberDescriptor, MemberTypeInfo, PrimitiveType, Record,
};
use crate::{Error, Result};

/// Encodes a graph into one NRBF stream.
///
/// The graph must have a root ([`Graph::set_root`]) and every id referenced
/// from a slot must resolve to a node. Ids are renumbered in first-seen order
/// from the root; unreachable nodes are not written.
///
/// # Errors
/// - [`crate::Error::DanglingReference`] for a slot referencing a missing id
/// - [`crate::Error::MissingTypeDescriptor`] when a later instance of a class
///   does not match the registered member layout
/// - [`crate::Error::Encode`] for values with no wire representation (no root,
///   free-standing primitive or null root nodes, mismatched array geometry)
///
/// # Examples
///
/// ```rust
/// use nrbf::graph::{Graph, Node, NodeRef, ObjectId, PrimitiveValue};
///
/// let mut graph = Graph::new();
/// graph.insert(
///     ObjectId::new(1),
///     Node::class("Counter", None)
///         .with_member("count", NodeRef::Value(PrimitiveValue::Int32(3))),
/// )?;
/// graph.set_root(ObjectId::new(1));
///
/// let bytes = nrbf::encode(&graph)?;
/// assert_eq!(bytes[0], 0x00); // SerializedStreamHeader
/// # Ok::<(), nrbf::Error>(())
/// ```
pub fn encode(graph: &Graph) -> Result<Vec<u8>> {
    Encoder::new(graph).run()
}

/// Registered member layout of the first emitted instance of a class.
struct ClassPlan {
    /// Wire object id of the record that introduced the descriptor
    metadata_id: i32,
    /// Member layout every later instance must match
    members: Vec<MemberDescriptor>,
}

/// One in-flight encode: output buffer, id assignment and descriptor caches.
struct Encoder<'a> {
    graph: &'a Graph,
    out: Writer,
    /// Graph object id to assigned wire id
    wire_ids: HashMap<i32, i32>,
    /// Graph ids whose record has been written or is being written
    started: HashSet<i32>,
    /// Assigned but not yet written, in discovery order
    queue: VecDeque<ObjectId>,
    /// Class plans keyed by (type name, graph library id)
    classes: HashMap<(String, Option<i32>), ClassPlan>,
    /// Graph library id to wire library id, written on first use
    libraries: HashMap<i32, i32>,
    next_id: i32,
}

impl<'a> Encoder<'a> {
    fn new(graph: &'a Graph) -> Self {
        Encoder {
            graph,
            out: Writer::new(),
            wire_ids: HashMap::new(),
            started: HashSet::new(),
            queue: VecDeque::new(),
            classes: HashMap::new(),
            libraries: HashMap::new(),
            next_id: 1,
        }
    }

    /// Wire id for a graph id, assigned on first encounter.
    fn assign(&mut self, id: ObjectId) -> i32 {
        if let Some(wire_id) = self.wire_ids.get(&id.value()) {
            return *wire_id;
        }
        let wire_id = self.next_id;
        self.next_id += 1;
        self.wire_ids.insert(id.value(), wire_id);
        wire_id
    }

    fn run(mut self) -> Result<Vec<u8>> {
        let root_id = self
            .graph
            .root_id()
            .ok_or_else(|| Error::Encode("graph has no root object".to_string()))?;
        if self.graph.node(root_id).is_none() {
            return Err(Error::DanglingReference(root_id));
        }

        let root_wire = self.assign(root_id);
        encode_record(
            &Record::SerializedStreamHeader {
                root_id: ObjectId::new(root_wire),
                header_id: -1,
                major_version: 1,
                minor_version: 0,
            },
            &mut self.out,
        )?;

        self.queue.push_back(root_id);
        while let Some(id) = self.queue.pop_front() {
            if self.started.contains(&id.value()) {
                continue;
            }
            self.emit_node(id)?;
        }

        encode_record(&Record::MessageEnd, &mut self.out)?;
        Ok(self.out.into_bytes())
    }

    /// Writes the record (and values) defining one node.
    fn emit_node(&mut self, id: ObjectId) -> Result<()> {
        let node = self.graph.node(id).ok_or(Error::DanglingReference(id))?;
        self.started.insert(id.value());
        let wire_id = self.assign(id);

        match node {
            Node::Str(value) => encode_record(
                &Record::BinaryObjectString {
                    object_id: ObjectId::new(wire_id),
                    value: value.clone(),
                },
                &mut self.out,
            ),
            Node::Class(instance) => self.emit_class(wire_id, instance),
            Node::Array(instance) => self.emit_array(wire_id, instance),
            Node::Primitive(_) => Err(Error::Encode(format!(
                "node {} is a free-standing primitive; primitives are inline member values \
                 (NodeRef::Value) and cannot be id-addressed on the wire",
                id
            ))),
            Node::Null => Err(Error::Encode(format!(
                "node {} is a free-standing null; express null slots as NodeRef::Null",
                id
            ))),
        }
    }

    /// Writes a class instance: full descriptor for the first instance of a
    /// class, `ClassWithId` reuse afterwards, then the member values.
    fn emit_class(&mut self, wire_id: i32, instance: &ClassInstance) -> Result<()> {
        let wire_library = match instance.library {
            Some(library) => Some(self.ensure_library(library, &instance.type_name)?),
            None => None,
        };

        let key = (
            instance.type_name.clone(),
            instance.library.map(|library| library.value()),
        );

        if let Some(plan) = self.classes.get(&key) {
            let metadata_id = plan.metadata_id;
            let plan_members = plan.members.clone();
            self.check_instance_matches(&plan_members, instance)?;
            encode_record(
                &Record::ClassWithId {
                    object_id: ObjectId::new(wire_id),
                    metadata_id: ObjectId::new(metadata_id),
                },
                &mut self.out,
            )?;
            return self.emit_member_values(instance, &plan_members);
        }

        let plan_members = self.derive_members(instance)?;
        let class_info = ClassInfo {
            object_id: ObjectId::new(wire_id),
            name: instance.type_name.clone(),
            member_names: plan_members
                .iter()
                .map(|member| member.name.clone())
                .collect(),
        };
        let member_types = MemberTypeInfo {
            entries: plan_members
                .iter()
                .map(|member| (member.binary_type, member.info.clone()))
                .collect(),
        };
        let record = match wire_library {
            Some(library_id) => Record::ClassWithMembersAndTypes {
                class_info,
                member_types,
                library_id,
            },
            None => Record::SystemClassWithMembersAndTypes {
                class_info,
                member_types,
            },
        };
        encode_record(&record, &mut self.out)?;
        self.classes.insert(
            key,
            ClassPlan {
                metadata_id: wire_id,
                members: plan_members.clone(),
            },
        );
        self.emit_member_values(instance, &plan_members)
    }

    /// Derives the member layout from the first instance of a class.
    ///
    /// Inline primitives become `Primitive`-typed members, references to
    /// string nodes become `String`-typed, everything else is an
    /// `Object`-typed id-referenced slot.
    fn derive_members(&self, instance: &ClassInstance) -> Result<Vec<MemberDescriptor>> {
        let mut members = Vec::with_capacity(instance.members.len());
        for (name, value) in &instance.members {
            let (binary_type, info) = match value {
                NodeRef::Value(primitive) => (
                    BinaryType::Primitive,
                    AdditionalTypeInfo::Primitive(primitive.kind()),
                ),
                NodeRef::Null => (BinaryType::Object, AdditionalTypeInfo::None),
                NodeRef::Object(target) => match self.graph.node(*target) {
                    None => return Err(Error::DanglingReference(*target)),
                    Some(Node::Str(_)) => (BinaryType::String, AdditionalTypeInfo::None),
                    Some(_) => (BinaryType::Object, AdditionalTypeInfo::None),
                },
            };
            members.push(MemberDescriptor {
                name: name.clone(),
                binary_type,
                info,
            });
        }
        Ok(members)
    }

    /// A reused class must carry the registered member names in order.
    fn check_instance_matches(
        &self,
        plan: &[MemberDescriptor],
        instance: &ClassInstance,
    ) -> Result<()> {
        let names_match = plan.len() == instance.members.len()
            && plan
                .iter()
                .zip(&instance.members)
                .all(|(descriptor, (name, _))| &descriptor.name == name);
        if !names_match {
            return Err(Error::MissingTypeDescriptor(instance.type_name.clone()));
        }
        Ok(())
    }

    /// Writes member values against a plan: primitives inline, the rest as slots.
    fn emit_member_values(
        &mut self,
        instance: &ClassInstance,
        plan: &[MemberDescriptor],
    ) -> Result<()> {
        for (descriptor, (_, value)) in plan.iter().zip(&instance.members) {
            if descriptor.binary_type == BinaryType::Primitive {
                let AdditionalTypeInfo::Primitive(kind) = &descriptor.info else {
                    return Err(Error::MissingTypeDescriptor(instance.type_name.clone()));
                };
                let NodeRef::Value(primitive) = value else {
                    return Err(Error::MissingTypeDescriptor(instance.type_name.clone()));
                };
                if primitive.kind() != *kind {
                    return Err(Error::MissingTypeDescriptor(instance.type_name.clone()));
                }
                primitive.write(&mut self.out)?;
            } else {
                self.emit_ref_slot(value)?;
            }
        }
        Ok(())
    }

    /// Writes one non-primitive slot.
    ///
    /// References to `Null` and `Primitive` nodes are normalized to their
    /// inline records; NRBF gives neither an identity on the wire.
    fn emit_ref_slot(&mut self, value: &NodeRef) -> Result<()> {
        match value {
            NodeRef::Null => encode_record(&Record::ObjectNull, &mut self.out),
            NodeRef::Value(primitive) => encode_record(
                &Record::MemberPrimitiveTyped {
                    value: primitive.clone(),
                },
                &mut self.out,
            ),
            NodeRef::Object(target) => match self.graph.node(*target) {
                None => Err(Error::DanglingReference(*target)),
                Some(Node::Null) => encode_record(&Record::ObjectNull, &mut self.out),
                Some(Node::Primitive(primitive)) => encode_record(
                    &Record::MemberPrimitiveTyped {
                        value: primitive.clone(),
                    },
                    &mut self.out,
                ),
                Some(Node::Str(string)) => {
                    if self.started.contains(&target.value()) {
                        let wire_id = self.assign(*target);
                        encode_record(
                            &Record::MemberReference {
                                id_ref: ObjectId::new(wire_id),
                            },
                            &mut self.out,
                        )
                    } else {
                        // Strings inline at first occurrence, as BinaryFormatter does.
                        self.started.insert(target.value());
                        let wire_id = self.assign(*target);
                        encode_record(
                            &Record::BinaryObjectString {
                                object_id: ObjectId::new(wire_id),
                                value: string.clone(),
                            },
                            &mut self.out,
                        )
                    }
                }
                Some(_) => {
                    let wire_id = self.assign(*target);
                    if !self.started.contains(&target.value()) {
                        self.queue.push_back(*target);
                    }
                    encode_record(
                        &Record::MemberReference {
                            id_ref: ObjectId::new(wire_id),
                        },
                        &mut self.out,
                    )
                }
            },
        }
    }

    /// Writes an array under the most specific record form that fits.
    fn emit_array(&mut self, wire_id: i32, instance: &ArrayInstance) -> Result<()> {
        let slots = instance.slot_count();
        if instance.elements.len() != slots {
            return Err(Error::Encode(format!(
                "array declares {} slot(s) but holds {} element(s)",
                slots,
                instance.elements.len()
            )));
        }
        if instance.dimensions.is_empty() {
            return Err(Error::Encode("array has no dimensions".to_string()));
        }

        let single_plain = instance.array_type == BinaryArrayType::Single
            && instance.dimensions.len() == 1
            && instance.dimensions[0].lower_bound == 0;

        if single_plain {
            let array_info = ArrayInfo {
                object_id: ObjectId::new(wire_id),
                length: instance.dimensions[0].extent,
            };
            match (instance.element_type, &instance.element_info) {
                (BinaryType::Primitive, AdditionalTypeInfo::Primitive(kind)) => {
                    encode_record(
                        &Record::ArraySinglePrimitive {
                            array_info,
                            primitive_type: *kind,
                        },
                        &mut self.out,
                    )?;
                    return self.emit_primitive_elements(*kind, &instance.elements);
                }
                (BinaryType::String, AdditionalTypeInfo::None) => {
                    encode_record(&Record::ArraySingleString { array_info }, &mut self.out)?;
                    return self.emit_element_slots(&instance.elements);
                }
                (BinaryType::Object, AdditionalTypeInfo::None) => {
                    encode_record(&Record::ArraySingleObject { array_info }, &mut self.out)?;
                    return self.emit_element_slots(&instance.elements);
                }
                // Class-typed and array-typed elements need the general form.
                _ => {}
            }
        }

        let lower_bounds = if instance.array_type.has_lower_bounds() {
            instance
                .dimensions
                .iter()
                .map(|dimension| dimension.lower_bound)
                .collect()
        } else {
            if instance
                .dimensions
                .iter()
                .any(|dimension| dimension.lower_bound != 0)
            {
                return Err(Error::Encode(
                    "non-zero lower bounds require an offset array shape".to_string(),
                ));
            }
            Vec::new()
        };

        let header = ArrayHeader {
            object_id: ObjectId::new(wire_id),
            array_type: instance.array_type,
            extents: instance
                .dimensions
                .iter()
                .map(|dimension| dimension.extent)
                .collect(),
            lower_bounds,
            element_type: instance.element_type,
            element_info: instance.element_info.clone(),
        };
        encode_record(&Record::BinaryArray(header), &mut self.out)?;

        if instance.element_type == BinaryType::Primitive {
            let AdditionalTypeInfo::Primitive(kind) = &instance.element_info else {
                return Err(Error::Encode(
                    "primitive-element array without a primitive kind".to_string(),
                ));
            };
            self.emit_primitive_elements(*kind, &instance.elements)
        } else {
            self.emit_element_slots(&instance.elements)
        }
    }

    /// Raw untagged values of one primitive kind.
    fn emit_primitive_elements(&mut self, kind: PrimitiveType, elements: &[NodeRef]) -> Result<()> {
        for element in elements {
            let NodeRef::Value(primitive) = element else {
                return Err(Error::Encode(
                    "primitive array elements must be inline primitive values".to_string(),
                ));
            };
            if primitive.kind() != kind {
                return Err(Error::Encode(format!(
                    "primitive array element kind {:?} does not match the declared {:?}",
                    primitive.kind(),
                    kind
                )));
            }
            primitive.write(&mut self.out)?;
        }
        Ok(())
    }

    /// Record-valued element slots, with consecutive nulls collapsed into runs.
    fn emit_element_slots(&mut self, elements: &[NodeRef]) -> Result<()> {
        let mut index = 0;
        while index < elements.len() {
            if elements[index] == NodeRef::Null {
                let run_start = index;
                while index < elements.len() && elements[index] == NodeRef::Null {
                    index += 1;
                }
                self.emit_null_run(index - run_start)?;
            } else {
                self.emit_ref_slot(&elements[index])?;
                index += 1;
            }
        }
        Ok(())
    }

    fn emit_null_run(&mut self, run: usize) -> Result<()> {
        match run {
            1 => encode_record(&Record::ObjectNull, &mut self.out),
            2..=255 => {
                #[allow(clippy::cast_possible_truncation)]
                let count = run as u8;
                encode_record(&Record::ObjectNullMultiple256 { count }, &mut self.out)
            }
            _ => {
                let count = u32::try_from(run).map_err(|_| {
                    Error::Encode(format!("null run of {} slots exceeds the wire range", run))
                })?;
                encode_record(&Record::ObjectNullMultiple { count }, &mut self.out)
            }
        }
    }

    /// Wire id for a graph library, writing its `BinaryLibrary` record on first use.
    fn ensure_library(&mut self, library: LibraryId, class_name: &str) -> Result<LibraryId> {
        if let Some(wire_id) = self.libraries.get(&library.value()) {
            return Ok(LibraryId::new(*wire_id));
        }
        let name = self
            .graph
            .library(library)
            .ok_or_else(|| {
                Error::Encode(format!(
                    "class '{}' references library id {} which is not defined in the graph",
                    class_name, library
                ))
            })?
            .to_string();

        let wire_id = self.next_id;
        self.next_id += 1;
        self.libraries.insert(library.value(), wire_id);
        encode_record(
            &Record::BinaryLibrary {
                library_id: LibraryId::new(wire_id),
                name,
            },
            &mut self.out,
        )?;
        Ok(LibraryId::new(wire_id))
    }
}
