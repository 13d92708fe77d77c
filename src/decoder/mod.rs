//! Stream decoding: header → records → `MessageEnd` → reference resolution.
//!
//! The decoder drives the record codec over the input in a single pass. A node
//! is claimed under its object id as soon as its defining record's header is
//! read, then its member/element values are decoded against the type context
//! (the primary alignment invariant of the format: a `Primitive`-typed slot is
//! read inline, every other slot consumes exactly the next record(s)). After
//! `MessageEnd`, every reference whose target had not been defined at the time
//! it was read is re-checked against the id table; any id that never
//! materialized is a [`crate::Error::DanglingReference`].
//!
//! All caches (type descriptors, library table, id table) are created at the
//! start of one call and discarded at its end. Decoding is pure and
//! single-threaded; concurrent calls share no state.
//!
//! # Resource limits
//!
//! Input is assumed adversarial. [`DecodeLimits`] bounds the record count, the
//! node count, any single array's slot count and the nesting depth of inline
//! member records; exceeding any budget fails fast with
//! [`crate::Error::ResourceLimitExceeded`]. Declared lengths never drive
//! allocation directly: element buffers are reserved against what the
//! remaining input could possibly hold.

use std::sync::Arc;

use crate::buffer::parser::Parser;
use crate::graph::assembler::{EdgeSlot, GraphAssembler};
use crate::graph::{
    ArrayInstance, ClassInstance, Dimension, Graph, LibraryId, Node, NodeRef, ObjectId,
    PrimitiveValue,
};
use crate::records::{
    decode_record, AdditionalTypeInfo, ArrayHeader, ArrayInfo, BinaryArrayType, BinaryType,
    PrimitiveType, Record, TypeDescriptor,
};
use crate::{Error, Result};

pub(crate) mod context;

use context::DecodeContext;

/// Resource budgets for one decode call.
///
/// The defaults are generous for real-world streams while keeping worst-case
/// memory and time bounded for hostile ones.
///
/// # Examples
///
/// ```rust
/// use nrbf::DecodeLimits;
///
/// let limits = DecodeLimits {
///     max_nodes: 1024,
///     ..DecodeLimits::default()
/// };
/// # let _ = limits;
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DecodeLimits {
    /// Maximum number of records in the stream, nested records included
    pub max_records: usize,
    /// Maximum number of id-bearing nodes allocated
    pub max_nodes: usize,
    /// Maximum slot count of any single array
    pub max_array_extent: usize,
    /// Maximum nesting depth of inline records in member position
    pub max_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        DecodeLimits {
            max_records: 1 << 20,
            max_nodes: 1 << 20,
            // Null runs and zero-width elements mean slots can vastly outnumber
            // input bytes, so the slot budget is the real memory bound.
            max_array_extent: 1 << 20,
            max_depth: 128,
        }
    }
}

/// Result of a forensic decode: the partial graph plus every error encountered.
///
/// Produced by [`decode_diagnostic`], which never fails outright - malformed
/// and truncated captures are a primary analysis target, and the nodes decoded
/// before the failure point are often the interesting part.
#[derive(Debug)]
pub struct Diagnostic {
    /// Everything assembled before the first fatal error
    pub graph: Graph,
    /// The fatal error, if any, followed by every unresolved reference
    pub errors: Vec<Error>,
}

impl Diagnostic {
    /// Whether the stream decoded cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Decodes one NRBF stream into its object graph, using default limits.
///
/// # Errors
/// Any variant of [`crate::Error`]'s decode taxonomy; the call is all-or-nothing
/// and no partial graph is returned (see [`decode_diagnostic`] for that).
///
/// # Examples
///
/// ```rust
/// use nrbf::graph::{Graph, Node, ObjectId};
///
/// let mut graph = Graph::new();
/// graph.insert(ObjectId::new(1), Node::Str("hi".into()))?;
/// graph.set_root(ObjectId::new(1));
///
/// let decoded = nrbf::decode(&nrbf::encode(&graph)?)?;
/// assert_eq!(decoded.root(), Some(&Node::Str("hi".into())));
/// # Ok::<(), nrbf::Error>(())
/// ```
pub fn decode(data: &[u8]) -> Result<Graph> {
    decode_with_limits(data, &DecodeLimits::default())
}

/// Decodes one NRBF stream with caller-chosen resource limits.
///
/// # Errors
/// As [`decode`], plus [`crate::Error::ResourceLimitExceeded`] as soon as any
/// budget is exhausted.
pub fn decode_with_limits(data: &[u8], limits: &DecodeLimits) -> Result<Graph> {
    let mut decoder = Decoder::new(data, limits);
    decoder.run_records()?;
    if let Some(error) = decoder.verify().into_iter().next() {
        return Err(error);
    }
    Ok(decoder.into_graph())
}

/// Decodes as much of a stream as possible, collecting errors instead of failing.
///
/// Returns the partial graph assembled before the first fatal error together
/// with that error and every dangling reference. A clean stream yields an
/// empty error list.
#[must_use]
pub fn decode_diagnostic(data: &[u8], limits: &DecodeLimits) -> Diagnostic {
    let mut decoder = Decoder::new(data, limits);
    let mut errors = Vec::new();
    if let Err(error) = decoder.run_records() {
        errors.push(error);
    }
    errors.extend(decoder.verify());
    Diagnostic {
        graph: decoder.into_graph(),
        errors,
    }
}

/// One in-flight decode: cursor, caches, assembler and budgets.
struct Decoder<'a> {
    parser: Parser<'a>,
    limits: &'a DecodeLimits,
    ctx: DecodeContext,
    assembler: GraphAssembler,
    root_id: Option<ObjectId>,
    records_read: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8], limits: &'a DecodeLimits) -> Self {
        Decoder {
            parser: Parser::new(data),
            limits,
            ctx: DecodeContext::new(),
            assembler: GraphAssembler::new(limits.max_nodes),
            root_id: None,
            records_read: 0,
        }
    }

    /// Reads the next record, charging it against the record budget.
    fn next_record(&mut self) -> Result<Record> {
        if self.records_read >= self.limits.max_records {
            return Err(Error::ResourceLimitExceeded {
                what: "record count",
                limit: self.limits.max_records,
            });
        }
        self.records_read += 1;
        decode_record(&mut self.parser)
    }

    /// Top-level record loop: header first, then records until `MessageEnd`.
    fn run_records(&mut self) -> Result<()> {
        loop {
            let record = self.next_record()?;
            match record {
                Record::SerializedStreamHeader {
                    root_id,
                    major_version,
                    minor_version,
                    ..
                } => {
                    if self.root_id.is_some() {
                        return Err(malformed_error!("duplicate SerializedStreamHeader record"));
                    }
                    if self.records_read != 1 {
                        return Err(malformed_error!(
                            "SerializedStreamHeader must be the first record in the stream"
                        ));
                    }
                    if major_version != 1 || minor_version != 0 {
                        return Err(malformed_error!(
                            "unsupported format version {}.{}, only 1.0 is defined",
                            major_version,
                            minor_version
                        ));
                    }
                    if root_id.is_null() {
                        return Err(malformed_error!("header root id must be non-zero"));
                    }
                    self.root_id = Some(root_id);
                }
                _ if self.root_id.is_none() => {
                    return Err(malformed_error!(
                        "stream must begin with a SerializedStreamHeader record"
                    ));
                }
                Record::MessageEnd => return Ok(()),
                Record::BinaryLibrary { library_id, name } => {
                    self.ctx.define_library(library_id, name)?;
                }
                Record::MemberReference { .. }
                | Record::ObjectNull
                | Record::ObjectNullMultiple256 { .. }
                | Record::ObjectNullMultiple { .. }
                | Record::MemberPrimitiveTyped { .. } => {
                    return Err(malformed_error!(
                        "record {:?} is only valid in member position",
                        record.record_type()
                    ));
                }
                record => {
                    self.decode_object(record, 0)?;
                }
            }
        }
    }

    /// Post-`MessageEnd` checks: every queued edge target and the root id must
    /// be in the id table. Returns all failures for diagnostic use.
    fn verify(&self) -> Vec<Error> {
        let mut errors: Vec<Error> = self
            .assembler
            .unresolved()
            .into_iter()
            .map(Error::DanglingReference)
            .collect();
        if let Some(root_id) = self.root_id {
            if !self.assembler.contains(root_id) {
                errors.push(Error::DanglingReference(root_id));
            }
        }
        errors
    }

    /// Consumes the decoder into a graph (partial if decoding aborted early).
    fn into_graph(self) -> Graph {
        Graph::from_parts(
            self.root_id,
            self.assembler.into_nodes(),
            self.ctx.into_libraries(),
        )
    }

    /// Decodes an id-bearing record into a node, values included.
    ///
    /// Returns the object id the record defined.
    fn decode_object(&mut self, record: Record, depth: usize) -> Result<ObjectId> {
        match record {
            Record::SystemClassWithMembersAndTypes {
                class_info,
                member_types,
            } => {
                let object_id = class_info.object_id;
                let descriptor = TypeDescriptor::typed(class_info, member_types, None);
                self.decode_class(object_id, Arc::new(descriptor), depth)
            }
            Record::ClassWithMembersAndTypes {
                class_info,
                member_types,
                library_id,
            } => {
                self.require_library(library_id, &class_info.name)?;
                let object_id = class_info.object_id;
                let descriptor = TypeDescriptor::typed(class_info, member_types, Some(library_id));
                self.decode_class(object_id, Arc::new(descriptor), depth)
            }
            Record::SystemClassWithMembers { class_info } => {
                let object_id = class_info.object_id;
                let descriptor = TypeDescriptor::untyped(class_info, None);
                self.decode_class(object_id, Arc::new(descriptor), depth)
            }
            Record::ClassWithMembers {
                class_info,
                library_id,
            } => {
                self.require_library(library_id, &class_info.name)?;
                let object_id = class_info.object_id;
                let descriptor = TypeDescriptor::untyped(class_info, Some(library_id));
                self.decode_class(object_id, Arc::new(descriptor), depth)
            }
            Record::ClassWithId {
                object_id,
                metadata_id,
            } => {
                let descriptor = self.ctx.class(metadata_id)?;
                self.decode_class(object_id, descriptor, depth)
            }
            Record::BinaryObjectString { object_id, value } => {
                self.assembler.reserve(object_id)?;
                self.assembler.complete(object_id, Node::Str(value));
                Ok(object_id)
            }
            Record::ArraySinglePrimitive {
                array_info,
                primitive_type,
            } => self.decode_primitive_array(array_info, primitive_type),
            Record::ArraySingleObject { array_info } => {
                self.decode_single_array(array_info, BinaryType::Object, depth)
            }
            Record::ArraySingleString { array_info } => {
                self.decode_single_array(array_info, BinaryType::String, depth)
            }
            Record::BinaryArray(header) => self.decode_binary_array(header, depth),
            record => Err(malformed_error!(
                "record {:?} cannot define an object",
                record.record_type()
            )),
        }
    }

    /// A class record referencing a library id must come after its definition.
    fn require_library(&self, library_id: LibraryId, class_name: &str) -> Result<()> {
        if !self.ctx.library_defined(library_id) {
            return Err(malformed_error!(
                "class '{}' references undefined library id {}",
                class_name,
                library_id
            ));
        }
        Ok(())
    }

    /// Claims the id, registers the descriptor and decodes the member values.
    fn decode_class(
        &mut self,
        object_id: ObjectId,
        descriptor: Arc<TypeDescriptor>,
        depth: usize,
    ) -> Result<ObjectId> {
        self.assembler.reserve(object_id)?;
        // Registered under this id too, so ClassWithId may chain off any
        // earlier instance, not only the descriptor-introducing record.
        self.ctx.register_class(object_id, descriptor.clone());

        let members = self.read_members(object_id, &descriptor, depth)?;
        self.assembler.complete(
            object_id,
            Node::Class(ClassInstance {
                type_name: descriptor.name.clone(),
                library: descriptor.library,
                members,
            }),
        );
        Ok(object_id)
    }

    /// Decodes one value per member descriptor, honoring null runs that span
    /// consecutive slots.
    fn read_members(
        &mut self,
        holder: ObjectId,
        descriptor: &TypeDescriptor,
        depth: usize,
    ) -> Result<Vec<(String, NodeRef)>> {
        let mut members = Vec::with_capacity(descriptor.members.len());
        let mut pending_nulls = 0usize;

        for (index, member) in descriptor.members.iter().enumerate() {
            let value =
                self.read_slot(member.binary_type, &member.info, &mut pending_nulls, depth)?;
            if let NodeRef::Object(target) = value {
                self.assembler
                    .reference(holder, EdgeSlot::Member(index), target);
            }
            members.push((member.name.clone(), value));
        }

        if pending_nulls > 0 {
            return Err(malformed_error!(
                "null run overruns the member list by {} slot(s)",
                pending_nulls
            ));
        }
        Ok(members)
    }

    /// Decodes one member/element slot according to its declared type.
    fn read_slot(
        &mut self,
        binary_type: BinaryType,
        info: &AdditionalTypeInfo,
        pending_nulls: &mut usize,
        depth: usize,
    ) -> Result<NodeRef> {
        if *pending_nulls > 0 {
            *pending_nulls -= 1;
            return Ok(NodeRef::Null);
        }

        if binary_type == BinaryType::Primitive {
            let AdditionalTypeInfo::Primitive(kind) = info else {
                return Err(malformed_error!(
                    "primitive-typed slot without a primitive kind"
                ));
            };
            return Ok(NodeRef::Value(PrimitiveValue::read(
                &mut self.parser,
                *kind,
            )?));
        }

        self.read_reference(pending_nulls, depth)
    }

    /// Consumes the record(s) filling one non-primitive slot: a reference, a
    /// null record (possibly covering following slots too), an inline
    /// primitive, or an inline id-bearing object. `BinaryLibrary` records are
    /// legal immediately before an inline object and are processed in place.
    fn read_reference(&mut self, pending_nulls: &mut usize, depth: usize) -> Result<NodeRef> {
        if depth >= self.limits.max_depth {
            return Err(Error::ResourceLimitExceeded {
                what: "member record nesting depth",
                limit: self.limits.max_depth,
            });
        }

        loop {
            let record = self.next_record()?;
            match record {
                Record::BinaryLibrary { library_id, name } => {
                    self.ctx.define_library(library_id, name)?;
                }
                Record::MemberReference { id_ref } => return Ok(NodeRef::Object(id_ref)),
                Record::ObjectNull => return Ok(NodeRef::Null),
                Record::ObjectNullMultiple256 { count } => {
                    *pending_nulls = count as usize - 1;
                    return Ok(NodeRef::Null);
                }
                Record::ObjectNullMultiple { count } => {
                    *pending_nulls = count as usize - 1;
                    return Ok(NodeRef::Null);
                }
                Record::MemberPrimitiveTyped { value } => return Ok(NodeRef::Value(value)),
                Record::SerializedStreamHeader { .. } | Record::MessageEnd => {
                    return Err(malformed_error!(
                        "record {:?} is not valid in member position",
                        record.record_type()
                    ));
                }
                record => {
                    let id = self.decode_object(record, depth + 1)?;
                    return Ok(NodeRef::Object(id));
                }
            }
        }
    }

    /// Charges an array's slot count against the extent budget.
    fn check_extent(&self, slots: u64) -> Result<usize> {
        let limit = self.limits.max_array_extent;
        if slots > limit as u64 {
            return Err(Error::ResourceLimitExceeded {
                what: "array extent",
                limit,
            });
        }
        Ok(slots as usize)
    }

    /// `ArraySinglePrimitive`: raw fixed-width values with no per-element tag.
    fn decode_primitive_array(
        &mut self,
        array_info: ArrayInfo,
        primitive_type: PrimitiveType,
    ) -> Result<ObjectId> {
        let count = self.check_extent(u64::from(array_info.length))?;

        // Fixed-width elements make the exact byte requirement knowable up
        // front; the truncation check fires before the node is allocated.
        match primitive_type.fixed_width() {
            Some(width) => self.parser.ensure_remaining(count.saturating_mul(width))?,
            None => self.parser.ensure_remaining(count)?,
        }

        self.assembler.reserve(array_info.object_id)?;
        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            elements.push(NodeRef::Value(PrimitiveValue::read(
                &mut self.parser,
                primitive_type,
            )?));
        }

        self.assembler.complete(
            array_info.object_id,
            Node::Array(ArrayInstance {
                array_type: BinaryArrayType::Single,
                element_type: BinaryType::Primitive,
                element_info: AdditionalTypeInfo::Primitive(primitive_type),
                dimensions: vec![Dimension {
                    extent: array_info.length,
                    lower_bound: 0,
                }],
                elements,
            }),
        );
        Ok(array_info.object_id)
    }

    /// `ArraySingleObject` / `ArraySingleString`: per-slot member records.
    fn decode_single_array(
        &mut self,
        array_info: ArrayInfo,
        element_type: BinaryType,
        depth: usize,
    ) -> Result<ObjectId> {
        let count = self.check_extent(u64::from(array_info.length))?;
        self.assembler.reserve(array_info.object_id)?;

        let elements = self.read_elements(
            array_info.object_id,
            count,
            element_type,
            &AdditionalTypeInfo::None,
            depth,
        )?;

        self.assembler.complete(
            array_info.object_id,
            Node::Array(ArrayInstance {
                array_type: BinaryArrayType::Single,
                element_type,
                element_info: AdditionalTypeInfo::None,
                dimensions: vec![Dimension {
                    extent: array_info.length,
                    lower_bound: 0,
                }],
                elements,
            }),
        );
        Ok(array_info.object_id)
    }

    /// `BinaryArray`: any rank and shape, elements in row-major order.
    fn decode_binary_array(&mut self, header: ArrayHeader, depth: usize) -> Result<ObjectId> {
        for extent in &header.extents {
            self.check_extent(u64::from(*extent))?;
        }
        let count = self.check_extent(header.slot_count())?;

        let primitive_kind = if header.element_type == BinaryType::Primitive {
            let AdditionalTypeInfo::Primitive(kind) = &header.element_info else {
                return Err(malformed_error!(
                    "primitive-element array without a primitive kind"
                ));
            };
            match kind.fixed_width() {
                Some(width) => self.parser.ensure_remaining(count.saturating_mul(width))?,
                None => self.parser.ensure_remaining(count)?,
            }
            Some(*kind)
        } else {
            None
        };

        self.assembler.reserve(header.object_id)?;

        let elements = if let Some(kind) = primitive_kind {
            let mut elements = Vec::with_capacity(count);
            for _ in 0..count {
                elements.push(NodeRef::Value(PrimitiveValue::read(&mut self.parser, kind)?));
            }
            elements
        } else {
            self.read_elements(
                header.object_id,
                count,
                header.element_type,
                &header.element_info,
                depth,
            )?
        };

        let dimensions = header
            .extents
            .iter()
            .enumerate()
            .map(|(dimension, extent)| Dimension {
                extent: *extent,
                lower_bound: header.lower_bounds.get(dimension).copied().unwrap_or(0),
            })
            .collect();

        self.assembler.complete(
            header.object_id,
            Node::Array(ArrayInstance {
                array_type: header.array_type,
                element_type: header.element_type,
                element_info: header.element_info,
                dimensions,
                elements,
            }),
        );
        Ok(header.object_id)
    }

    /// Reads `count` record-valued element slots, expanding null runs.
    fn read_elements(
        &mut self,
        holder: ObjectId,
        count: usize,
        element_type: BinaryType,
        element_info: &AdditionalTypeInfo,
        depth: usize,
    ) -> Result<Vec<NodeRef>> {
        // A null run covers many slots with a few bytes, so the remaining
        // input does not bound the slot count; the extent budget does. Only
        // the initial reservation is capped by what the input could hold.
        let mut elements = Vec::with_capacity(count.min(self.parser.remaining()));
        let mut pending_nulls = 0usize;

        for index in 0..count {
            let value = self.read_slot(element_type, element_info, &mut pending_nulls, depth)?;
            if let NodeRef::Object(target) = value {
                self.assembler
                    .reference(holder, EdgeSlot::Element(index), target);
            }
            elements.push(value);
        }

        if pending_nulls > 0 {
            return Err(malformed_error!(
                "null run overruns the array by {} slot(s)",
                pending_nulls
            ));
        }
        Ok(elements)
    }
}
