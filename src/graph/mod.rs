//! The decoded object-graph model.
//!
//! A decoded NRBF stream becomes a [`Graph`]: an arena of [`Node`] values indexed
//! by [`ObjectId`], with a root id and a library table. Edges between nodes are
//! id lookups ([`NodeRef::Object`]), never native references, so back-edges,
//! diamonds and self-references are representable without ownership conflicts,
//! and two references to the same id always resolve to the same node.
//!
//! # Building graphs for encoding
//!
//! [`Graph`] is caller-constructible: insert nodes under explicit ids, define
//! libraries, set the root and pass the result to [`crate::encode`]. Ids only
//! need to be unique; the encoder renumbers them in first-seen order.
//!
//! ```rust
//! use nrbf::graph::{Graph, Node, NodeRef, ObjectId, PrimitiveValue};
//!
//! let mut graph = Graph::new();
//! graph.insert(
//!     ObjectId::new(1),
//!     Node::class("Point", None)
//!         .with_member("x", NodeRef::Value(PrimitiveValue::Int32(5)))
//!         .with_member("y", NodeRef::Value(PrimitiveValue::Int32(7))),
//! )?;
//! graph.set_root(ObjectId::new(1));
//! # Ok::<(), nrbf::Error>(())
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::records::{AdditionalTypeInfo, BinaryArrayType, BinaryType};
use crate::{Error, Result};

pub(crate) mod assembler;
mod value;

pub use value::PrimitiveValue;

/// A stream-scoped identifier of one referenceable decoded entity.
///
/// Object ids are caller-unique non-zero 32-bit integers; id 0 denotes
/// "no id / null" in the contexts that permit it. Ids carry no meaning
/// outside the one stream they appear in.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectId(i32);

impl ObjectId {
    /// Creates an object id from its raw wire value.
    #[must_use]
    pub fn new(value: i32) -> Self {
        ObjectId(value)
    }

    /// Returns the raw wire value.
    #[must_use]
    pub fn value(&self) -> i32 {
        self.0
    }

    /// Returns true for the null id (value 0).
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for ObjectId {
    fn from(value: i32) -> Self {
        ObjectId(value)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stream-scoped key into the library (assembly name) table.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LibraryId(i32);

impl LibraryId {
    /// Creates a library id from its raw wire value.
    #[must_use]
    pub fn new(value: i32) -> Self {
        LibraryId(value)
    }

    /// Returns the raw wire value.
    #[must_use]
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for LibraryId {
    fn from(value: i32) -> Self {
        LibraryId(value)
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member or element slot: either an inline primitive or an id reference.
///
/// References are resolved through [`Graph::node`], never dereferenced during
/// construction, which is what makes direct self-reference and mutual cycles
/// safe to decode.
#[derive(Clone, PartialEq, Debug)]
pub enum NodeRef {
    /// Inline primitive value, no identity
    Value(PrimitiveValue),
    /// Reference to the node with this object id
    Object(ObjectId),
    /// Null slot
    Null,
}

/// One decoded class instance.
#[derive(Clone, PartialEq, Debug)]
pub struct ClassInstance {
    /// Class name as declared in the stream
    pub type_name: String,
    /// Owning library, `None` for system classes
    pub library: Option<LibraryId>,
    /// Ordered member name to value mapping
    pub members: Vec<(String, NodeRef)>,
}

impl ClassInstance {
    /// Looks up a member value by name.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&NodeRef> {
        self.members
            .iter()
            .find(|(member_name, _)| member_name == name)
            .map(|(_, value)| value)
    }
}

/// Extent and lower bound of one array dimension.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Dimension {
    /// Number of elements along this dimension
    pub extent: u32,
    /// First index along this dimension, 0 unless an offset array form was used
    pub lower_bound: i32,
}

/// One decoded array.
///
/// Elements are stored flat in row-major order; jagged arrays hold references
/// to their nested arrays, each a separate node with its own id.
#[derive(Clone, PartialEq, Debug)]
pub struct ArrayInstance {
    /// Wire shape this array was (or will be) carried as
    pub array_type: BinaryArrayType,
    /// Value category of the elements
    pub element_type: BinaryType,
    /// Additional element type detail (primitive kind or class name)
    pub element_info: AdditionalTypeInfo,
    /// Ordered dimensions, one for single-dimensional arrays
    pub dimensions: Vec<Dimension>,
    /// Row-major element slots
    pub elements: Vec<NodeRef>,
}

impl ArrayInstance {
    /// Total number of element slots (product of the extents).
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.dimensions
            .iter()
            .map(|d| d.extent as usize)
            .product()
    }
}

/// A decoded graph vertex.
#[derive(Clone, PartialEq, Debug)]
pub enum Node {
    /// A class instance with named members
    Class(ClassInstance),
    /// An array of element slots
    Array(ArrayInstance),
    /// An id-bearing string object
    Str(String),
    /// A free-standing primitive value
    ///
    /// Never produced by decoding (primitives are inline member values on the
    /// wire); exists so callers can model one, and rejected by the encoder
    /// with a descriptive error.
    Primitive(PrimitiveValue),
    /// A null vertex
    Null,
}

impl Node {
    /// Convenience constructor for an empty class instance.
    #[must_use]
    pub fn class(type_name: &str, library: Option<LibraryId>) -> Self {
        Node::Class(ClassInstance {
            type_name: type_name.to_string(),
            library,
            members: Vec::new(),
        })
    }

    /// Appends a member to a class node, builder style.
    ///
    /// Has no effect on non-class nodes.
    #[must_use]
    pub fn with_member(mut self, name: &str, value: NodeRef) -> Self {
        if let Node::Class(ref mut instance) = self {
            instance.members.push((name.to_string(), value));
        }
        self
    }

    /// Returns the class instance if this node is a class.
    #[must_use]
    pub fn as_class(&self) -> Option<&ClassInstance> {
        match self {
            Node::Class(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns the array instance if this node is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayInstance> {
        match self {
            Node::Array(instance) => Some(instance),
            _ => None,
        }
    }

    /// Returns the string value if this node is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// An id-indexed object graph: the result of one decode, or the input to one encode.
///
/// All lookups are by [`ObjectId`]; two references to the same id always yield
/// the same [`Node`] instance.
#[derive(Debug, Default)]
pub struct Graph {
    root_id: Option<ObjectId>,
    nodes: HashMap<i32, Node>,
    libraries: HashMap<i32, String>,
}

impl Graph {
    /// Creates an empty graph with no root.
    #[must_use]
    pub fn new() -> Self {
        Graph::default()
    }

    pub(crate) fn from_parts(
        root_id: Option<ObjectId>,
        nodes: HashMap<i32, Node>,
        libraries: HashMap<i32, String>,
    ) -> Self {
        Graph {
            root_id,
            nodes,
            libraries,
        }
    }

    /// Inserts a node under an explicit id.
    ///
    /// # Errors
    /// Returns [`crate::Error::IdCollision`] if the id is already occupied and
    /// [`crate::Error::Encode`] for the null id 0.
    pub fn insert(&mut self, id: ObjectId, node: Node) -> Result<()> {
        if id.is_null() {
            return Err(Error::Encode(
                "object id 0 is reserved for null and cannot hold a node".to_string(),
            ));
        }
        if self.nodes.contains_key(&id.value()) {
            return Err(Error::IdCollision(id));
        }
        self.nodes.insert(id.value(), node);
        Ok(())
    }

    /// Defines a library id to assembly-qualified name mapping.
    ///
    /// # Errors
    /// Returns [`crate::Error::Encode`] if the id is already defined.
    pub fn define_library(&mut self, id: LibraryId, name: &str) -> Result<()> {
        if self.libraries.contains_key(&id.value()) {
            return Err(Error::Encode(format!(
                "library id {} is already defined",
                id
            )));
        }
        self.libraries.insert(id.value(), name.to_string());
        Ok(())
    }

    /// Marks the node with this id as the root of the graph.
    pub fn set_root(&mut self, id: ObjectId) {
        self.root_id = Some(id);
    }

    /// The root object id, if one is set.
    ///
    /// Always present on a successfully decoded graph; may be absent on a
    /// caller-constructed graph or a diagnostic partial graph.
    #[must_use]
    pub fn root_id(&self) -> Option<ObjectId> {
        self.root_id
    }

    /// The root node, if the root id is set and present.
    #[must_use]
    pub fn root(&self) -> Option<&Node> {
        self.root_id.and_then(|id| self.node(id))
    }

    /// Looks up a node by object id.
    #[must_use]
    pub fn node(&self, id: ObjectId) -> Option<&Node> {
        self.nodes.get(&id.value())
    }

    /// Looks up a library name by library id.
    #[must_use]
    pub fn library(&self, id: LibraryId) -> Option<&str> {
        self.libraries.get(&id.value()).map(String::as_str)
    }

    /// Number of nodes in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over all `(id, node)` pairs in unspecified order.
    pub fn nodes(&self) -> impl Iterator<Item = (ObjectId, &Node)> {
        self.nodes
            .iter()
            .map(|(id, node)| (ObjectId::new(*id), node))
    }

    /// Iterates over all `(library id, name)` pairs in unspecified order.
    pub fn libraries(&self) -> impl Iterator<Item = (LibraryId, &str)> {
        self.libraries
            .iter()
            .map(|(id, name)| (LibraryId::new(*id), name.as_str()))
    }
}
