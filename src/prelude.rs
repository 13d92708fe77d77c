//! # nrbf Prelude
//!
//! Convenient re-exports of the most commonly used types for decoding and
//! encoding NRBF streams. Import this module to get quick access to the
//! essential API surface:
//!
//! ```rust
//! use nrbf::prelude::*;
//!
//! let mut graph = Graph::new();
//! graph.insert(ObjectId::new(1), Node::Str("hi".into()))?;
//! graph.set_root(ObjectId::new(1));
//!
//! let bytes = encode(&graph)?;
//! let decoded = decode(&bytes)?;
//! assert_eq!(decoded.root().and_then(Node::as_str), Some("hi"));
//! # Ok::<(), nrbf::Error>(())
//! ```

pub use crate::decoder::{decode, decode_diagnostic, decode_with_limits, DecodeLimits, Diagnostic};
pub use crate::encoder::encode;
pub use crate::graph::{
    ArrayInstance, ClassInstance, Dimension, Graph, LibraryId, Node, NodeRef, ObjectId,
    PrimitiveValue,
};
pub use crate::records::{
    AdditionalTypeInfo, BinaryArrayType, BinaryType, PrimitiveType, Record, RecordType,
};
pub use crate::{Error, Result};
