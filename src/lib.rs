// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # nrbf
//!
//! A safe, allocation-bounded decoder and encoder for the .NET Remoting Binary Format
//! (NRBF, [MS-NRBF]): the tagged-record serialization produced by `BinaryFormatter`,
//! .NET Remoting and ViewState. Built in pure Rust, `nrbf` reconstructs the id-addressed
//! object graph carried by a record stream - including forward references, shared
//! subobjects and cycles - without ever instantiating a .NET type, and re-emits graphs
//! as byte-exact NRBF streams.
//!
//! ## Features
//!
//! - **🛡️ Adversarial-input safe** - every read is bounds-checked, every enum byte is
//!   validated, and declared lengths never drive allocation; configurable resource
//!   limits bound worst-case memory and time
//! - **🔁 Full reference semantics** - forward references, diamond sharing and cycles
//!   resolve to a single node per object id via a two-phase allocate-then-verify pass
//! - **📦 Inert graph model** - decoded data is a plain [`graph::Node`] arena; nothing
//!   is executed, reflected or instantiated
//! - **✍️ Round-trip encoding** - [`encode`] emits class descriptors, library records
//!   and null-run compression the way `BinaryFormatter` does; `decode(encode(g))` is
//!   isomorphic to `g`
//! - **🔎 Forensic mode** - [`decode_diagnostic`] returns the partial graph plus the
//!   error list for inspecting malformed or truncated captures
//!
//! ## Quick Start
//!
//! ```rust
//! use nrbf::prelude::*;
//!
//! // Build a graph: a single string as the root object.
//! let mut graph = Graph::new();
//! graph.insert(ObjectId::new(1), Node::Str("hi".to_string()))?;
//! graph.set_root(ObjectId::new(1));
//!
//! let bytes = nrbf::encode(&graph)?;
//! let decoded = nrbf::decode(&bytes)?;
//! assert_eq!(decoded.root(), Some(&Node::Str("hi".to_string())));
//! # Ok::<(), nrbf::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `nrbf` is organized into several key modules, leaf first:
//!
//! - [`Parser`] / [`Writer`] - bounds-checked little-endian cursor and output buffer,
//!   including the 7-bit length prefix and UTF-8 string forms NRBF uses
//! - [`records`] - the closed [`records::Record`] union over all wire record kinds and
//!   the per-record decode/encode dispatched on the leading tag byte
//! - [`graph`] - the decoded object model: [`graph::Node`], [`graph::NodeRef`],
//!   [`graph::PrimitiveValue`] and the id-indexed [`graph::Graph`]
//! - [`decoder`] / [`encoder`] - the stream orchestrators driving
//!   header → records → `MessageEnd`, owning all per-call caches
//!
//! ## Scope
//!
//! The crate implements the record stream and object-graph layer only. The MS-NRTP
//! remoting envelope (`MethodCall`/`MethodReturn` bodies), lifetime services and any
//! interpretation of decoded class names are out of scope; the two envelope record
//! tags are recognized and rejected with [`Error::UnsupportedRecordType`].
#[macro_use]
pub(crate) mod error;
pub(crate) mod buffer;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use nrbf::prelude::*;
///
/// let mut graph = Graph::new();
/// graph.insert(ObjectId::new(1), Node::Str("root".into()))?;
/// graph.set_root(ObjectId::new(1));
/// let bytes = nrbf::encode(&graph)?;
/// # Ok::<(), nrbf::Error>(())
/// ```
pub mod prelude;

/// Wire-level record definitions and the per-record codec.
///
/// The closed [`records::Record`] union covers every record kind of the NRBF stream
/// grammar; [`records::decode_record`] and [`records::encode_record`] convert between
/// records and bytes, validating every tag and enum byte against its defined value set.
pub mod records;

/// The decoded object-graph model.
///
/// A decoded stream becomes a [`graph::Graph`]: an arena of [`graph::Node`] values
/// indexed by [`graph::ObjectId`], with edges expressed as id lookups
/// ([`graph::NodeRef::Object`]) rather than native references, so cycles and shared
/// subobjects are representable without aliasing hazards.
pub mod graph;

/// Stream decoding: header → records → `MessageEnd` → reference resolution.
///
/// See [`decode`], [`decode_with_limits`] and the forensic [`decode_diagnostic`].
pub mod decoder;

/// Stream encoding: deterministic depth-first id assignment and record emission.
///
/// See [`encode`].
pub mod encoder;

/// `nrbf` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always
/// [`Error`]. Used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `nrbf` Error type
///
/// The main error type for all operations in this crate. Decode-side variants cover
/// malformed, truncated and resource-exhausting input; encode-side variants report
/// caller-constructed graphs that cannot be expressed on the wire.
///
/// # Examples
///
/// ```rust
/// use nrbf::Error;
///
/// match nrbf::decode(&[0xFF]) {
///     Ok(_) => unreachable!(),
///     Err(Error::MalformedStream { message, .. }) => println!("malformed: {}", message),
///     Err(e) => println!("error: {}", e),
/// }
/// ```
pub use error::Error;

/// Low-level cursor for reading NRBF primitives from a byte buffer.
///
/// # Example
///
/// ```rust
/// use nrbf::Parser;
/// let data = [0x2A, 0x00, 0x00, 0x00];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_le::<i32>()?, 42);
/// # Ok::<(), nrbf::Error>(())
/// ```
pub use buffer::parser::Parser;

/// Growable output buffer for writing NRBF primitives.
pub use buffer::writer::Writer;

pub use decoder::{decode, decode_diagnostic, decode_with_limits, DecodeLimits, Diagnostic};
pub use encoder::encode;
