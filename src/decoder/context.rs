//! Per-decode caches: the type descriptor table and the library table.
//!
//! Both tables are created at the start of one decode call and dropped at its
//! end; nothing is shared across calls, so a hostile stream can never poison
//! the caches seen by another input.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::{LibraryId, ObjectId};
use crate::records::TypeDescriptor;
use crate::{Error, Result};

/// The decoder-owned descriptor and library caches for one stream.
pub(crate) struct DecodeContext {
    /// Class descriptors keyed by the object id that introduced them
    descriptors: HashMap<i32, Arc<TypeDescriptor>>,
    /// Library id to assembly-qualified name, immutable once defined
    libraries: HashMap<i32, String>,
}

impl DecodeContext {
    pub(crate) fn new() -> Self {
        DecodeContext {
            descriptors: HashMap::new(),
            libraries: HashMap::new(),
        }
    }

    /// Registers the descriptor introduced by the class record at `id`.
    ///
    /// Object id uniqueness is enforced by the graph assembler before this is
    /// called, so an id can never carry two different descriptors.
    pub(crate) fn register_class(&mut self, id: ObjectId, descriptor: Arc<TypeDescriptor>) {
        self.descriptors.insert(id.value(), descriptor);
    }

    /// Looks up the descriptor cached at a class object id.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnknownClassId`] if no class record introduced
    /// the id earlier in the stream.
    pub(crate) fn class(&self, id: ObjectId) -> Result<Arc<TypeDescriptor>> {
        self.descriptors
            .get(&id.value())
            .cloned()
            .ok_or(Error::UnknownClassId(id))
    }

    /// Defines a library id. Redefinition is a stream error.
    pub(crate) fn define_library(&mut self, id: LibraryId, name: String) -> Result<()> {
        if self.libraries.contains_key(&id.value()) {
            return Err(malformed_error!("library id {} is already defined", id));
        }
        self.libraries.insert(id.value(), name);
        Ok(())
    }

    /// Whether a library id has been defined so far.
    pub(crate) fn library_defined(&self, id: LibraryId) -> bool {
        self.libraries.contains_key(&id.value())
    }

    /// Consumes the context, yielding the library table for the graph.
    pub(crate) fn into_libraries(self) -> HashMap<i32, String> {
        self.libraries
    }
}
