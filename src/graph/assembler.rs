//! Two-phase node allocation and reference bookkeeping for one decode call.
//!
//! Records are decoded in stream order, and a node is claimed under its object
//! id as soon as its defining record's header has been read - before its
//! member values are decoded. A node under construction is therefore already
//! addressable by id, which is what makes direct self-reference and mutual
//! cycles decodable in a single pass.
//!
//! Every member/element edge whose target id is not yet claimed is queued as a
//! pending edge `(holder, slot, target)`; after `MessageEnd` the decoder asks
//! for the targets that never materialized and reports them as
//! [`crate::Error::DanglingReference`]. Edges to already-claimed ids resolve
//! immediately and are never queued.

use std::collections::HashMap;

use crate::graph::{Node, ObjectId};
use crate::{Error, Result};

/// Which slot of a holder node an edge originates from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum EdgeSlot {
    /// Class member by ordinal
    Member(usize),
    /// Array element by flat row-major index
    Element(usize),
}

/// An edge whose target id had not been claimed when the edge was read.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PendingEdge {
    pub holder: ObjectId,
    pub slot: EdgeSlot,
    pub target: ObjectId,
}

/// Entry states of the id table: claimed-but-under-construction, or complete.
enum Entry {
    Reserved,
    Ready(Node),
}

/// Allocates nodes by object id and tracks unresolved references.
pub(crate) struct GraphAssembler {
    entries: HashMap<i32, Entry>,
    pending: Vec<PendingEdge>,
    max_nodes: usize,
}

impl GraphAssembler {
    pub(crate) fn new(max_nodes: usize) -> Self {
        GraphAssembler {
            entries: HashMap::new(),
            pending: Vec::new(),
            max_nodes,
        }
    }

    /// Claims an object id ahead of decoding the node's values.
    ///
    /// # Errors
    /// [`crate::Error::MalformedStream`] for the null id,
    /// [`crate::Error::DuplicateObjectId`] if the id is already claimed,
    /// [`crate::Error::ResourceLimitExceeded`] past the node budget.
    pub(crate) fn reserve(&mut self, id: ObjectId) -> Result<()> {
        if id.is_null() {
            return Err(malformed_error!(
                "record defines an object with the null id 0"
            ));
        }
        if self.entries.contains_key(&id.value()) {
            return Err(Error::DuplicateObjectId(id));
        }
        if self.entries.len() >= self.max_nodes {
            return Err(Error::ResourceLimitExceeded {
                what: "decoded node count",
                limit: self.max_nodes,
            });
        }
        self.entries.insert(id.value(), Entry::Reserved);
        Ok(())
    }

    /// Fills in the node for a previously reserved id.
    pub(crate) fn complete(&mut self, id: ObjectId, node: Node) {
        debug_assert!(self.entries.contains_key(&id.value()));
        self.entries.insert(id.value(), Entry::Ready(node));
    }

    /// Whether the id has been claimed by any record so far.
    pub(crate) fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id.value())
    }

    /// Registers a member/element edge; queues it if the target is still unknown.
    pub(crate) fn reference(&mut self, holder: ObjectId, slot: EdgeSlot, target: ObjectId) {
        if !self.contains(target) {
            self.pending.push(PendingEdge {
                holder,
                slot,
                target,
            });
        }
    }

    /// Number of nodes claimed so far.
    pub(crate) fn node_count(&self) -> usize {
        self.entries.len()
    }

    /// Pending-edge targets that were never defined, deduplicated, in first-seen order.
    pub(crate) fn unresolved(&self) -> Vec<ObjectId> {
        let mut seen = Vec::new();
        for edge in &self.pending {
            if !self.contains(edge.target) && !seen.contains(&edge.target) {
                seen.push(edge.target);
            }
        }
        seen
    }

    /// Consumes the assembler, yielding all completed nodes.
    ///
    /// Reserved-but-never-completed entries can only remain after a decode
    /// aborted mid-record; they are dropped rather than surfaced as nodes.
    pub(crate) fn into_nodes(self) -> HashMap<i32, Node> {
        self.entries
            .into_iter()
            .filter_map(|(id, entry)| match entry {
                Entry::Ready(node) => Some((id, node)),
                Entry::Reserved => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_rejects_duplicates() {
        let mut assembler = GraphAssembler::new(16);
        assembler.reserve(ObjectId::new(1)).unwrap();
        assert!(matches!(
            assembler.reserve(ObjectId::new(1)),
            Err(Error::DuplicateObjectId(id)) if id.value() == 1
        ));
    }

    #[test]
    fn reserve_rejects_null_id() {
        let mut assembler = GraphAssembler::new(16);
        assert!(matches!(
            assembler.reserve(ObjectId::new(0)),
            Err(Error::MalformedStream { .. })
        ));
    }

    #[test]
    fn reserve_enforces_node_budget() {
        let mut assembler = GraphAssembler::new(2);
        assembler.reserve(ObjectId::new(1)).unwrap();
        assembler.reserve(ObjectId::new(2)).unwrap();
        assert!(matches!(
            assembler.reserve(ObjectId::new(3)),
            Err(Error::ResourceLimitExceeded { limit: 2, .. })
        ));
    }

    #[test]
    fn forward_reference_resolves_once_target_is_claimed() {
        let mut assembler = GraphAssembler::new(16);
        assembler.reserve(ObjectId::new(1)).unwrap();
        assembler.complete(ObjectId::new(1), Node::Null);

        // Edge to id 2 before id 2 exists: queued.
        assembler.reference(ObjectId::new(1), EdgeSlot::Member(0), ObjectId::new(2));
        assert_eq!(assembler.unresolved(), vec![ObjectId::new(2)]);

        // Defining id 2 resolves the queued edge.
        assembler.reserve(ObjectId::new(2)).unwrap();
        assembler.complete(ObjectId::new(2), Node::Str("later".into()));
        assert!(assembler.unresolved().is_empty());
    }

    #[test]
    fn self_reference_is_never_pending() {
        let mut assembler = GraphAssembler::new(16);
        assembler.reserve(ObjectId::new(1)).unwrap();
        // The node is reserved but not yet complete; a self-edge still resolves.
        assembler.reference(ObjectId::new(1), EdgeSlot::Member(0), ObjectId::new(1));
        assert!(assembler.unresolved().is_empty());
    }

    #[test]
    fn unresolved_deduplicates_targets() {
        let mut assembler = GraphAssembler::new(16);
        assembler.reserve(ObjectId::new(1)).unwrap();
        assembler.reference(ObjectId::new(1), EdgeSlot::Element(0), ObjectId::new(9));
        assembler.reference(ObjectId::new(1), EdgeSlot::Element(1), ObjectId::new(9));
        assert_eq!(assembler.unresolved(), vec![ObjectId::new(9)]);
    }

    #[test]
    fn into_nodes_drops_incomplete_entries() {
        let mut assembler = GraphAssembler::new(16);
        assembler.reserve(ObjectId::new(1)).unwrap();
        assembler.complete(ObjectId::new(1), Node::Str("done".into()));
        assembler.reserve(ObjectId::new(2)).unwrap();

        let nodes = assembler.into_nodes();
        assert_eq!(nodes.len(), 1);
        assert!(nodes.contains_key(&1));
    }
}
