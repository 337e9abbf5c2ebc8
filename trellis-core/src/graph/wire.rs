//! Wires
//!
//! A wire connects one node's output slot to another node's input slot.
//! Endpoints refer to slots by stable [`SlotId`], so adding or removing a
//! slot on a dynamic node never retargets an existing wire.

use std::fmt;

use crate::node::{Access, Slot, SlotId};
use crate::value::Kind;

use super::NodeId;

/// Unique identifier for a wire within one graph. Ids grow with
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(u64);

impl WireId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for WireId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// One end of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub node: NodeId,
    pub slot: SlotId,
}

/// A directed connection from an output slot to an input slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire {
    id: WireId,
    source: Endpoint,
    target: Endpoint,
}

impl Wire {
    pub(crate) fn new(id: WireId, source: Endpoint, target: Endpoint) -> Self {
        Self { id, source, target }
    }

    pub fn id(&self) -> WireId {
        self.id
    }

    /// The output end.
    pub fn source(&self) -> Endpoint {
        self.source
    }

    /// The input end.
    pub fn target(&self) -> Endpoint {
        self.target
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source.node == node || self.target.node == node
    }
}

/// The kind a value travelling from `source` presents to a receiving slot.
fn delivered_kind(source: &Slot) -> Kind {
    match source.access() {
        Access::Item => source.kind(),
        Access::List => Kind::List,
    }
}

/// Whether values published by `source` can be delivered to `target`.
///
/// List inputs splice incoming lists, so they compare element kinds. Item
/// inputs receive the value as is: a list output only fits an item input
/// declared as `List`.
pub fn compatible(source: &Slot, target: &Slot) -> bool {
    match target.access() {
        Access::List => target.kind().accepts(source.kind()),
        Access::Item => target.kind().accepts(delivered_kind(source)),
    }
}

/// Kinds to report when [`compatible`] fails.
pub(crate) fn mismatch_kinds(source: &Slot, target: &Slot) -> (Kind, Kind) {
    match target.access() {
        Access::List => (source.kind(), target.kind()),
        Access::Item => (delivered_kind(source), target.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_kinds_must_match_or_widen() {
        let int_out = Slot::new("V", "V", Kind::Int);
        let float_in = Slot::new("X", "X", Kind::Float);
        let vec_in = Slot::new("V", "V", Kind::Vector3);

        assert!(compatible(&int_out, &float_in));
        assert!(!compatible(&float_in, &vec_in));
        assert_eq!(mismatch_kinds(&float_in, &vec_in), (Kind::Float, Kind::Vector3));
    }

    #[test]
    fn list_output_needs_list_input_or_list_kind() {
        let list_out = Slot::new("R", "R", Kind::Float).list();
        let float_item = Slot::new("X", "X", Kind::Float);
        let float_list = Slot::new("L", "L", Kind::Float).list();
        let any_list = Slot::new("L", "L", Kind::List);

        assert!(!compatible(&list_out, &float_item));
        assert!(compatible(&list_out, &float_list));
        assert!(compatible(&list_out, &any_list));
    }

    #[test]
    fn wire_touches_both_ends() {
        let wire = Wire::new(
            WireId::from(0),
            Endpoint {
                node: NodeId::from(1),
                slot: SlotId::new(0),
            },
            Endpoint {
                node: NodeId::from(2),
                slot: SlotId::new(1),
            },
        );
        assert!(wire.touches(NodeId::from(1)));
        assert!(wire.touches(NodeId::from(2)));
        assert!(!wire.touches(NodeId::from(3)));
    }
}
